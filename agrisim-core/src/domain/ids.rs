use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Display-only transaction hash, shaped like `0x1a2b3c4d`.
///
/// Built from two random 16-bit fragments. Collisions are possible and
/// harmless: nothing keys on this value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxHash(pub String);

impl TxHash {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let hi: u16 = rng.gen();
        let lo: u16 = rng.gen();
        Self(format!("0x{hi:04x}{lo:04x}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn hash_has_prefix_and_eight_hex_digits() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let h = TxHash::random(&mut rng);
            assert!(h.as_str().starts_with("0x"));
            assert_eq!(h.as_str().len(), 10);
            assert!(h.as_str()[2..].chars().all(|c| c.is_ascii_hexdigit()));
        }
    }

    #[test]
    fn hash_serializes_as_plain_string() {
        let h = TxHash("0xdeadbeef".into());
        assert_eq!(serde_json::to_string(&h).unwrap(), "\"0xdeadbeef\"");
    }
}
