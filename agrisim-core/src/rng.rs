//! Deterministic RNG hierarchy.
//!
//! A master seed expands into one independent sub-seed per random stream
//! (sensors, price, book, tape, driver). Sub-seeds are derived by BLAKE3
//! hashing, so drawing more numbers from one stream never shifts another:
//! pulling an extra order book does not change the next price tick.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::domain::round_dp;

/// Independent random streams of one simulation instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stream {
    Sensors,
    Price,
    OrderBook,
    Tape,
    /// Reserved for the driver's own scheduling decisions.
    Driver,
}

impl Stream {
    pub fn label(self) -> &'static str {
        match self {
            Stream::Sensors => "sensors",
            Stream::Price => "price",
            Stream::OrderBook => "order_book",
            Stream::Tape => "tape",
            Stream::Driver => "driver",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RngHierarchy {
    master_seed: u64,
}

impl RngHierarchy {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Derive the sub-seed for `stream`. Independent of derivation order.
    pub fn sub_seed(&self, stream: Stream) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(stream.label().as_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }

    /// Fresh `StdRng` positioned at the start of `stream`.
    pub fn rng_for(&self, stream: Stream) -> StdRng {
        StdRng::seed_from_u64(self.sub_seed(stream))
    }
}

// ─── Draw helpers ────────────────────────────────────────────────────
//
// Degenerate ranges (`lo == hi`) are legal in config, so these never call
// `gen_range` on a possibly empty half-open range.

/// Uniform draw from `[lo, hi)`; returns `lo` when the range is empty.
pub fn uniform<R: Rng + ?Sized>(rng: &mut R, (lo, hi): (f64, f64)) -> f64 {
    lo + rng.gen::<f64>() * (hi - lo)
}

/// Uniform draw from `[lo, hi)` rounded to `decimals` places.
pub fn uniform_dp<R: Rng + ?Sized>(rng: &mut R, range: (f64, f64), decimals: u32) -> f64 {
    round_dp(uniform(rng, range), decimals)
}

/// Uniform draw from `[-half_width, half_width)`.
pub fn symmetric<R: Rng + ?Sized>(rng: &mut R, half_width: f64) -> f64 {
    (rng.gen::<f64>() * 2.0 - 1.0) * half_width
}

/// Uniform integer from the inclusive range `[lo, hi]`. Callers validate `lo <= hi`.
pub fn uniform_int<R: Rng + ?Sized>(rng: &mut R, (lo, hi): (u32, u32)) -> u32 {
    rng.gen_range(lo..=hi.max(lo))
}

/// Fair coin.
pub fn coin<R: Rng + ?Sized>(rng: &mut R) -> bool {
    rng.gen::<f64>() < 0.5
}
