//! Synthetic trade tape.

use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::{SimConfig, TapeConfig};
use crate::domain::{round_dp, TradeSide, TradeType, Transaction, TxHash};
use crate::rng::{coin, symmetric, uniform_int};

#[derive(Debug, Clone)]
pub struct TransactionSynthesizer {
    config: TapeConfig,
    fallback_price: f64,
}

impl TransactionSynthesizer {
    pub fn new(config: TapeConfig, fallback_price: f64) -> Self {
        Self {
            config,
            fallback_price,
        }
    }

    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(config.tape.clone(), config.price.mean_price)
    }

    /// `count` trades around `price`, newest first, the newest no later than `now`.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        count: usize,
        price: f64,
        now: DateTime<Utc>,
    ) -> Vec<Transaction> {
        let price = if price.is_finite() {
            price
        } else {
            self.fallback_price
        };
        (0..count)
            .map(|index| self.transaction(rng, index, price, now))
            .collect()
    }

    fn transaction<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        index: usize,
        market_price: f64,
        now: DateTime<Utc>,
    ) -> Transaction {
        let cfg = &self.config;

        let bucket = rng.gen::<f64>();
        let (jitter, trade_type) = if bucket < cfg.tight_share {
            let t = if coin(rng) {
                TradeType::Market
            } else {
                TradeType::Limit
            };
            (cfg.tight_jitter, t)
        } else if bucket < cfg.tight_share + cfg.medium_share {
            (cfg.medium_jitter, TradeType::Limit)
        } else {
            (cfg.wide_jitter, TradeType::Block)
        };
        let price = round_dp(market_price + symmetric(rng, jitter), 2);

        let side = if coin(rng) {
            TradeSide::Buy
        } else {
            TradeSide::Sell
        };
        let farm = pick(rng, &cfg.farm_names);
        let corp = pick(rng, &cfg.corp_names);
        let (from, to) = match side {
            TradeSide::Buy => (corp, farm),
            TradeSide::Sell => (farm, corp),
        };

        let amount = match trade_type {
            TradeType::Market | TradeType::Limit => uniform_int(rng, cfg.regular_amount),
            TradeType::Block => uniform_int(rng, cfg.block_amount),
        };

        let jitter_ms = if cfg.spacing_jitter_secs > 0 {
            rng.gen_range(0..cfg.spacing_jitter_secs * 1000)
        } else {
            0
        };
        let age = Duration::seconds(cfg.spacing_secs * index as i64)
            + Duration::milliseconds(jitter_ms);

        Transaction::new(
            TxHash::random(rng),
            from,
            to,
            amount,
            price,
            trade_type,
            side,
            now - age,
        )
    }
}

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, names: &'a [String]) -> &'a str {
    names.choose(rng).map(String::as_str).unwrap_or("Unknown")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn synth() -> TransactionSynthesizer {
        TransactionSynthesizer::from_config(&SimConfig::default())
    }

    #[test]
    fn newest_first_strictly_decreasing() {
        let mut rng = StdRng::seed_from_u64(1);
        let now = Utc::now();
        let txs = synth().generate(&mut rng, 50, 28.45, now);
        assert_eq!(txs.len(), 50);
        assert!(txs[0].timestamp() <= now);
        for pair in txs.windows(2) {
            assert!(pair[0].timestamp() > pair[1].timestamp());
        }
    }

    #[test]
    fn type_determines_jitter_and_amount() {
        let mut rng = StdRng::seed_from_u64(2);
        for tx in synth().generate(&mut rng, 2_000, 28.45, Utc::now()) {
            let distance = (tx.price() - 28.45).abs();
            match tx.trade_type() {
                TradeType::Market => {
                    assert!(distance <= 0.02 + 1e-9);
                    assert!((50..=250).contains(&tx.amount()));
                }
                TradeType::Limit => {
                    assert!(distance <= 0.1 + 1e-9);
                    assert!((50..=250).contains(&tx.amount()));
                }
                TradeType::Block => {
                    assert!(distance <= 0.2 + 1e-9);
                    assert!((300..=1000).contains(&tx.amount()));
                }
            }
        }
    }

    #[test]
    fn bucket_mix_roughly_matches_config() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut counts: HashMap<TradeType, usize> = HashMap::new();
        let n = 20_000;
        for tx in synth().generate(&mut rng, n, 28.45, Utc::now()) {
            *counts.entry(tx.trade_type()).or_default() += 1;
        }
        let share = |t: TradeType| counts.get(&t).copied().unwrap_or(0) as f64 / n as f64;
        assert!((share(TradeType::Market) - 0.30).abs() < 0.02);
        assert!((share(TradeType::Limit) - 0.60).abs() < 0.02);
        assert!((share(TradeType::Block) - 0.10).abs() < 0.02);
    }

    #[test]
    fn counterparties_follow_side() {
        let config = SimConfig::default();
        let mut rng = StdRng::seed_from_u64(4);
        for tx in synth().generate(&mut rng, 500, 28.45, Utc::now()) {
            let (farm, corp) = match tx.side() {
                TradeSide::Buy => (tx.to(), tx.from()),
                TradeSide::Sell => (tx.from(), tx.to()),
            };
            assert!(config.tape.farm_names.iter().any(|n| n == farm));
            assert!(config.tape.corp_names.iter().any(|n| n == corp));
        }
    }

    #[test]
    fn totals_are_rounded_products() {
        let mut rng = StdRng::seed_from_u64(5);
        for tx in synth().generate(&mut rng, 500, 28.45, Utc::now()) {
            assert_eq!(tx.total(), round_dp(tx.amount() as f64 * tx.price(), 2));
        }
    }

    #[test]
    fn zero_count_is_empty() {
        let mut rng = StdRng::seed_from_u64(6);
        assert!(synth().generate(&mut rng, 0, 28.45, Utc::now()).is_empty());
    }

    #[test]
    fn non_finite_price_uses_fallback() {
        let mut rng = StdRng::seed_from_u64(7);
        for tx in synth().generate(&mut rng, 50, f64::NAN, Utc::now()) {
            assert!((tx.price() - 28.45).abs() <= 0.2 + 1e-9);
        }
    }
}
