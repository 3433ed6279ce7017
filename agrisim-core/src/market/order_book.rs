//! Synthetic order book around a reference price.
//!
//! Each side is built from a short "near" ladder with heavy, decaying volume at
//! the inside, followed by a sparser "depth" ladder where some levels are key
//! levels carrying large resting size. Every bid sits at or below the best bid
//! and every ask at or above the best ask, and the best quotes straddle the
//! reference price, so a snapshot can never be crossed.

use rand::Rng;
use tracing::debug;

use crate::config::{BookConfig, SimConfig};
use crate::domain::{round_dp, BookSide, OrderBook, OrderLevel};
use crate::rng::{uniform_dp, uniform_int};

/// Largest reference price whose ladder still resolves to distinct cents.
pub const MAX_QUOTABLE_PRICE: f64 = 1e12;

#[derive(Debug, Clone)]
pub struct OrderBookSynthesizer {
    config: BookConfig,
    fallback_price: f64,
}

impl OrderBookSynthesizer {
    pub fn new(config: BookConfig, fallback_price: f64) -> Self {
        Self {
            config,
            fallback_price,
        }
    }

    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(config.book.clone(), config.price.mean_price)
    }

    /// Fresh snapshot around `price`. Holds no state between calls.
    pub fn snapshot<R: Rng + ?Sized>(&self, rng: &mut R, price: f64) -> OrderBook {
        let price = if price.is_finite() && price.abs() <= MAX_QUOTABLE_PRICE {
            price
        } else {
            debug!(price, fallback = self.fallback_price, "unquotable book reference");
            self.fallback_price
        };

        let best_bid = round_dp(price - uniform_dp(rng, self.config.half_spread_range, 2), 2);
        let best_ask = round_dp(price + uniform_dp(rng, self.config.half_spread_range, 2), 2);

        let bids = self.ladder(rng, best_bid, BookSide::Bid);
        let asks = self.ladder(rng, best_ask, BookSide::Ask);

        let book = OrderBook::from_ladders(bids, asks, self.config.depth);
        debug_assert!(book.validate().is_ok(), "synthesized book invalid: {book:?}");
        book
    }

    fn ladder<R: Rng + ?Sized>(&self, rng: &mut R, best: f64, side: BookSide) -> Vec<OrderLevel> {
        let cfg = &self.config;
        let away = |distance: f64| match side {
            BookSide::Bid => round_dp(best - distance, 2),
            BookSide::Ask => round_dp(best + distance, 2),
        };

        let mut levels = Vec::with_capacity(cfg.near_levels + cfg.depth_levels);

        for i in 0..cfg.near_levels {
            let amount = if i == 0 {
                uniform_int(rng, cfg.near_top_volume)
            } else {
                let decay = (1.0 - i as f64 * cfg.near_decay).max(0.0);
                (uniform_int(rng, cfg.near_volume) as f64 * decay).floor() as u32
            };
            levels.push(OrderLevel::new(away(i as f64 * cfg.near_step), amount));
        }

        for i in 0..cfg.depth_levels {
            let amount = if rng.gen::<f64>() < cfg.key_level_probability {
                uniform_int(rng, cfg.key_level_volume)
            } else {
                uniform_int(rng, cfg.depth_volume)
            };
            levels.push(OrderLevel::new(
                away(cfg.depth_offset + i as f64 * cfg.depth_step),
                amount,
            ));
        }

        levels
    }
}
