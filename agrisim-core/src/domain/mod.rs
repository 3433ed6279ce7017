//! Domain types for AgriSim

pub mod book;
pub mod ids;
pub mod market;
pub mod sensor;
pub mod transaction;

pub use book::{BookError, BookSide, OrderBook, OrderLevel};
pub use ids::TxHash;
pub use market::{Direction, MarketState, PricePoint, Regime};
pub use sensor::{SensorChannel, SensorReading, SensorValues};
pub use transaction::{Transaction, TradeSide, TradeType};

/// Round `value` to `decimals` decimal places (half away from zero).
pub fn round_dp(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
