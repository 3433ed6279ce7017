//! Market state: the mutable core of the price process.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete mode of the price process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    Ranging,
    Uptrend,
    Downtrend,
    Volatile,
}

impl Regime {
    pub const ALL: [Regime; 4] = [
        Regime::Ranging,
        Regime::Uptrend,
        Regime::Downtrend,
        Regime::Volatile,
    ];
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Regime::Ranging => "ranging",
            Regime::Uptrend => "uptrend",
            Regime::Downtrend => "downtrend",
            Regime::Volatile => "volatile",
        };
        f.write_str(s)
    }
}

/// Sign of the last noise draw. `Flat` only exists before the first step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Down,
    #[default]
    Flat,
    Up,
}

impl Direction {
    /// Direction of a noise draw. Zero counts as down.
    pub fn of(noise: f64) -> Self {
        if noise > 0.0 {
            Direction::Up
        } else {
            Direction::Down
        }
    }

    pub fn sign(self) -> f64 {
        match self {
            Direction::Down => -1.0,
            Direction::Flat => 0.0,
            Direction::Up => 1.0,
        }
    }

    /// True if `next` extends a streak started by `self` (or no streak exists yet).
    pub fn continues_into(self, next: Direction) -> bool {
        self == Direction::Flat || self == next
    }
}

/// Everything the price process carries from one tick to the next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketState {
    pub regime: Regime,
    /// Ticks since the last regime transition.
    pub regime_age: u32,
    /// A transition is forced once `regime_age` exceeds this.
    pub regime_duration_cap: u32,
    pub trend: f64,
    pub volatility: f64,
    pub momentum: f64,
    pub previous_direction: Direction,
    pub price: f64,
}

impl MarketState {
    /// Starting state: a calm ranging market sitting on `price`.
    pub fn baseline(price: f64, regime_duration_cap: u32) -> Self {
        Self {
            regime: Regime::Ranging,
            regime_age: 0,
            regime_duration_cap,
            trend: 0.0,
            volatility: 0.01,
            momentum: 0.0,
            previous_direction: Direction::Flat,
            price,
        }
    }
}

/// One tick of the price chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    #[serde(rename = "time")]
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}
