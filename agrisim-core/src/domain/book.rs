//! Order book snapshot: two price ladders around the inside market.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::round_dp;

/// A single resting price level. `total` is fixed at construction.
///
/// Deserializing ignores any incoming `total` and recomputes it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "LevelRepr")]
pub struct OrderLevel {
    price: f64,
    amount: u32,
    total: f64,
}

impl OrderLevel {
    pub fn new(price: f64, amount: u32) -> Self {
        Self {
            price,
            amount,
            total: round_dp(price * amount as f64, 2),
        }
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn amount(&self) -> u32 {
        self.amount
    }

    pub fn total(&self) -> f64 {
        self.total
    }
}

#[derive(Deserialize)]
struct LevelRepr {
    price: f64,
    amount: u32,
}

impl From<LevelRepr> for OrderLevel {
    fn from(raw: LevelRepr) -> Self {
        OrderLevel::new(raw.price, raw.amount)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookSide {
    Bid,
    Ask,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BookError {
    #[error("book is crossed: best bid {bid} >= best ask {ask}")]
    Crossed { bid: f64, ask: f64 },

    #[error("{side:?} ladder out of order at level {index}")]
    Unordered { side: BookSide, index: usize },

    #[error("{side:?} ladder has {len} levels (max {max})")]
    TooDeep { side: BookSide, len: usize, max: usize },

    #[error("{side:?} level {index} has total {total}, expected {expected}")]
    TotalMismatch {
        side: BookSide,
        index: usize,
        total: f64,
        expected: f64,
    },
}

/// Bids strictly descending, asks strictly ascending, each side at most
/// [`OrderBook::MAX_DEPTH`] levels. Deserialized books are validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BookRepr")]
pub struct OrderBook {
    #[serde(rename = "buy")]
    bids: Vec<OrderLevel>,
    #[serde(rename = "sell")]
    asks: Vec<OrderLevel>,
}

#[derive(Deserialize)]
struct BookRepr {
    buy: Vec<OrderLevel>,
    sell: Vec<OrderLevel>,
}

impl TryFrom<BookRepr> for OrderBook {
    type Error = BookError;

    fn try_from(raw: BookRepr) -> Result<Self, BookError> {
        let book = OrderBook {
            bids: raw.buy,
            asks: raw.sell,
        };
        book.validate()?;
        Ok(book)
    }
}

impl OrderBook {
    pub const MAX_DEPTH: usize = 5;

    /// Sort both ladders best-first and keep the top `depth` levels of each.
    pub fn from_ladders(mut bids: Vec<OrderLevel>, mut asks: Vec<OrderLevel>, depth: usize) -> Self {
        let depth = depth.min(Self::MAX_DEPTH);
        bids.sort_by(|a, b| b.price.total_cmp(&a.price));
        asks.sort_by(|a, b| a.price.total_cmp(&b.price));
        bids.truncate(depth);
        asks.truncate(depth);
        Self { bids, asks }
    }

    pub fn bids(&self) -> &[OrderLevel] {
        &self.bids
    }

    pub fn asks(&self) -> &[OrderLevel] {
        &self.asks
    }

    pub fn best_bid(&self) -> Option<f64> {
        self.bids.first().map(|l| l.price)
    }

    pub fn best_ask(&self) -> Option<f64> {
        self.asks.first().map(|l| l.price)
    }

    pub fn spread(&self) -> Option<f64> {
        Some(round_dp(self.best_ask()? - self.best_bid()?, 2))
    }

    pub fn mid(&self) -> Option<f64> {
        Some((self.best_ask()? + self.best_bid()?) / 2.0)
    }

    /// Check every structural guarantee of a snapshot.
    pub fn validate(&self) -> Result<(), BookError> {
        check_side(&self.bids, BookSide::Bid)?;
        check_side(&self.asks, BookSide::Ask)?;
        if let (Some(bid), Some(ask)) = (self.best_bid(), self.best_ask()) {
            if bid >= ask {
                return Err(BookError::Crossed { bid, ask });
            }
        }
        Ok(())
    }
}

fn check_side(levels: &[OrderLevel], side: BookSide) -> Result<(), BookError> {
    if levels.len() > OrderBook::MAX_DEPTH {
        return Err(BookError::TooDeep {
            side,
            len: levels.len(),
            max: OrderBook::MAX_DEPTH,
        });
    }
    for (index, level) in levels.iter().enumerate() {
        let expected = round_dp(level.price * level.amount as f64, 2);
        if level.total != expected {
            return Err(BookError::TotalMismatch {
                side,
                index,
                total: level.total,
                expected,
            });
        }
    }
    for (index, pair) in levels.windows(2).enumerate() {
        let ordered = match side {
            BookSide::Bid => pair[0].price > pair[1].price,
            BookSide::Ask => pair[0].price < pair[1].price,
        };
        if !ordered {
            return Err(BookError::Unordered {
                side,
                index: index + 1,
            });
        }
    }
    Ok(())
}
