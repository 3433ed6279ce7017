//! Trade tape records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{round_dp, TxHash};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeType {
    Market,
    Limit,
    Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeSide {
    Buy,
    Sell,
}

/// One synthetic trade. `total` is fixed at construction and recomputed on
/// deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "TransactionRepr")]
pub struct Transaction {
    #[serde(rename = "hash")]
    id: TxHash,
    from: String,
    to: String,
    amount: u32,
    price: f64,
    total: f64,
    #[serde(rename = "type")]
    trade_type: TradeType,
    side: TradeSide,
    timestamp: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionRepr {
    #[serde(rename = "hash")]
    id: TxHash,
    from: String,
    to: String,
    amount: u32,
    price: f64,
    #[serde(rename = "type")]
    trade_type: TradeType,
    side: TradeSide,
    timestamp: DateTime<Utc>,
}

impl From<TransactionRepr> for Transaction {
    fn from(raw: TransactionRepr) -> Self {
        Transaction::new(
            raw.id,
            raw.from,
            raw.to,
            raw.amount,
            raw.price,
            raw.trade_type,
            raw.side,
            raw.timestamp,
        )
    }
}

impl Transaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: TxHash,
        from: impl Into<String>,
        to: impl Into<String>,
        amount: u32,
        price: f64,
        trade_type: TradeType,
        side: TradeSide,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            from: from.into(),
            to: to.into(),
            amount,
            price,
            total: round_dp(amount as f64 * price, 2),
            trade_type,
            side,
            timestamp,
        }
    }

    pub fn id(&self) -> &TxHash {
        &self.id
    }

    pub fn from(&self) -> &str {
        &self.from
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn amount(&self) -> u32 {
        self.amount
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn trade_type(&self) -> TradeType {
        self.trade_type
    }

    pub fn side(&self) -> TradeSide {
        self.side
    }

    pub fn is_buy(&self) -> bool {
        self.side == TradeSide::Buy
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
