//! Price-derived market views: the order book and the trade tape.
//!
//! Both synthesizers read nothing but a reference price and their config, so
//! they take `&self` and can serve concurrent callers given separate RNGs.

pub mod order_book;
pub mod tape;

pub use order_book::OrderBookSynthesizer;
pub use tape::TransactionSynthesizer;
