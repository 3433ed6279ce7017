//! AgriSim Core: synthetic telemetry and carbon-credit market data.
//!
//! This crate produces the data behind an agricultural monitoring dashboard:
//! - Bounded random walks for eight field sensor channels
//! - A regime-switching, mean-reverting carbon-credit price with jumps
//! - Order book snapshots and trade tapes around a reference price
//! - Historical seeding so charts start full
//!
//! Every generator takes its randomness from the caller. [`engine::Simulation`]
//! wires them together under one master seed.

pub mod config;
pub mod domain;
pub mod engine;
pub mod history;
pub mod market;
pub mod rng;
pub mod series;

pub use config::{ConfigError, SimConfig};
pub use engine::Simulation;
