//! Simulation facade.
//!
//! Owns one instance of every generator plus one RNG per stream, all derived
//! from a single master seed. The clock lives outside: callers decide when to
//! tick, and the `_at` variants take the timestamp explicitly.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::config::{ConfigError, SimConfig};
use crate::domain::{MarketState, OrderBook, PricePoint, SensorReading, SensorValues, Transaction};
use crate::market::{OrderBookSynthesizer, TransactionSynthesizer};
use crate::rng::{RngHierarchy, Stream};
use crate::series::{HistoricalSeedGenerator, PriceProcess, SensorSeriesGenerator, TickSource};

#[derive(Debug)]
struct Streams {
    sensors: StdRng,
    price: StdRng,
    book: StdRng,
    tape: StdRng,
}

impl Streams {
    fn derive(hierarchy: &RngHierarchy) -> Self {
        Self {
            sensors: hierarchy.rng_for(Stream::Sensors),
            price: hierarchy.rng_for(Stream::Price),
            book: hierarchy.rng_for(Stream::OrderBook),
            tape: hierarchy.rng_for(Stream::Tape),
        }
    }
}

#[derive(Debug)]
pub struct Simulation {
    config: SimConfig,
    hierarchy: RngHierarchy,
    streams: Streams,
    sensors: SensorSeriesGenerator,
    price: PriceProcess,
    book: OrderBookSynthesizer,
    tape: TransactionSynthesizer,
    sensor_seeder: HistoricalSeedGenerator,
    price_seeder: HistoricalSeedGenerator,
}

impl Simulation {
    /// Validate `config` and build every generator at its baseline.
    pub fn new(config: SimConfig, master_seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(master_seed, "simulation initialized");
        Ok(Self::build(config, master_seed))
    }

    /// Default configuration, which is always valid.
    pub fn with_seed(master_seed: u64) -> Self {
        Self::build(SimConfig::default(), master_seed)
    }

    fn build(config: SimConfig, master_seed: u64) -> Self {
        let hierarchy = RngHierarchy::new(master_seed);
        Self {
            streams: Streams::derive(&hierarchy),
            sensors: SensorSeriesGenerator::from_config(&config),
            price: PriceProcess::from_config(&config),
            book: OrderBookSynthesizer::from_config(&config),
            tape: TransactionSynthesizer::from_config(&config),
            sensor_seeder: HistoricalSeedGenerator::for_sensors(&config.seed),
            price_seeder: HistoricalSeedGenerator::for_prices(&config.seed),
            hierarchy,
            config,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn master_seed(&self) -> u64 {
        self.hierarchy.master_seed()
    }

    pub fn current_price(&self) -> f64 {
        self.price.price()
    }

    pub fn market_state(&self) -> &MarketState {
        self.price.state()
    }

    pub fn sensor_values(&self) -> &SensorValues {
        self.sensors.values()
    }

    // ── Series ──────────────────────────────────────────────────────

    pub fn step_sensors(&mut self) -> SensorReading {
        self.step_sensors_at(Utc::now())
    }

    pub fn step_sensors_at(&mut self, at: DateTime<Utc>) -> SensorReading {
        self.sensors.step_at(&mut self.streams.sensors, at)
    }

    pub fn step_price(&mut self) -> PricePoint {
        self.step_price_at(Utc::now())
    }

    pub fn step_price_at(&mut self, at: DateTime<Utc>) -> PricePoint {
        self.price.step_at(&mut self.streams.price, at)
    }

    // ── Market views ────────────────────────────────────────────────

    /// Order book around `price`. Does not touch the price process.
    pub fn snapshot_order_book(&mut self, price: f64) -> OrderBook {
        self.book.snapshot(&mut self.streams.book, price)
    }

    pub fn generate_transactions(&mut self, count: usize, price: f64) -> Vec<Transaction> {
        self.generate_transactions_at(count, price, Utc::now())
    }

    pub fn generate_transactions_at(
        &mut self,
        count: usize,
        price: f64,
        now: DateTime<Utc>,
    ) -> Vec<Transaction> {
        self.tape.generate(&mut self.streams.tape, count, price, now)
    }

    // ── Seeding ─────────────────────────────────────────────────────

    pub fn seed_sensors(&mut self, count: usize) -> Vec<SensorReading> {
        self.seed_sensors_at(count, Utc::now())
    }

    /// Reset the sensor walk and replay `count` calm ticks ending at `now`.
    pub fn seed_sensors_at(&mut self, count: usize, now: DateTime<Utc>) -> Vec<SensorReading> {
        debug!(count, "seeding sensor history");
        self.sensor_seeder
            .seed(&mut self.sensors, &mut self.streams.sensors, count, now)
    }

    pub fn seed_prices(&mut self, count: usize) -> Vec<PricePoint> {
        self.seed_prices_at(count, Utc::now())
    }

    /// Reset the price process and replay `count` ticks ending at `now`.
    pub fn seed_prices_at(&mut self, count: usize, now: DateTime<Utc>) -> Vec<PricePoint> {
        debug!(count, "seeding price history");
        self.price_seeder
            .seed(&mut self.price, &mut self.streams.price, count, now)
    }

    /// Return every generator to its baseline and rewind all streams.
    pub fn reset(&mut self) {
        self.sensors.reset();
        self.price.reset();
        self.streams = Streams::derive(&self.hierarchy);
        debug!(master_seed = self.master_seed(), "simulation reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Regime;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = SimConfig::default();
        config.price.bounds = (30.0, 20.0);
        assert!(Simulation::new(config, 1).is_err());
    }

    #[test]
    fn starts_at_baseline() {
        let sim = Simulation::new(SimConfig::default(), 1).unwrap();
        assert_eq!(sim.current_price(), 28.45);
        assert_eq!(sim.market_state().regime, Regime::Ranging);
        assert_eq!(*sim.sensor_values(), sim.config().sensors.baseline_values());
        assert_eq!(sim.master_seed(), 1);
    }

    #[test]
    fn book_and_tape_do_not_move_price() {
        let mut sim = Simulation::with_seed(2);
        sim.step_price_at(now());
        let before = sim.market_state().clone();
        sim.snapshot_order_book(before.price);
        sim.generate_transactions_at(5, before.price, now());
        assert_eq!(*sim.market_state(), before);
    }

    #[test]
    fn streams_are_independent() {
        let mut a = Simulation::with_seed(3);
        let mut b = Simulation::with_seed(3);
        for _ in 0..10 {
            b.snapshot_order_book(28.45);
            b.generate_transactions_at(5, 28.45, now());
        }
        for _ in 0..100 {
            assert_eq!(a.step_price_at(now()), b.step_price_at(now()));
        }
    }

    #[test]
    fn reset_replays_identically() {
        let mut sim = Simulation::with_seed(4);
        let run = |sim: &mut Simulation| {
            (0..50)
                .map(|_| (sim.step_price_at(now()).price, sim.step_sensors_at(now()).values))
                .collect::<Vec<_>>()
        };
        let first = run(&mut sim);
        sim.reset();
        assert_eq!(sim.current_price(), 28.45);
        assert_eq!(*sim.sensor_values(), sim.config().sensors.baseline_values());
        let second = run(&mut sim);
        assert_eq!(first, second);
    }

    #[test]
    fn seeding_leaves_generators_at_last_value() {
        let mut sim = Simulation::with_seed(5);
        let sensors = sim.seed_sensors_at(20, now());
        let prices = sim.seed_prices_at(50, now());
        assert_eq!(sensors.len(), 20);
        assert_eq!(prices.len(), 50);
        assert_eq!(sensors.last().unwrap().values, *sim.sensor_values());
        assert_eq!(prices.last().unwrap().price, sim.current_price());
        assert_eq!(prices.last().unwrap().timestamp, now());
    }
}
