//! AgriSim CLI: drive the synthetic data engine from the terminal.
//!
//! Commands:
//! - `run`: seed the chart buffers, then tick a virtual clock and stream events
//! - `seed sensors|prices`: print a bootstrap history
//! - `book`: print one order book snapshot
//! - `tape`: print a batch of trades
//! - `config`: print the effective configuration as TOML
//!
//! Data goes to stdout as JSON; diagnostics go to stderr through `tracing`.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rand::Rng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use agrisim_core::domain::{
    round_dp, OrderBook, PricePoint, Regime, SensorChannel, SensorReading, Transaction,
};
use agrisim_core::history::RollingBuffer;
use agrisim_core::rng::{RngHierarchy, Stream};
use agrisim_core::{SimConfig, Simulation};

#[derive(Parser)]
#[command(name = "agrisim", about = "AgriSim: synthetic farm telemetry and carbon-credit market data")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SimArgs {
    /// Master seed. Random when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Path to a TOML config file. Missing keys keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed the chart buffers, then run a virtual clock and stream events as JSON lines.
    Run {
        #[command(flatten)]
        sim: SimArgs,

        /// Number of price ticks to run.
        #[arg(long, default_value_t = 100)]
        ticks: usize,

        /// Sensor chart buffer size.
        #[arg(long, default_value_t = 20)]
        sensor_history: usize,

        /// Price chart buffer size.
        #[arg(long, default_value_t = 50)]
        price_history: usize,
    },
    /// Print a bootstrap history.
    Seed {
        #[command(flatten)]
        sim: SimArgs,

        /// Which series to seed.
        #[arg(value_enum)]
        series: SeedSeries,

        /// Number of records.
        #[arg(long, default_value_t = 20)]
        count: usize,
    },
    /// Print one order book snapshot.
    Book {
        #[command(flatten)]
        sim: SimArgs,

        /// Reference price. Defaults to the configured mean price.
        #[arg(long)]
        price: Option<f64>,
    },
    /// Print a batch of trades, newest first.
    Tape {
        #[command(flatten)]
        sim: SimArgs,

        /// Number of trades.
        #[arg(long, default_value_t = 5)]
        count: usize,

        /// Reference price. Defaults to the configured mean price.
        #[arg(long)]
        price: Option<f64>,
    },
    /// Print the effective configuration as TOML.
    Config {
        /// Path to a TOML config file to validate and echo.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SeedSeries {
    Sensors,
    Prices,
}

// Virtual clock cadence of the dashboard driver.
const PRICE_TICK_MS: i64 = 1_500;
const SENSOR_TICK_MS: i64 = 5_000;
const BOOK_PROBABILITY: f64 = 0.05;
const TAPE_PROBABILITY: f64 = 0.02;
const TAPE_BATCH: usize = 5;

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("agrisim=info,agrisim_core=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            sim,
            ticks,
            sensor_history,
            price_history,
        } => run_driver(&sim, ticks, sensor_history, price_history),
        Commands::Seed { sim, series, count } => run_seed(&sim, series, count),
        Commands::Book { sim, price } => run_book(&sim, price),
        Commands::Tape { sim, count, price } => run_tape(&sim, count, price),
        Commands::Config { config } => run_config(config),
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<SimConfig> {
    match path {
        Some(path) => SimConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(SimConfig::default()),
    }
}

fn build_simulation(args: &SimArgs) -> Result<Simulation> {
    let config = load_config(args.config.as_ref())?;
    let seed = args.seed.unwrap_or_else(rand::random);
    info!(seed, "master seed");
    Ok(Simulation::new(config, seed)?)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

fn run_seed(args: &SimArgs, series: SeedSeries, count: usize) -> Result<()> {
    let mut sim = build_simulation(args)?;
    match series {
        SeedSeries::Sensors => print_json(&sim.seed_sensors(count)),
        SeedSeries::Prices => print_json(&sim.seed_prices(count)),
    }
}

fn run_book(args: &SimArgs, price: Option<f64>) -> Result<()> {
    let mut sim = build_simulation(args)?;
    let price = price.unwrap_or(sim.config().price.mean_price);
    print_json(&sim.snapshot_order_book(price))
}

fn run_tape(args: &SimArgs, count: usize, price: Option<f64>) -> Result<()> {
    let mut sim = build_simulation(args)?;
    let price = price.unwrap_or(sim.config().price.mean_price);
    print_json(&sim.generate_transactions(count, price))
}

fn run_config(path: Option<PathBuf>) -> Result<()> {
    let config = load_config(path.as_ref())?;
    config.validate()?;
    print!("{}", config.to_toml()?);
    Ok(())
}

// ── Driver ───────────────────────────────────────────────────────────

/// One line of `run` output.
#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Event<'a> {
    Price {
        time: DateTime<Utc>,
        price: f64,
        change_pct: f64,
        regime: Regime,
    },
    Sensor {
        #[serde(flatten)]
        reading: &'a SensorReading,
        trend_pct: BTreeMap<SensorChannel, f64>,
    },
    Book {
        time: DateTime<Utc>,
        reference: f64,
        book: &'a OrderBook,
    },
    Trades {
        time: DateTime<Utc>,
        transactions: &'a [Transaction],
    },
}

#[derive(Debug, Serialize)]
struct RunSummary {
    seed: u64,
    price_ticks: usize,
    sensor_ticks: usize,
    books: usize,
    trade_batches: usize,
    regime_transitions: usize,
    final_price: f64,
    final_regime: Regime,
    low: f64,
    high: f64,
    change_pct: f64,
}

fn run_driver(
    args: &SimArgs,
    ticks: usize,
    sensor_history: usize,
    price_history: usize,
) -> Result<()> {
    let mut sim = build_simulation(args)?;
    let mut driver_rng = RngHierarchy::new(sim.master_seed()).rng_for(Stream::Driver);

    let start = Utc::now();
    let mut sensors: RollingBuffer<SensorReading> =
        RollingBuffer::from_items(sensor_history, sim.seed_sensors_at(sensor_history, start));
    let mut prices: RollingBuffer<PricePoint> =
        RollingBuffer::from_items(price_history, sim.seed_prices_at(price_history, start));
    debug!(
        sensors = sensors.len(),
        prices = prices.len(),
        "chart buffers seeded"
    );

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut emit = |event: &Event<'_>| -> Result<()> {
        serde_json::to_writer(&mut out, event)?;
        writeln!(out)?;
        Ok(())
    };

    let opening = sim.current_price();
    let mut summary = RunSummary {
        seed: sim.master_seed(),
        price_ticks: 0,
        sensor_ticks: 0,
        books: 0,
        trade_batches: 0,
        regime_transitions: 0,
        final_price: opening,
        final_regime: sim.market_state().regime,
        low: opening,
        high: opening,
        change_pct: 0.0,
    };
    let mut next_sensor_at = start + Duration::milliseconds(SENSOR_TICK_MS);

    for tick in 1..=ticks {
        let now = start + Duration::milliseconds(PRICE_TICK_MS * tick as i64);

        while next_sensor_at <= now {
            let reading = sim.step_sensors_at(next_sensor_at);
            sensors.push(reading);
            if let Some(reading) = sensors.latest() {
                let trend_pct = SensorChannel::ALL
                    .into_iter()
                    .map(|channel| (channel, round_dp(sensors.channel_trend(channel), 2)))
                    .collect();
                emit(&Event::Sensor { reading, trend_pct })?;
            }
            summary.sensor_ticks += 1;
            next_sensor_at += Duration::milliseconds(SENSOR_TICK_MS);
        }

        let point = sim.step_price_at(now);
        prices.push(point);
        let state = sim.market_state();
        if state.regime_age == 0 {
            summary.regime_transitions += 1;
        }
        emit(&Event::Price {
            time: point.timestamp,
            price: point.price,
            change_pct: round_dp(prices.change_pct(), 2),
            regime: state.regime,
        })?;
        summary.price_ticks += 1;
        summary.low = summary.low.min(point.price);
        summary.high = summary.high.max(point.price);

        if driver_rng.gen::<f64>() < BOOK_PROBABILITY {
            let book = sim.snapshot_order_book(point.price);
            emit(&Event::Book {
                time: now,
                reference: point.price,
                book: &book,
            })?;
            summary.books += 1;
        }

        if driver_rng.gen::<f64>() < TAPE_PROBABILITY {
            let transactions = sim.generate_transactions_at(TAPE_BATCH, point.price, now);
            emit(&Event::Trades {
                time: now,
                transactions: &transactions,
            })?;
            summary.trade_batches += 1;
        }
    }
    out.flush()?;

    summary.final_price = sim.current_price();
    summary.final_regime = sim.market_state().regime;
    summary.change_pct = round_dp(prices.change_pct(), 2);
    info!(
        ticks = summary.price_ticks,
        final_price = summary.final_price,
        transitions = summary.regime_transitions,
        "run complete"
    );
    eprintln!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
