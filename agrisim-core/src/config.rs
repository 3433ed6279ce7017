//! Simulation configuration.
//!
//! Every tunable constant of the engine lives here with its default. The
//! defaults reproduce the dashboard feed; they were chosen by eye, not fitted
//! to any market or sensor data.
//!
//! Configs load from TOML. Every section is `#[serde(default)]`, so a file only
//! needs to name what it overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::{OrderBook, Regime, SensorChannel, SensorValues};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("{field}: range ({min}, {max}) is inverted or not finite")]
    InvalidRange { field: String, min: f64, max: f64 },

    #[error("{field}: probability {value} outside [0, 1]")]
    InvalidProbability { field: String, value: f64 },

    #[error("{field}: {reason}")]
    Invalid { field: String, reason: String },
}

// ─── Sensors ─────────────────────────────────────────────────────────

/// Domain and walk parameters for one sensor channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelSpec {
    /// Value on reset.
    pub baseline: f64,
    pub min: f64,
    pub max: f64,
    /// Maximum absolute change per tick.
    pub volatility: f64,
    /// Decimal places kept after each step.
    pub precision: u32,
}

impl ChannelSpec {
    pub const fn new(baseline: f64, min: f64, max: f64, volatility: f64, precision: u32) -> Self {
        Self {
            baseline,
            min,
            max,
            volatility,
            precision,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChannelTable {
    pub temperature: ChannelSpec,
    pub humidity: ChannelSpec,
    pub soil_moisture: ChannelSpec,
    pub light_intensity: ChannelSpec,
    pub battery_level: ChannelSpec,
    pub rainfall: ChannelSpec,
    pub wind_speed: ChannelSpec,
    pub air_quality: ChannelSpec,
}

impl Default for ChannelTable {
    fn default() -> Self {
        Self {
            temperature: ChannelSpec::new(24.5, 18.0, 32.0, 0.3, 1),
            humidity: ChannelSpec::new(65.0, 40.0, 90.0, 0.5, 1),
            soil_moisture: ChannelSpec::new(45.0, 20.0, 80.0, 0.2, 1),
            light_intensity: ChannelSpec::new(5000.0, 500.0, 10000.0, 100.0, 0),
            battery_level: ChannelSpec::new(85.0, 50.0, 100.0, 0.1, 0),
            rainfall: ChannelSpec::new(2.0, 0.0, 10.0, 0.1, 1),
            wind_speed: ChannelSpec::new(7.5, 0.0, 15.0, 0.4, 1),
            air_quality: ChannelSpec::new(75.0, 20.0, 150.0, 2.0, 0),
        }
    }
}

impl ChannelTable {
    pub fn get(&self, channel: SensorChannel) -> &ChannelSpec {
        match channel {
            SensorChannel::Temperature => &self.temperature,
            SensorChannel::Humidity => &self.humidity,
            SensorChannel::SoilMoisture => &self.soil_moisture,
            SensorChannel::LightIntensity => &self.light_intensity,
            SensorChannel::BatteryLevel => &self.battery_level,
            SensorChannel::Rainfall => &self.rainfall,
            SensorChannel::WindSpeed => &self.wind_speed,
            SensorChannel::AirQuality => &self.air_quality,
        }
    }

    /// Baseline value of every channel.
    pub fn baseline_values(&self) -> SensorValues {
        SensorValues {
            temperature: self.temperature.baseline,
            humidity: self.humidity.baseline,
            soil_moisture: self.soil_moisture.baseline,
            light_intensity: self.light_intensity.baseline,
            battery_level: self.battery_level.baseline,
            rainfall: self.rainfall.baseline,
            wind_speed: self.wind_speed.baseline,
            air_quality: self.air_quality.baseline,
        }
    }
}

// ─── Price process ───────────────────────────────────────────────────

/// Selection weight and parameter ranges for one regime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeProfile {
    pub weight: f64,
    /// Per-tick drift, drawn uniformly on entry.
    pub trend: (f64, f64),
    /// Noise amplitude, drawn uniformly on entry.
    pub volatility: (f64, f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeTable {
    pub ranging: RegimeProfile,
    pub uptrend: RegimeProfile,
    pub downtrend: RegimeProfile,
    pub volatile: RegimeProfile,
}

impl Default for RegimeTable {
    fn default() -> Self {
        Self {
            ranging: RegimeProfile {
                weight: 0.60,
                trend: (0.0, 0.0),
                volatility: (0.005, 0.015),
            },
            uptrend: RegimeProfile {
                weight: 0.20,
                trend: (0.005, 0.015),
                volatility: (0.005, 0.02),
            },
            downtrend: RegimeProfile {
                weight: 0.15,
                trend: (-0.015, -0.005),
                volatility: (0.005, 0.02),
            },
            volatile: RegimeProfile {
                weight: 0.05,
                trend: (0.0, 0.0),
                volatility: (0.02, 0.04),
            },
        }
    }
}

impl RegimeTable {
    pub fn get(&self, regime: Regime) -> &RegimeProfile {
        match regime {
            Regime::Ranging => &self.ranging,
            Regime::Uptrend => &self.uptrend,
            Regime::Downtrend => &self.downtrend,
            Regime::Volatile => &self.volatile,
        }
    }

    pub fn total_weight(&self) -> f64 {
        Regime::ALL.iter().map(|r| self.get(*r).weight).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceConfig {
    /// Long-run level the price reverts to; also the reset value.
    pub mean_price: f64,
    /// Hard `(lower, upper)` bounds.
    pub bounds: (f64, f64),
    /// Decimal places kept on every tick.
    pub precision: u32,
    /// Fraction of the distance to the mean recovered per tick.
    pub reversion_rate_range: (f64, f64),
    /// Scale applied to raw noise.
    pub noise_dampening: f64,
    /// Scale applied to the summed delta.
    pub damping_factor: f64,
    pub momentum_step: f64,
    pub momentum_cap: f64,
    pub jump_probability: f64,
    /// Magnitude range of a jump; the sign is a coin flip.
    pub jump_size_range: (f64, f64),
    /// Chance per tick of an early regime transition.
    pub regime_switch_probability: f64,
    /// Inclusive range the regime duration cap is drawn from, in ticks.
    pub regime_duration_range: (u32, u32),
    /// Volatility before the first regime transition.
    pub baseline_volatility: f64,
    /// A breached bound resets the price up to this far back inside.
    pub breach_offset: f64,
    /// Trend magnitude kept (and turned away from the wall) after a breach.
    pub breach_trend_scale: f64,
    pub regimes: RegimeTable,
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self {
            mean_price: 28.45,
            bounds: (27.8, 29.2),
            precision: 2,
            reversion_rate_range: (0.02, 0.05),
            noise_dampening: 0.7,
            damping_factor: 0.8,
            momentum_step: 0.002,
            momentum_cap: 0.015,
            jump_probability: 0.02,
            jump_size_range: (0.02, 0.08),
            regime_switch_probability: 0.02,
            regime_duration_range: (25, 40),
            baseline_volatility: 0.01,
            breach_offset: 0.05,
            breach_trend_scale: 0.3,
            regimes: RegimeTable::default(),
        }
    }
}

// ─── Order book ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookConfig {
    /// Distance from the reference price to each best quote.
    pub half_spread_range: (f64, f64),
    pub near_levels: usize,
    pub near_step: f64,
    /// Volume at the best quote.
    pub near_top_volume: (u32, u32),
    /// Volume at the remaining near levels, before decay.
    pub near_volume: (u32, u32),
    /// Fractional volume decay per near level.
    pub near_decay: f64,
    pub depth_levels: usize,
    /// Distance of the first depth level from the best quote.
    pub depth_offset: f64,
    pub depth_step: f64,
    pub key_level_probability: f64,
    pub key_level_volume: (u32, u32),
    pub depth_volume: (u32, u32),
    /// Levels kept per side.
    pub depth: usize,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            half_spread_range: (0.01, 0.03),
            near_levels: 3,
            near_step: 0.02,
            near_top_volume: (150, 350),
            near_volume: (100, 280),
            near_decay: 0.15,
            depth_levels: 4,
            depth_offset: 0.05,
            depth_step: 0.03,
            key_level_probability: 0.3,
            key_level_volume: (180, 400),
            depth_volume: (50, 150),
            depth: OrderBook::MAX_DEPTH,
        }
    }
}

// ─── Trade tape ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TapeConfig {
    /// Share of trades printed right at the market (market or limit).
    pub tight_share: f64,
    /// Share of trades printed a little away (limit). The rest are blocks.
    pub medium_share: f64,
    pub tight_jitter: f64,
    pub medium_jitter: f64,
    pub wide_jitter: f64,
    pub regular_amount: (u32, u32),
    pub block_amount: (u32, u32),
    /// Gap between consecutive trades, newest first.
    pub spacing_secs: i64,
    /// Extra random age added to each trade, below this bound.
    pub spacing_jitter_secs: i64,
    pub farm_names: Vec<String>,
    pub corp_names: Vec<String>,
}

impl Default for TapeConfig {
    fn default() -> Self {
        let names = |list: &[&str]| list.iter().map(|s| s.to_string()).collect();
        Self {
            tight_share: 0.6,
            medium_share: 0.3,
            tight_jitter: 0.02,
            medium_jitter: 0.1,
            wide_jitter: 0.2,
            regular_amount: (50, 250),
            block_amount: (300, 1000),
            spacing_secs: 60,
            spacing_jitter_secs: 30,
            farm_names: names(&[
                "Farm A",
                "Farm B",
                "Organic Growers",
                "Green Fields",
                "Sustainable Farms",
                "EcoHarvest",
                "Smith Family Farms",
                "Valley Growers",
                "Highland Agriculture",
            ]),
            corp_names: names(&[
                "Corp X",
                "Corp Y",
                "EcoTrade",
                "GreenEnergy",
                "Sustainable Co.",
                "CarbonZero",
                "ClimatePartners",
                "GreenTech Solutions",
                "EarthFund",
            ]),
        }
    }
}

// ─── Historical seeding ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    pub sensor_interval_ms: i64,
    pub price_interval_ms: i64,
    /// Sensor volatility multiplier while bootstrapping history.
    pub sensor_volatility_scale: f64,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            sensor_interval_ms: 5_000,
            price_interval_ms: 30_000,
            sensor_volatility_scale: 0.5,
        }
    }
}

// ─── Top level ───────────────────────────────────────────────────────

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub sensors: ChannelTable,
    pub price: PriceConfig,
    pub book: BookConfig,
    pub tape: TapeConfig,
    pub seed: SeedConfig,
}

impl SimConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject configs that would let a generator break its own invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for channel in SensorChannel::ALL {
            let spec = self.sensors.get(channel);
            let field = format!("sensors.{}", channel.name());
            check_range(&field, (spec.min, spec.max))?;
            check_non_negative(&format!("{field}.volatility"), spec.volatility)?;
            if !(spec.min..=spec.max).contains(&spec.baseline) {
                return Err(invalid(
                    &format!("{field}.baseline"),
                    format!("{} outside [{}, {}]", spec.baseline, spec.min, spec.max),
                ));
            }
            if spec.precision > 10 {
                return Err(invalid(&format!("{field}.precision"), "at most 10 decimals"));
            }
        }

        let p = &self.price;
        check_range("price.bounds", p.bounds)?;
        if !(p.bounds.0..=p.bounds.1).contains(&p.mean_price) {
            return Err(invalid(
                "price.mean_price",
                format!("{} outside bounds {:?}", p.mean_price, p.bounds),
            ));
        }
        if p.precision > 10 {
            return Err(invalid("price.precision", "at most 10 decimals"));
        }
        check_non_negative("price.breach_offset", p.breach_offset)?;
        if p.breach_offset >= p.bounds.1 - p.bounds.0 {
            return Err(invalid("price.breach_offset", "wider than the price band"));
        }
        check_range("price.reversion_rate_range", p.reversion_rate_range)?;
        check_range("price.jump_size_range", p.jump_size_range)?;
        check_probability("price.jump_probability", p.jump_probability)?;
        check_probability("price.regime_switch_probability", p.regime_switch_probability)?;
        for (field, value) in [
            ("price.noise_dampening", p.noise_dampening),
            ("price.damping_factor", p.damping_factor),
            ("price.momentum_step", p.momentum_step),
            ("price.momentum_cap", p.momentum_cap),
            ("price.baseline_volatility", p.baseline_volatility),
            ("price.breach_trend_scale", p.breach_trend_scale),
        ] {
            check_non_negative(field, value)?;
        }
        let (lo, hi) = p.regime_duration_range;
        if lo == 0 || lo > hi {
            return Err(ConfigError::InvalidRange {
                field: "price.regime_duration_range".into(),
                min: lo as f64,
                max: hi as f64,
            });
        }
        for regime in Regime::ALL {
            let profile = p.regimes.get(regime);
            let field = format!("price.regimes.{regime}");
            check_non_negative(&format!("{field}.weight"), profile.weight)?;
            check_range(&format!("{field}.trend"), profile.trend)?;
            check_range(&format!("{field}.volatility"), profile.volatility)?;
        }
        if p.regimes.total_weight() <= 0.0 {
            return Err(invalid("price.regimes", "weights sum to zero"));
        }

        let b = &self.book;
        check_range("book.half_spread_range", b.half_spread_range)?;
        if b.half_spread_range.0 + 1e-9 < 0.01 {
            return Err(invalid("book.half_spread_range", "best quotes must sit at least one cent off"));
        }
        for (field, range) in [
            ("book.near_top_volume", b.near_top_volume),
            ("book.near_volume", b.near_volume),
            ("book.key_level_volume", b.key_level_volume),
            ("book.depth_volume", b.depth_volume),
        ] {
            check_range(field, (range.0 as f64, range.1 as f64))?;
        }
        check_probability("book.key_level_probability", b.key_level_probability)?;
        check_probability("book.near_decay", b.near_decay)?;
        if b.near_step < 0.01 || b.depth_step < 0.01 {
            return Err(invalid("book", "ladder steps must be at least one cent"));
        }
        let last_near = b.near_levels.saturating_sub(1) as f64 * b.near_step;
        if b.depth_levels > 0 && b.depth_offset + 1e-9 < last_near + 0.01 {
            return Err(invalid(
                "book.depth_offset",
                "depth ladder must start beyond the near ladder",
            ));
        }
        if b.depth == 0 || b.depth > OrderBook::MAX_DEPTH {
            return Err(invalid(
                "book.depth",
                format!("must be in 1..={}", OrderBook::MAX_DEPTH),
            ));
        }

        let t = &self.tape;
        check_probability("tape.tight_share", t.tight_share)?;
        check_probability("tape.medium_share", t.medium_share)?;
        if t.tight_share + t.medium_share > 1.0 {
            return Err(invalid("tape", "tight_share + medium_share exceeds 1"));
        }
        for (field, value) in [
            ("tape.tight_jitter", t.tight_jitter),
            ("tape.medium_jitter", t.medium_jitter),
            ("tape.wide_jitter", t.wide_jitter),
        ] {
            check_non_negative(field, value)?;
        }
        check_range(
            "tape.regular_amount",
            (t.regular_amount.0 as f64, t.regular_amount.1 as f64),
        )?;
        check_range(
            "tape.block_amount",
            (t.block_amount.0 as f64, t.block_amount.1 as f64),
        )?;
        if t.spacing_jitter_secs < 0 || t.spacing_secs <= t.spacing_jitter_secs {
            return Err(invalid(
                "tape.spacing_secs",
                "spacing must exceed its jitter so the tape stays ordered",
            ));
        }
        if t.farm_names.is_empty() || t.corp_names.is_empty() {
            return Err(invalid("tape", "name pools must not be empty"));
        }

        let s = &self.seed;
        if s.sensor_interval_ms <= 0 || s.price_interval_ms <= 0 {
            return Err(invalid("seed", "intervals must be positive"));
        }
        check_non_negative("seed.sensor_volatility_scale", s.sensor_volatility_scale)?;

        Ok(())
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason: reason.into(),
    }
}

fn check_range(field: &str, (min, max): (f64, f64)) -> Result<(), ConfigError> {
    if !min.is_finite() || !max.is_finite() || min > max {
        return Err(ConfigError::InvalidRange {
            field: field.to_string(),
            min,
            max,
        });
    }
    Ok(())
}

fn check_probability(field: &str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::InvalidProbability {
            field: field.to_string(),
            value,
        });
    }
    Ok(())
}

fn check_non_negative(field: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(field, format!("{value} must be finite and >= 0")));
    }
    Ok(())
}
