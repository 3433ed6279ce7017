//! Carbon-credit price is a regime-switching, mean-reverting walk with jumps.
//!
//! Each tick:
//! 1. Age the current regime; transition when the age passes its cap or a
//!    small per-tick chance fires. A transition redraws the regime by weight
//!    and redraws its duration cap, trend and volatility.
//! 2. Sum trend, mean reversion, damped noise, momentum along the noise
//!    direction, and an occasional jump. Damp the sum and apply it.
//! 3. Enforce the hard bounds: a breach lands just inside the violated wall and
//!    turns the trend away from it. A non-finite result resets to the mean.

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{debug, warn};

use super::TickSource;
use crate::config::{PriceConfig, RegimeTable, SimConfig};
use crate::domain::{round_dp, Direction, MarketState, PricePoint, Regime};
use crate::rng::{coin, symmetric, uniform_dp, uniform_int};

/// Weighted draw of a regime.
pub fn draw_regime<R: Rng + ?Sized>(table: &RegimeTable, rng: &mut R) -> Regime {
    let mut pick = rng.gen::<f64>() * table.total_weight();
    let mut last_weighted = Regime::Ranging;
    for regime in Regime::ALL {
        let weight = table.get(regime).weight;
        if weight <= 0.0 {
            continue;
        }
        if pick < weight {
            return regime;
        }
        pick -= weight;
        last_weighted = regime;
    }
    last_weighted
}

#[derive(Debug, Clone)]
pub struct PriceProcess {
    config: PriceConfig,
    state: MarketState,
}

impl PriceProcess {
    pub fn new(config: PriceConfig) -> Self {
        let state = baseline_state(&config);
        Self { config, state }
    }

    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(config.price.clone())
    }

    /// Resume from a previously captured state.
    pub fn with_state(config: PriceConfig, state: MarketState) -> Self {
        Self { config, state }
    }

    pub fn state(&self) -> &MarketState {
        &self.state
    }

    pub fn price(&self) -> f64 {
        self.state.price
    }

    pub fn config(&self) -> &PriceConfig {
        &self.config
    }

    /// Force a regime transition now.
    pub fn resample_regime<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Regime {
        let regime = draw_regime(&self.config.regimes, rng);
        let profile = self.config.regimes.get(regime);
        let from = self.state.regime;

        self.state.regime = regime;
        self.state.regime_age = 0;
        self.state.regime_duration_cap = uniform_int(rng, self.config.regime_duration_range);
        self.state.trend = uniform_dp(rng, profile.trend, 3);
        self.state.volatility = uniform_dp(rng, profile.volatility, 3);

        debug!(
            %from,
            to = %regime,
            cap = self.state.regime_duration_cap,
            trend = self.state.trend,
            volatility = self.state.volatility,
            "regime transition"
        );
        regime
    }

    /// Advance one tick and return the new price.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> f64 {
        if !self.state.price.is_finite() {
            warn!(price = self.state.price, "carried price is not finite, resetting to mean");
            self.state.price = self.config.mean_price;
        }

        self.state.regime_age = self.state.regime_age.saturating_add(1);
        if self.state.regime_age > self.state.regime_duration_cap
            || rng.gen::<f64>() < self.config.regime_switch_probability
        {
            self.resample_regime(rng);
        }

        let cfg = &self.config;
        let price = self.state.price;

        let reversion_rate = uniform_dp(rng, cfg.reversion_rate_range, 3);
        let mean_reversion = -(price - cfg.mean_price) * reversion_rate;

        let noise = symmetric(rng, 1.0) * self.state.volatility * cfg.noise_dampening;
        let direction = Direction::of(noise);
        if self.state.previous_direction.continues_into(direction) {
            self.state.momentum = (self.state.momentum + cfg.momentum_step).min(cfg.momentum_cap);
        } else {
            self.state.momentum = 0.0;
        }
        self.state.previous_direction = direction;

        let jump = if rng.gen::<f64>() < cfg.jump_probability {
            let size = uniform_dp(rng, cfg.jump_size_range, 2);
            if coin(rng) {
                size
            } else {
                -size
            }
        } else {
            0.0
        };

        let momentum = direction.sign() * self.state.momentum;
        let raw_delta = self.state.trend + mean_reversion + noise + momentum + jump;
        let candidate = round_dp(price + raw_delta * cfg.damping_factor, cfg.precision);

        self.state.price = self.enforce_bounds(rng, candidate);
        self.state.price
    }

    fn enforce_bounds<R: Rng + ?Sized>(&mut self, rng: &mut R, candidate: f64) -> f64 {
        let (lower, upper) = self.config.bounds;
        let precision = self.config.precision;

        if !candidate.is_finite() {
            warn!(candidate, "price diverged, resetting to mean");
            return self.config.mean_price;
        }

        if candidate < lower {
            let offset = uniform_dp(rng, (0.0, self.config.breach_offset), precision);
            self.state.trend = self.state.trend.abs() * self.config.breach_trend_scale;
            debug!(candidate, lower, trend = self.state.trend, "lower bound breached");
            return round_dp(lower + offset, precision).clamp(lower, upper);
        }

        if candidate > upper {
            let offset = uniform_dp(rng, (0.0, self.config.breach_offset), precision);
            self.state.trend = -self.state.trend.abs() * self.config.breach_trend_scale;
            debug!(candidate, upper, trend = self.state.trend, "upper bound breached");
            return round_dp(upper - offset, precision).clamp(lower, upper);
        }

        candidate
    }
}

fn baseline_state(config: &PriceConfig) -> MarketState {
    let mut state = MarketState::baseline(config.mean_price, config.regime_duration_range.0);
    state.volatility = config.baseline_volatility;
    state
}

impl TickSource for PriceProcess {
    type Output = PricePoint;

    fn step_at<R: Rng + ?Sized>(&mut self, rng: &mut R, at: DateTime<Utc>) -> PricePoint {
        PricePoint {
            timestamp: at,
            price: self.step(rng),
        }
    }

    fn reset(&mut self) {
        self.state = baseline_state(&self.config);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn process() -> PriceProcess {
        PriceProcess::from_config(&SimConfig::default())
    }

    #[test]
    fn baseline_matches_defaults() {
        let p = process();
        let s = p.state();
        assert_eq!(s.price, 28.45);
        assert_eq!(s.regime, Regime::Ranging);
        assert_eq!(s.regime_age, 0);
        assert_eq!(s.regime_duration_cap, 25);
        assert_eq!(s.volatility, 0.01);
    }

    #[test]
    fn price_stays_in_bounds_across_seeds() {
        for seed in 0..20 {
            let mut p = process();
            let mut rng = StdRng::seed_from_u64(seed);
            for tick in 0..2_000 {
                let price = p.step(&mut rng);
                assert!(price.is_finite(), "seed {seed} tick {tick}");
                assert!(
                    (27.8..=29.2).contains(&price),
                    "seed {seed} tick {tick}: {price}"
                );
            }
        }
    }

    #[test]
    fn regime_age_never_exceeds_cap_after_step() {
        let mut p = process();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..5_000 {
            p.step(&mut rng);
            let s = p.state();
            assert!(s.regime_age <= s.regime_duration_cap);
            assert!((25..=40).contains(&s.regime_duration_cap));
        }
    }

    #[test]
    fn cap_breach_forces_transition() {
        let mut config = SimConfig::default().price;
        config.regime_switch_probability = 0.0;
        config.regime_duration_range = (3, 3);
        let mut p = PriceProcess::new(config);
        let mut rng = StdRng::seed_from_u64(4);

        let ages: Vec<u32> = (0..8)
            .map(|_| {
                p.step(&mut rng);
                p.state().regime_age
            })
            .collect();
        assert_eq!(ages, vec![1, 2, 3, 0, 1, 2, 3, 0]);
    }

    #[test]
    fn resample_resets_age_and_draws_profile() {
        let mut p = process();
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..10 {
            p.step(&mut rng);
        }
        for _ in 0..200 {
            let regime = p.resample_regime(&mut rng);
            let s = p.state();
            assert_eq!(s.regime_age, 0);
            assert_eq!(s.regime, regime);
            assert!((25..=40).contains(&s.regime_duration_cap));
            match regime {
                Regime::Ranging => {
                    assert_eq!(s.trend, 0.0);
                    assert!((0.005..=0.015).contains(&s.volatility));
                }
                Regime::Uptrend => assert!(s.trend >= 0.005 && s.trend <= 0.015),
                Regime::Downtrend => assert!(s.trend <= -0.005 && s.trend >= -0.015),
                Regime::Volatile => {
                    assert_eq!(s.trend, 0.0);
                    assert!((0.02..=0.04).contains(&s.volatility));
                }
            }
        }
    }

    #[test]
    fn upper_breach_lands_inside_and_turns_trend_down() {
        let mut config = SimConfig::default().price;
        config.regime_switch_probability = 0.0;
        let mut state = MarketState::baseline(29.2, 40);
        state.trend = 0.5;
        let mut p = PriceProcess::with_state(config, state);
        let mut rng = StdRng::seed_from_u64(6);

        let price = p.step(&mut rng);
        assert!((29.15..=29.2).contains(&price), "{price}");
        assert!(p.state().trend < 0.0);
        assert!((p.state().trend + 0.15).abs() < 1e-12);
    }

    #[test]
    fn lower_breach_lands_inside_and_turns_trend_up() {
        let mut config = SimConfig::default().price;
        config.regime_switch_probability = 0.0;
        let mut state = MarketState::baseline(27.8, 40);
        state.trend = -0.5;
        let mut p = PriceProcess::with_state(config, state);
        let mut rng = StdRng::seed_from_u64(7);

        let price = p.step(&mut rng);
        assert!((27.8..=27.85).contains(&price), "{price}");
        assert!((p.state().trend - 0.15).abs() < 1e-12);
    }

    #[test]
    fn non_finite_price_recovers_to_mean() {
        let config = SimConfig::default().price;
        let state = MarketState::baseline(f64::NAN, 40);
        let mut p = PriceProcess::with_state(config, state);
        let mut rng = StdRng::seed_from_u64(8);

        let price = p.step(&mut rng);
        assert!(price.is_finite());
        assert!((27.8..=29.2).contains(&price));
    }

    #[test]
    fn diverging_candidate_resets_to_mean() {
        let mut p = process();
        let mut rng = StdRng::seed_from_u64(9);
        assert_eq!(p.enforce_bounds(&mut rng, f64::INFINITY), 28.45);
        assert_eq!(p.enforce_bounds(&mut rng, f64::NAN), 28.45);
    }

    #[test]
    fn momentum_is_capped() {
        let mut p = process();
        let mut rng = StdRng::seed_from_u64(10);
        for _ in 0..5_000 {
            p.step(&mut rng);
            assert!(p.state().momentum <= 0.015 + 1e-12);
            assert!(p.state().momentum >= 0.0);
        }
    }

    #[test]
    fn prices_have_two_decimals() {
        let mut p = process();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..500 {
            let price = p.step(&mut rng);
            assert_eq!(price, round_dp(price, 2));
        }
    }

    #[test]
    fn same_seed_same_path() {
        let run = |seed| {
            let mut p = process();
            let mut rng = StdRng::seed_from_u64(seed);
            (0..300).map(|_| p.step(&mut rng)).collect::<Vec<_>>()
        };
        assert_eq!(run(42), run(42));
        assert_ne!(run(42), run(43));
    }

    #[test]
    fn reset_restores_baseline_state() {
        let mut p = process();
        let mut rng = StdRng::seed_from_u64(12);
        for _ in 0..100 {
            p.step(&mut rng);
        }
        p.reset();
        assert_eq!(*p.state(), baseline_state(p.config()));
    }

    #[test]
    fn draw_regime_skips_zero_weights() {
        let mut table = RegimeTable::default();
        table.ranging.weight = 0.0;
        table.uptrend.weight = 0.0;
        table.downtrend.weight = 0.0;
        table.volatile.weight = 1.0;
        let mut rng = StdRng::seed_from_u64(13);
        for _ in 0..100 {
            assert_eq!(draw_regime(&table, &mut rng), Regime::Volatile);
        }
    }
}
