//! Sensor telemetry: eight independent bounded random walks.

use chrono::{DateTime, Utc};
use rand::Rng;

use super::TickSource;
use crate::config::{ChannelSpec, ChannelTable, SimConfig};
use crate::domain::{round_dp, SensorChannel, SensorReading, SensorValues};
use crate::rng::symmetric;

/// One step of a single channel: uniform nudge, clamp, round.
///
/// A non-finite `previous` restarts the channel from its baseline.
pub fn walk_channel<R: Rng + ?Sized>(
    rng: &mut R,
    previous: f64,
    spec: &ChannelSpec,
    volatility_scale: f64,
) -> f64 {
    let previous = if previous.is_finite() {
        previous
    } else {
        spec.baseline
    };
    let next = (previous + symmetric(rng, spec.volatility * volatility_scale)).clamp(spec.min, spec.max);
    round_dp(next, spec.precision).clamp(spec.min, spec.max)
}

#[derive(Debug, Clone)]
pub struct SensorSeriesGenerator {
    channels: ChannelTable,
    values: SensorValues,
    seed_volatility_scale: f64,
}

impl SensorSeriesGenerator {
    pub fn new(channels: ChannelTable, seed_volatility_scale: f64) -> Self {
        let values = channels.baseline_values();
        Self {
            channels,
            values,
            seed_volatility_scale,
        }
    }

    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(config.sensors.clone(), config.seed.sensor_volatility_scale)
    }

    /// Latest value of every channel.
    pub fn values(&self) -> &SensorValues {
        &self.values
    }

    pub fn channels(&self) -> &ChannelTable {
        &self.channels
    }

    /// Pure step: the successor of `previous`, leaving `self` untouched.
    pub fn next_values<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        previous: &SensorValues,
        volatility_scale: f64,
    ) -> SensorValues {
        let mut next = *previous;
        for channel in SensorChannel::ALL {
            let spec = self.channels.get(channel);
            next.set(
                channel,
                walk_channel(rng, previous.get(channel), spec, volatility_scale),
            );
        }
        next
    }

    fn advance<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        at: DateTime<Utc>,
        volatility_scale: f64,
    ) -> SensorReading {
        self.values = self.next_values(rng, &self.values, volatility_scale);
        SensorReading {
            timestamp: at,
            values: self.values,
        }
    }
}

impl TickSource for SensorSeriesGenerator {
    type Output = SensorReading;

    fn step_at<R: Rng + ?Sized>(&mut self, rng: &mut R, at: DateTime<Utc>) -> SensorReading {
        self.advance(rng, at, 1.0)
    }

    fn seed_step_at<R: Rng + ?Sized>(&mut self, rng: &mut R, at: DateTime<Utc>) -> SensorReading {
        self.advance(rng, at, self.seed_volatility_scale)
    }

    fn reset(&mut self) {
        self.values = self.channels.baseline_values();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn generator() -> SensorSeriesGenerator {
        SensorSeriesGenerator::from_config(&SimConfig::default())
    }

    #[test]
    fn starts_at_baseline() {
        let g = generator();
        let v = g.values();
        assert_eq!(v.temperature, 24.5);
        assert_eq!(v.humidity, 65.0);
        assert_eq!(v.soil_moisture, 45.0);
        assert_eq!(v.light_intensity, 5000.0);
        assert_eq!(v.battery_level, 85.0);
        assert_eq!(v.rainfall, 2.0);
        assert_eq!(v.wind_speed, 7.5);
        assert_eq!(v.air_quality, 75.0);
    }

    #[test]
    fn step_moves_at_most_volatility_plus_rounding() {
        let mut g = generator();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..500 {
            let before = *g.values();
            let reading = g.step_at(&mut rng, Utc::now());
            for channel in SensorChannel::ALL {
                let spec = g.channels().get(channel);
                let half_ulp = 0.5 * 10f64.powi(-(spec.precision as i32));
                let moved = (reading.value(channel) - before.get(channel)).abs();
                assert!(
                    moved <= spec.volatility + half_ulp + 1e-9,
                    "{channel} moved {moved}"
                );
            }
        }
    }

    #[test]
    fn values_rounded_to_channel_precision() {
        let mut g = generator();
        let mut rng = StdRng::seed_from_u64(12);
        for _ in 0..200 {
            let reading = g.step_at(&mut rng, Utc::now());
            for (channel, value) in reading.values.iter() {
                let precision = g.channels().get(channel).precision;
                assert_eq!(value, round_dp(value, precision), "{channel}");
            }
        }
    }

    #[test]
    fn clamps_at_domain_edges() {
        let spec = ChannelSpec::new(0.0, 0.0, 10.0, 5.0, 1);
        let mut rng = StdRng::seed_from_u64(13);
        for _ in 0..1000 {
            let low = walk_channel(&mut rng, 0.0, &spec, 1.0);
            let high = walk_channel(&mut rng, 10.0, &spec, 1.0);
            assert!((0.0..=10.0).contains(&low));
            assert!((0.0..=10.0).contains(&high));
        }
    }

    #[test]
    fn non_finite_previous_restarts_from_baseline() {
        let spec = ChannelSpec::new(24.5, 18.0, 32.0, 0.3, 1);
        let mut rng = StdRng::seed_from_u64(14);
        let next = walk_channel(&mut rng, f64::NAN, &spec, 1.0);
        assert!((next - 24.5).abs() <= 0.35);
    }

    #[test]
    fn seed_step_is_calmer_than_live_step() {
        let mut g = generator();
        g.seed_volatility_scale = 0.0;
        let mut rng = StdRng::seed_from_u64(15);
        let reading = g.seed_step_at(&mut rng, Utc::now());
        assert_eq!(reading.values, SimConfig::default().sensors.baseline_values());
    }

    #[test]
    fn reset_restores_baseline() {
        let mut g = generator();
        let mut rng = StdRng::seed_from_u64(16);
        for _ in 0..50 {
            g.step_at(&mut rng, Utc::now());
        }
        g.reset();
        assert_eq!(*g.values(), SimConfig::default().sensors.baseline_values());
    }

    #[test]
    fn ticks_are_lazy_and_evenly_spaced() {
        let mut g = generator();
        let mut rng = StdRng::seed_from_u64(17);
        let start = Utc::now();
        let readings: Vec<_> = g
            .ticks(&mut rng, start, Duration::seconds(5))
            .take(4)
            .collect();
        assert_eq!(readings.len(), 4);
        for (i, r) in readings.iter().enumerate() {
            assert_eq!(r.timestamp, start + Duration::seconds(5 * i as i64));
        }
    }
}
