//! History bootstrap: fills a chart before the first live tick.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use super::TickSource;
use crate::config::SeedConfig;

/// Produces `count` evenly spaced records ending at `now`.
///
/// The source is reset to its baseline first, and is left holding the last
/// seeded value so live ticks continue the seeded curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoricalSeedGenerator {
    interval: Duration,
}

impl HistoricalSeedGenerator {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn for_sensors(config: &SeedConfig) -> Self {
        Self::new(Duration::milliseconds(config.sensor_interval_ms))
    }

    pub fn for_prices(config: &SeedConfig) -> Self {
        Self::new(Duration::milliseconds(config.price_interval_ms))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Oldest-first timestamps of a `count`-long history ending at `now`.
    pub fn timestamps(&self, count: usize, now: DateTime<Utc>) -> Vec<DateTime<Utc>> {
        (0..count)
            .rev()
            .map(|steps_back| self.instant_before(now, steps_back))
            .collect()
    }

    /// `now` minus `steps_back` intervals, saturating at the earliest
    /// representable instant.
    fn instant_before(&self, now: DateTime<Utc>, steps_back: usize) -> DateTime<Utc> {
        let steps = i64::try_from(steps_back).unwrap_or(i64::MAX);
        let offset = Duration::try_milliseconds(self.interval.num_milliseconds().saturating_mul(steps))
            .unwrap_or(Duration::MAX);
        now.checked_sub_signed(offset).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    pub fn seed<S, R>(
        &self,
        source: &mut S,
        rng: &mut R,
        count: usize,
        now: DateTime<Utc>,
    ) -> Vec<S::Output>
    where
        S: TickSource,
        R: Rng + ?Sized,
    {
        source.reset();
        self.timestamps(count, now)
            .into_iter()
            .map(|at| source.seed_step_at(rng, at))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::series::{PriceProcess, SensorSeriesGenerator};
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn timestamps_end_at_now_and_are_evenly_spaced() {
        let seeder = HistoricalSeedGenerator::new(Duration::seconds(5));
        let ts = seeder.timestamps(20, now());
        assert_eq!(ts.len(), 20);
        assert_eq!(*ts.last().unwrap(), now());
        assert_eq!(ts[0], now() - Duration::seconds(95));
        for pair in ts.windows(2) {
            assert_eq!(pair[1] - pair[0], Duration::seconds(5));
        }
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn offsets_beyond_i32_steps_do_not_truncate() {
        let seeder = HistoricalSeedGenerator::new(Duration::seconds(5));
        let steps = 3_000_000_000usize;
        assert_eq!(
            seeder.instant_before(now(), steps),
            now() - Duration::seconds(15_000_000_000)
        );
        assert_eq!(seeder.instant_before(now(), usize::MAX), DateTime::<Utc>::MIN_UTC);
    }

    #[test]
    fn zero_count_is_empty() {
        let seeder = HistoricalSeedGenerator::new(Duration::seconds(5));
        assert!(seeder.timestamps(0, now()).is_empty());
    }

    #[test]
    fn seeding_resets_then_continues_from_last_value() {
        let config = SimConfig::default();
        let mut sensors = SensorSeriesGenerator::from_config(&config);
        let mut rng = StdRng::seed_from_u64(1);

        for _ in 0..100 {
            sensors.step_at(&mut rng, now());
        }

        let seeder = HistoricalSeedGenerator::for_sensors(&config.seed);
        let history = seeder.seed(&mut sensors, &mut rng, 20, now());
        assert_eq!(history.len(), 20);
        assert_eq!(history.last().unwrap().values, *sensors.values());

        // First seeded value is one calm step away from baseline.
        let first = &history[0];
        let baseline = config.sensors.baseline_values();
        assert!((first.values.temperature - baseline.temperature).abs() <= 0.2);
    }

    #[test]
    fn price_seed_starts_from_mean() {
        let config = SimConfig::default();
        let mut price = PriceProcess::from_config(&config);
        let mut rng = StdRng::seed_from_u64(2);

        let seeder = HistoricalSeedGenerator::for_prices(&config.seed);
        let history = seeder.seed(&mut price, &mut rng, 50, now());
        assert_eq!(history.len(), 50);
        assert!((history[0].price - 28.45).abs() < 0.2);
        assert_eq!(history.last().unwrap().price, price.price());
        assert_eq!(
            history[1].timestamp - history[0].timestamp,
            Duration::seconds(30)
        );
    }
}
