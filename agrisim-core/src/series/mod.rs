//! Stepping generators and the seam they share.
//!
//! A [`TickSource`] owns mutable state, advances it one tick at a time, and can
//! be reset to its documented baseline. Randomness is always passed in, so a
//! seeded `StdRng` replays a series exactly.

pub mod price;
pub mod seed;
pub mod sensors;

pub use price::PriceProcess;
pub use seed::HistoricalSeedGenerator;
pub use sensors::SensorSeriesGenerator;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

/// A stateful generator advanced by an external clock.
pub trait TickSource {
    type Output;

    /// Advance one live tick stamped `at`.
    fn step_at<R: Rng + ?Sized>(&mut self, rng: &mut R, at: DateTime<Utc>) -> Self::Output;

    /// Advance one tick while bootstrapping history. Defaults to a live tick.
    fn seed_step_at<R: Rng + ?Sized>(&mut self, rng: &mut R, at: DateTime<Utc>) -> Self::Output {
        self.step_at(rng, at)
    }

    /// Restore the documented baseline state.
    fn reset(&mut self);

    /// Lazy, infinite series of live ticks starting at `start`.
    fn ticks<'a, R: Rng + ?Sized>(
        &'a mut self,
        rng: &'a mut R,
        start: DateTime<Utc>,
        interval: Duration,
    ) -> Ticks<'a, Self, R>
    where
        Self: Sized,
    {
        Ticks {
            source: self,
            rng,
            next_at: start,
            interval,
        }
    }
}

/// Iterator over live ticks of a [`TickSource`]. Never ends.
pub struct Ticks<'a, S, R: ?Sized> {
    source: &'a mut S,
    rng: &'a mut R,
    next_at: DateTime<Utc>,
    interval: Duration,
}

impl<S: TickSource, R: Rng + ?Sized> Iterator for Ticks<'_, S, R> {
    type Item = S::Output;

    fn next(&mut self) -> Option<Self::Item> {
        let at = self.next_at;
        self.next_at = at + self.interval;
        Some(self.source.step_at(self.rng, at))
    }
}
