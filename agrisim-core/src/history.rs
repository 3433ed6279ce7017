//! Rolling history buffers and change summaries.
//!
//! Drivers keep the last N records of each series for charting. The change
//! helpers never fail: with fewer than two points, or a zero base, they report
//! no change.

use serde::Serialize;
use std::collections::VecDeque;

use crate::domain::{PricePoint, SensorChannel, SensorReading};

/// Fixed-capacity FIFO. Pushing onto a full buffer evicts the oldest entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollingBuffer<T> {
    capacity: usize,
    items: VecDeque<T>,
}

impl<T> RollingBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            items: VecDeque::with_capacity(capacity),
        }
    }

    /// Buffer holding the newest `capacity` items of `items`.
    pub fn from_items(capacity: usize, items: impl IntoIterator<Item = T>) -> Self {
        let mut buffer = Self::new(capacity);
        buffer.extend(items);
        buffer
    }

    /// Append `item`, returning the evicted entry if the buffer was full.
    pub fn push(&mut self, item: T) -> Option<T> {
        if self.capacity == 0 {
            return Some(item);
        }
        let evicted = if self.items.len() == self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    pub fn extend(&mut self, items: impl IntoIterator<Item = T>) {
        for item in items {
            self.push(item);
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() == self.capacity
    }

    pub fn latest(&self) -> Option<&T> {
        self.items.back()
    }

    /// Entry just before the latest.
    pub fn previous(&self) -> Option<&T> {
        self.items.len().checked_sub(2).and_then(|i| self.items.get(i))
    }

    pub fn oldest(&self) -> Option<&T> {
        self.items.front()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<T: Clone> RollingBuffer<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}

impl RollingBuffer<PricePoint> {
    /// Percent change from the oldest to the latest buffered price.
    pub fn change_pct(&self) -> f64 {
        match (self.oldest(), self.latest()) {
            (Some(first), Some(last)) if self.len() >= 2 => percent_change(first.price, last.price),
            _ => 0.0,
        }
    }

    /// Price change over the last tick.
    pub fn last_delta(&self) -> f64 {
        match (self.previous(), self.latest()) {
            (Some(prev), Some(last)) => last.price - prev.price,
            _ => 0.0,
        }
    }
}

impl RollingBuffer<SensorReading> {
    /// Percent change of `channel` over the last tick.
    pub fn channel_trend(&self, channel: SensorChannel) -> f64 {
        match (self.previous(), self.latest()) {
            (Some(prev), Some(last)) => percent_change(prev.value(channel), last.value(channel)),
            _ => 0.0,
        }
    }
}

/// `(current - previous) / previous * 100`, or 0 when that is undefined.
pub fn percent_change(previous: f64, current: f64) -> f64 {
    if previous == 0.0 || !previous.is_finite() || !current.is_finite() {
        return 0.0;
    }
    (current - previous) / previous * 100.0
}

/// Percent change from the first to the last value of a series.
pub fn series_change(values: &[f64]) -> f64 {
    match values {
        [first, .., last] => percent_change(*first, *last),
        _ => 0.0,
    }
}
