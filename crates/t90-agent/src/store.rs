//! In-memory metric store with change-aware set semantics.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use t90_decoder::MetricSink;
use t90_protocol::{Metric, MetricValue, MetricWrite, Unit};

/// Keeps the last value per metric and queues a [`MetricWrite`] whenever
/// a value is first set or actually changes.
#[derive(Debug, Default)]
pub struct MetricStore {
    values: HashMap<Metric, MetricValue>,
    pending: Vec<MetricWrite>,
    clock: Option<DateTime<Utc>>,
}

impl MetricStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp subsequent writes with `time` instead of the wall clock
    /// (capture replays use the capture timestamp).
    pub fn set_clock(&mut self, time: DateTime<Utc>) {
        self.clock = Some(time);
    }

    /// Take all queued writes, oldest first.
    pub fn drain(&mut self) -> Vec<MetricWrite> {
        std::mem::take(&mut self.pending)
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl MetricSink for MetricStore {
    fn set(&mut self, metric: Metric, value: MetricValue, unit: Option<Unit>) {
        if self.values.get(&metric) == Some(&value) {
            return;
        }
        self.values.insert(metric, value.clone());
        self.pending.push(MetricWrite {
            time: self.clock.unwrap_or_else(Utc::now),
            metric,
            value,
            unit,
        });
    }

    fn get(&self, metric: Metric) -> Option<MetricValue> {
        self.values.get(&metric).cloned()
    }
}

/// Convert a capture timestamp (seconds since the epoch) into a UTC time.
pub fn capture_time(timestamp: f64) -> Option<DateTime<Utc>> {
    let secs = timestamp.floor();
    let nanos = ((timestamp - secs) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(secs as i64, nanos)
}
