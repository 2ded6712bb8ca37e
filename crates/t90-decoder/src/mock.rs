//! Mock metric sink for testing.
//!
//! Records every `set` call in order, including writes that do not change
//! the stored value, so tests can assert on the decoder's own change gating.

use std::collections::HashMap;

use t90_protocol::{Metric, MetricValue, Unit};

use crate::sink::MetricSink;

/// A recorded `set` call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedWrite {
    pub metric: Metric,
    pub value: MetricValue,
    pub unit: Option<Unit>,
}

/// Mock implementation of the `MetricSink` trait.
#[derive(Debug, Default)]
pub struct MockMetricSink {
    writes: Vec<RecordedWrite>,
    values: HashMap<Metric, MetricValue>,
}

impl MockMetricSink {
    /// Create a new mock with no stored values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock with the READY flag already set.
    pub fn ready() -> Self {
        let mut sink = Self::new();
        sink.preset(Metric::EnvOn, true);
        sink
    }

    /// Store a value without recording a write.
    pub fn preset(&mut self, metric: Metric, value: impl Into<MetricValue>) {
        self.values.insert(metric, value.into());
    }

    /// All recorded writes, in order.
    pub fn writes(&self) -> &[RecordedWrite] {
        &self.writes
    }

    /// Recorded writes for one metric.
    pub fn writes_to(&self, metric: Metric) -> Vec<&RecordedWrite> {
        self.writes.iter().filter(|w| w.metric == metric).collect()
    }

    /// Number of writes recorded for one metric.
    pub fn count(&self, metric: Metric) -> usize {
        self.writes.iter().filter(|w| w.metric == metric).count()
    }

    /// Last recorded write, if any.
    pub fn last_write(&self) -> Option<&RecordedWrite> {
        self.writes.last()
    }

    /// Forget recorded writes but keep stored values.
    pub fn clear_writes(&mut self) {
        self.writes.clear();
    }
}

impl MetricSink for MockMetricSink {
    fn set(&mut self, metric: Metric, value: MetricValue, unit: Option<Unit>) {
        self.values.insert(metric, value.clone());
        self.writes.push(RecordedWrite {
            metric,
            value,
            unit,
        });
    }

    fn get(&self, metric: Metric) -> Option<MetricValue> {
        self.values.get(&metric).cloned()
    }
}
