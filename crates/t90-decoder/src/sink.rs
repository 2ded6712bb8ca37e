//! Metric sink seam.
//!
//! The decoder writes named values through this trait and reads back only
//! what it needs as filter context (current odometer, READY flag, …). The
//! store behind it owns change detection and notification.

use t90_protocol::{Metric, MetricValue, Unit};

pub trait MetricSink {
    /// Set a metric value.
    fn set(&mut self, metric: Metric, value: MetricValue, unit: Option<Unit>);

    /// Current value of a metric, if it has ever been set.
    fn get(&self, metric: Metric) -> Option<MetricValue>;

    /// Current numeric value.
    fn float(&self, metric: Metric) -> Option<f64> {
        self.get(metric).and_then(|v| v.as_f64())
    }

    /// Current boolean value; unset reads as `false`.
    fn flag(&self, metric: Metric) -> bool {
        self.get(metric).and_then(|v| v.as_bool()).unwrap_or(false)
    }
}
