//! Core frame types, bus constants, and the decoded-signal carrier.

use t90_protocol::{Metric, MetricValue};

use crate::sink::MetricSink;

// ── Vehicle bus ─────────────────────────────────────────────────

/// Bus number the T90 native frames arrive on (CAN1, 500 kbps).
pub const VEHICLE_BUS: u8 = 1;

/// Maximum payload length of a classic CAN frame.
pub const MAX_CAN_PAYLOAD: usize = 8;

// ── Diagnostic (poll) CAN IDs ───────────────────────────────────

/// Request CAN ID of the ECU answering the extended PIDs.
pub const POLL_REQUEST_ID: u32 = 0x7E3;

/// Response CAN ID of the ECU answering the extended PIDs.
pub const POLL_RESPONSE_ID: u32 = 0x7EB;

// ── Diagnostic services ─────────────────────────────────────────

/// Service 0x22: read data by 16-bit identifier (OBD-II extended PID).
pub const SERVICE_READ_DATA_BY_ID: u8 = 0x22;

/// Offset added to request service to get the positive response SID.
pub const RESPONSE_SID_OFFSET: u8 = 0x40;

/// Negative response SID.
pub const NEGATIVE_RESPONSE_SID: u8 = 0x7F;

// ── CAN Frame ───────────────────────────────────────────────────

/// A raw CAN 2.0A frame (standard 11-bit ID) with its bus of origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanFrame {
    /// Bus the frame was received on.
    pub bus: u8,
    /// CAN arbitration ID (11-bit standard).
    pub id: u32,
    /// Data payload (0–8 bytes for standard CAN).
    pub data: Vec<u8>,
}

impl CanFrame {
    pub fn new(bus: u8, id: u32, data: Vec<u8>) -> Self {
        Self { bus, id, data }
    }
}

// ── Poll Reply ──────────────────────────────────────────────────

/// A reassembled reply to an extended PID poll, with SID and PID echo stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollReply {
    pub pid: u16,
    pub data: Vec<u8>,
}

impl PollReply {
    pub fn new(pid: u16, data: Vec<u8>) -> Self {
        Self { pid, data }
    }
}

// ── Signal identifier ───────────────────────────────────────────

/// Dispatch key: a native CAN message id or an extended OBD-II PID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalId {
    Can(u32),
    Pid(u16),
}

impl std::fmt::Display for SignalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Can(id) => write!(f, "CAN 0x{id:03X}"),
            Self::Pid(pid) => write!(f, "PID 0x{pid:04X}"),
        }
    }
}

// ── Decoded signal ──────────────────────────────────────────────

/// A value that passed its filters, on its way to the metric sink.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSignal {
    /// Where the value came from.
    pub source: SignalId,
    /// Target metric.
    pub metric: Metric,
    pub value: MetricValue,
}

impl DecodedSignal {
    pub fn new(source: SignalId, metric: Metric, value: impl Into<MetricValue>) -> Self {
        Self {
            source,
            metric,
            value: value.into(),
        }
    }

    /// Write the value to the sink, tagged with the metric's unit.
    pub fn publish(self, sink: &mut dyn MetricSink) {
        tracing::trace!(
            source = %self.source,
            metric = %self.metric,
            value = %self.value,
            "metric write"
        );
        sink.set(self.metric, self.value, self.metric.unit());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockMetricSink;
    use t90_protocol::Unit;

    #[test]
    fn signal_id_display() {
        assert_eq!(SignalId::Can(0x362).to_string(), "CAN 0x362");
        assert_eq!(SignalId::Pid(0xE004).to_string(), "PID 0xE004");
    }

    #[test]
    fn decoded_signal_publishes_with_unit() {
        let mut sink = MockMetricSink::new();
        DecodedSignal::new(SignalId::Can(0x362), Metric::ChargeVoltage, 226.0).publish(&mut sink);

        let writes = sink.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].metric, Metric::ChargeVoltage);
        assert_eq!(writes[0].value, MetricValue::Float(226.0));
        assert_eq!(writes[0].unit, Some(Unit::Volts));
    }
}
