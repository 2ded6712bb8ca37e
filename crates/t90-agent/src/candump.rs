//! `candump -l` log line parser.
//!
//! Format: `(1700000000.123456) can0 362#5848`

use regex::Regex;
use std::sync::LazyLock;

use t90_decoder::CanFrame;
use t90_decoder::types::MAX_CAN_PAYLOAD;

use crate::error::{AgentError, AgentResult};

static RE_CANDUMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\((\d+\.\d+)\)\s+(\S+)\s+([0-9A-Fa-f]{3}|[0-9A-Fa-f]{8})#([0-9A-Fa-f]*)$").unwrap()
});

/// One captured frame.
#[derive(Debug, Clone, PartialEq)]
pub struct CandumpRecord {
    /// Capture timestamp, seconds since the epoch.
    pub timestamp: f64,
    pub interface: String,
    pub frame: CanFrame,
}

/// Maps capture interface names onto decoder bus numbers.
#[derive(Debug, Clone)]
pub struct BusMap {
    interface: String,
    bus: u8,
}

impl BusMap {
    pub fn new(interface: impl Into<String>, bus: u8) -> Self {
        Self {
            interface: interface.into(),
            bus,
        }
    }

    /// Bus for an interface, or `None` if the interface is not mapped.
    pub fn bus_for(&self, interface: &str) -> Option<u8> {
        (interface == self.interface).then_some(self.bus)
    }
}

/// Parse one log line.
///
/// Blank lines, `#` comments and frames from unmapped interfaces yield `None`.
pub fn parse_line(line: &str, line_number: usize, buses: &BusMap) -> AgentResult<Option<CandumpRecord>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let parse_err = |message: String| AgentError::Parse {
        line: line_number,
        message,
    };

    let caps = RE_CANDUMP
        .captures(line)
        .ok_or_else(|| parse_err(format!("not a candump line: {line}")))?;

    let timestamp: f64 = caps[1]
        .parse()
        .map_err(|e| parse_err(format!("bad timestamp: {e}")))?;
    let interface = caps[2].to_string();
    let id = u32::from_str_radix(&caps[3], 16).map_err(|e| parse_err(format!("bad id: {e}")))?;
    let data = decode_hex(&caps[4]).map_err(parse_err)?;
    if data.len() > MAX_CAN_PAYLOAD {
        return Err(parse_err(format!("{} data bytes exceed classic CAN", data.len())));
    }

    let Some(bus) = buses.bus_for(&interface) else {
        tracing::trace!(line = line_number, interface = %interface, "unmapped interface");
        return Ok(None);
    };
    Ok(Some(CandumpRecord {
        timestamp,
        interface,
        frame: CanFrame::new(bus, id, data),
    }))
}

fn decode_hex(s: &str) -> Result<Vec<u8>, String> {
    if s.len() % 2 != 0 {
        return Err(format!("odd number of hex digits: {s}"));
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).map_err(|e| e.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buses() -> BusMap {
        BusMap::new("can0", 1)
    }

    #[test]
    fn parse_voltage_frame() {
        let rec = parse_line("(1700000000.123456) can0 362#5848", 1, &buses())
            .unwrap()
            .unwrap();
        assert_eq!(rec.interface, "can0");
        assert!((rec.timestamp - 1_700_000_000.123456).abs() < 1e-3);
        assert_eq!(rec.frame, CanFrame::new(1, 0x362, vec![0x58, 0x48]));
    }

    #[test]
    fn parse_full_odometer_frame() {
        let rec = parse_line("(1.000000) can0 540#0000000090F00200", 7, &buses())
            .unwrap()
            .unwrap();
        assert_eq!(rec.frame.id, 0x540);
        assert_eq!(rec.frame.data, vec![0, 0, 0, 0, 0x90, 0xF0, 0x02, 0x00]);
    }

    #[test]
    fn parse_empty_payload() {
        let rec = parse_line("(1.0) can0 123#", 1, &buses()).unwrap().unwrap();
        assert!(rec.frame.data.is_empty());
    }

    #[test]
    fn unmapped_interface_dropped() {
        assert!(parse_line("(1.0) can1 362#5848", 1, &buses()).unwrap().is_none());
        assert!(parse_line("(1.1) vcan9 281#00A9", 2, &buses()).unwrap().is_none());
    }

    #[test]
    fn vehicle_bus_zero_does_not_capture_other_interfaces() {
        let buses = BusMap::new("can0", 0);
        assert_eq!(buses.bus_for("can0"), Some(0));
        assert_eq!(buses.bus_for("can1"), None);
        assert!(parse_line("(1.0) can1 362#5848", 1, &buses).unwrap().is_none());
        let rec = parse_line("(1.0) can0 362#5848", 2, &buses).unwrap().unwrap();
        assert_eq!(rec.frame.bus, 0);
    }

    #[test]
    fn blank_and_comment_lines_skipped() {
        assert!(parse_line("", 1, &buses()).unwrap().is_none());
        assert!(parse_line("   ", 2, &buses()).unwrap().is_none());
        assert!(parse_line("# captured at home", 3, &buses()).unwrap().is_none());
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let err = parse_line("hello world", 42, &buses()).unwrap_err();
        assert!(matches!(err, AgentError::Parse { line: 42, .. }));
    }

    #[test]
    fn odd_hex_rejected() {
        assert!(parse_line("(1.0) can0 362#584", 1, &buses()).is_err());
    }

    #[test]
    fn oversized_payload_rejected() {
        assert!(parse_line("(1.0) can0 362#000000000000000000", 1, &buses()).is_err());
    }
}
