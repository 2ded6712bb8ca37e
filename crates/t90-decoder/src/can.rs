//! Native CAN frame decoders (vehicle bus).
//!
//! Scalings and bit positions are reverse-engineered from live captures.

use t90_protocol::{Metric, MetricValue};

use crate::bytes::{field, u16_be, u24_le};
use crate::decoder::Maxt90Decoder;
use crate::error::{DecodeResult, Rejection};
use crate::filters;
use crate::registry::CanSignal;
use crate::sink::MetricSink;
use crate::types::{DecodedSignal, SignalId};

impl Maxt90Decoder {
    /// Decode a frame whose id and length have already been checked.
    ///
    /// The target metric and change gating come from the registry entry.
    pub(crate) fn decode_can(
        &mut self,
        signal: CanSignal,
        data: &[u8],
        sink: &mut dyn MetricSink,
    ) -> DecodeResult<()> {
        let source = SignalId::Can(signal.id());
        let mut power = None;
        let value: MetricValue = match signal {
            CanSignal::Handbrake => {
                let [b2] = field(data, 2)?;
                let on = filters::handbrake(b2);
                tracing::debug!(handbrake = on, "parking brake (0x266 byte2 bit0)");
                on.into()
            }
            CanSignal::LockState => {
                let [b1] = field(data, 1)?;
                // Debounced against the last byte seen, not the metric.
                if self.last_lock_byte == Some(b1) {
                    return Err(Rejection::Unchanged);
                }
                let locked = filters::lock_state(b1)?;
                self.last_lock_byte = Some(b1);
                tracing::info!(
                    locked,
                    raw = format_args!("0x{b1:02X}"),
                    "lock state changed"
                );
                locked.into()
            }
            CanSignal::AcVoltage => {
                let raw = u16_be(field(data, 0)?);
                let volts = filters::ac_voltage(raw)?;
                tracing::debug!(volts, raw, "AC line voltage");
                power = self.ac_line.accept_voltage(volts);
                volts.into()
            }
            CanSignal::AcCurrent => {
                let raw = u16_be(field(data, 0)?);
                let amps = filters::ac_current(raw)?;
                tracing::debug!(amps, raw, "AC line current");
                power = self.ac_line.accept_current(amps);
                amps.into()
            }
            CanSignal::GearCandidate => {
                // Constant 0x33 in every capture regardless of selector
                // position; observe only until the mapping is confirmed.
                let [b3] = field(data, 3)?;
                tracing::debug!(raw = format_args!("0x{b3:02X}"), "gear candidate 0x510 byte3");
                return Ok(());
            }
            CanSignal::Odometer => {
                let raw = u24_le(field(data, 4)?);
                let km = filters::odometer(raw)?;
                tracing::trace!(km, raw = format_args!("0x{raw:06X}"), "odometer");
                km.into()
            }
        };

        if let Some(metric) = signal.metric() {
            if signal.change_gated() {
                if sink.get(metric).as_ref() == Some(&value) {
                    return Err(Rejection::Unchanged);
                }
                tracing::info!(metric = %metric, value = %value, "{} changed", signal.name());
            }
            DecodedSignal::new(source, metric, value).publish(sink);
        }
        if let Some(kw) = power {
            tracing::debug!(kw, "AC charge power");
            DecodedSignal::new(source, Metric::ChargePower, kw).publish(sink);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::decoder::{DecoderConfig, Maxt90Decoder};
    use crate::mock::MockMetricSink;
    use crate::sink::MetricSink;
    use crate::types::CanFrame;
    use t90_protocol::{Metric, MetricValue, Unit};

    fn decoder() -> Maxt90Decoder {
        Maxt90Decoder::new(&DecoderConfig::default())
    }

    fn frame(id: u32, data: &[u8]) -> CanFrame {
        CanFrame::new(1, id, data.to_vec())
    }

    fn voltage_frame(raw: u16) -> CanFrame {
        frame(0x362, &raw.to_be_bytes())
    }

    fn current_frame(raw: u16) -> CanFrame {
        frame(0x373, &raw.to_be_bytes())
    }

    // --- Handbrake ---

    #[test]
    fn handbrake_on_off() {
        let mut dec = decoder();
        let mut sink = MockMetricSink::new();

        dec.handle_frame(&frame(0x266, &[0x00, 0x00, 0x01]), &mut sink);
        assert!(sink.flag(Metric::EnvHandbrake));

        dec.handle_frame(&frame(0x266, &[0xFF, 0xFF, 0xFE, 0xFF]), &mut sink);
        assert!(!sink.flag(Metric::EnvHandbrake));
        assert_eq!(sink.count(Metric::EnvHandbrake), 2);
    }

    // --- Lock state ---

    #[test]
    fn lock_bytes_map_to_locked() {
        let mut dec = decoder();
        let mut sink = MockMetricSink::new();

        dec.handle_frame(&frame(0x281, &[0x00, 0xA9]), &mut sink);
        assert!(sink.flag(Metric::EnvLocked));

        dec.handle_frame(&frame(0x281, &[0x00, 0xA8]), &mut sink);
        assert!(!sink.flag(Metric::EnvLocked));
        assert_eq!(sink.count(Metric::EnvLocked), 2);
    }

    #[test]
    fn lock_debounced_on_repeat() {
        let mut dec = decoder();
        let mut sink = MockMetricSink::new();
        for _ in 0..5 {
            dec.handle_frame(&frame(0x281, &[0x00, 0xA9, 0x00]), &mut sink);
        }
        assert_eq!(sink.count(Metric::EnvLocked), 1);
    }

    #[test]
    fn lock_unknown_byte_leaves_state() {
        let mut dec = decoder();
        let mut sink = MockMetricSink::new();

        dec.handle_frame(&frame(0x281, &[0x00, 0xA9]), &mut sink);
        dec.handle_frame(&frame(0x281, &[0x00, 0x12]), &mut sink);
        assert_eq!(sink.count(Metric::EnvLocked), 1);
        assert!(sink.flag(Metric::EnvLocked));

        // An unknown byte in between does not reset the debounce.
        dec.handle_frame(&frame(0x281, &[0x00, 0xA9]), &mut sink);
        assert_eq!(sink.count(Metric::EnvLocked), 1);
    }

    #[test]
    fn lock_debounce_ignores_metric_store() {
        let mut dec = decoder();
        let mut sink = MockMetricSink::new();
        // Some other writer already marked the car locked.
        sink.preset(Metric::EnvLocked, true);

        dec.handle_frame(&frame(0x281, &[0x00, 0xA9]), &mut sink);
        assert_eq!(sink.count(Metric::EnvLocked), 1);
    }

    // --- AC voltage / current / power ---

    #[test]
    fn voltage_accepted_without_power() {
        let mut dec = decoder();
        let mut sink = MockMetricSink::new();
        dec.handle_frame(&voltage_frame(22600), &mut sink);

        assert_eq!(sink.float(Metric::ChargeVoltage), Some(226.0));
        assert_eq!(
            sink.writes_to(Metric::ChargeVoltage)[0].unit,
            Some(Unit::Volts)
        );
        assert_eq!(sink.count(Metric::ChargePower), 0);
        assert_eq!(dec.ac_line().voltage(), Some(226.0));
    }

    #[test]
    fn voltage_then_current_publishes_power() {
        let mut dec = decoder();
        let mut sink = MockMetricSink::new();
        dec.handle_frame(&voltage_frame(22600), &mut sink);
        dec.handle_frame(&current_frame(2388), &mut sink);

        let power = sink.float(Metric::ChargePower).unwrap();
        assert!((power - 3.290).abs() < 0.001);
        assert_eq!(sink.count(Metric::ChargePower), 1);
        assert_eq!(
            sink.writes_to(Metric::ChargePower)[0].unit,
            Some(Unit::KiloWatts)
        );
    }

    #[test]
    fn current_then_voltage_publishes_power() {
        let mut dec = decoder();
        let mut sink = MockMetricSink::new();
        dec.handle_frame(&current_frame(1640), &mut sink); // 10 A
        assert_eq!(sink.count(Metric::ChargePower), 0);

        dec.handle_frame(&voltage_frame(23000), &mut sink);
        assert_eq!(sink.float(Metric::ChargePower), Some(2.3));
    }

    #[test]
    fn rejected_voltage_leaves_cache_and_power_alone() {
        let mut dec = decoder();
        let mut sink = MockMetricSink::new();
        dec.handle_frame(&voltage_frame(23000), &mut sink);
        dec.handle_frame(&current_frame(1640), &mut sink);
        sink.clear_writes();

        dec.handle_frame(&voltage_frame(0), &mut sink);
        dec.handle_frame(&voltage_frame(30000), &mut sink);
        assert!(sink.writes().is_empty());
        assert_eq!(dec.ac_line().voltage(), Some(230.0));
    }

    #[test]
    fn rejected_current_never_yields_power() {
        let mut dec = decoder();
        let mut sink = MockMetricSink::new();
        dec.handle_frame(&voltage_frame(23000), &mut sink);
        dec.handle_frame(&current_frame(0), &mut sink); // idle EVSE
        dec.handle_frame(&current_frame(16), &mut sink); // 0.098 A
        dec.handle_frame(&current_frame(7000), &mut sink); // 42.7 A
        assert_eq!(sink.count(Metric::ChargeCurrent), 0);
        assert_eq!(sink.count(Metric::ChargePower), 0);
        assert_eq!(dec.ac_line().current(), None);
    }

    #[test]
    fn repeated_current_republishes_power() {
        let mut dec = decoder();
        let mut sink = MockMetricSink::new();
        dec.handle_frame(&voltage_frame(23000), &mut sink);
        for _ in 0..3 {
            dec.handle_frame(&current_frame(1640), &mut sink);
        }
        assert_eq!(sink.count(Metric::ChargePower), 3);
        assert_eq!(sink.count(Metric::ChargeCurrent), 3);
    }

    #[test]
    fn power_write_follows_input_write() {
        let mut dec = decoder();
        let mut sink = MockMetricSink::new();
        dec.handle_frame(&voltage_frame(23000), &mut sink);
        dec.handle_frame(&current_frame(1640), &mut sink);

        let order: Vec<Metric> = sink.writes().iter().map(|w| w.metric).collect();
        assert_eq!(
            order,
            vec![Metric::ChargeVoltage, Metric::ChargeCurrent, Metric::ChargePower]
        );
    }

    // --- Gear candidate ---

    #[test]
    fn gear_candidate_never_published() {
        let mut dec = decoder();
        let mut sink = MockMetricSink::new();
        dec.handle_frame(
            &frame(0x510, &[0x10, 0x49, 0x5C, 0x33, 0x00, 0x10, 0x1E, 0x00]),
            &mut sink,
        );
        assert!(sink.writes().is_empty());
    }

    // --- Odometer ---

    #[test]
    fn odometer_capture_example() {
        let mut dec = decoder();
        let mut sink = MockMetricSink::new();
        dec.handle_frame(
            &frame(0x540, &[0x00, 0x00, 0x00, 0x00, 0x90, 0xF0, 0x02, 0x00]),
            &mut sink,
        );
        assert_eq!(sink.float(Metric::Odometer), Some(19265.6));
        assert_eq!(
            sink.writes_to(Metric::Odometer)[0].unit,
            Some(Unit::Kilometers)
        );
    }

    #[test]
    fn odometer_change_gated() {
        let mut dec = decoder();
        let mut sink = MockMetricSink::new();
        let f = frame(0x540, &[0x00, 0x00, 0x00, 0x00, 0x90, 0xF0, 0x02, 0x00]);
        dec.handle_frame(&f, &mut sink);
        dec.handle_frame(&f, &mut sink);
        assert_eq!(sink.count(Metric::Odometer), 1);

        dec.handle_frame(
            &frame(0x540, &[0x00, 0x00, 0x00, 0x00, 0x91, 0xF0, 0x02, 0x00]),
            &mut sink,
        );
        assert_eq!(sink.count(Metric::Odometer), 2);
        assert_eq!(sink.float(Metric::Odometer), Some(19265.7));
    }

    #[test]
    fn odometer_compares_against_stored_value() {
        let mut dec = decoder();
        let mut sink = MockMetricSink::new();
        sink.preset(Metric::Odometer, 19265.6);
        dec.handle_frame(
            &frame(0x540, &[0x00, 0x00, 0x00, 0x00, 0x90, 0xF0, 0x02, 0x00]),
            &mut sink,
        );
        assert!(sink.writes().is_empty());
    }

    #[test]
    fn odometer_zero_rejected() {
        let mut dec = decoder();
        let mut sink = MockMetricSink::new();
        sink.preset(Metric::Odometer, 19265.6);
        dec.handle_frame(&frame(0x540, &[0x00; 8]), &mut sink);
        assert!(sink.writes().is_empty());
        assert_eq!(sink.get(Metric::Odometer), Some(MetricValue::Float(19265.6)));
    }
}
