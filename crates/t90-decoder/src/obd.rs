//! Extended OBD-II poll-reply decoders (VIN, SOC, SOH, READY, plug, temps).
//!
//! Replies arrive already reassembled, with the response SID and PID echo
//! stripped.

use t90_protocol::{Metric, MetricValue, PollState};

use crate::bytes::{field, u16_be};
use crate::decoder::Maxt90Decoder;
use crate::error::{DecodeResult, Rejection};
use crate::filters::{self, TempFilter};
use crate::registry::PollPid;
use crate::sink::MetricSink;
use crate::types::{DecodedSignal, SignalId};

impl Maxt90Decoder {
    /// Decode a reply whose PID and length have already been checked.
    ///
    /// The target metric and change gating come from the registry entry.
    pub(crate) fn decode_poll(
        &mut self,
        pid: PollPid,
        data: &[u8],
        sink: &mut dyn MetricSink,
    ) -> DecodeResult<Option<PollState>> {
        let source = SignalId::Pid(pid.pid());
        let metric = pid.metric();
        let mut transition = None;
        let mut usable_kwh = None;

        let value: MetricValue = match pid {
            PollPid::Vin => {
                // Copied byte for byte, padding included.
                if !data.is_ascii() {
                    return Err(Rejection::NonAscii);
                }
                let vin: String = data.iter().map(|&b| char::from(b)).collect();
                tracing::debug!(vin = %vin.escape_debug(), "VIN");
                vin.into()
            }
            PollPid::Soc => {
                let [raw] = field(data, 0)?;
                let soc = filters::soc(raw)?;
                tracing::trace!(soc, "SOC");
                soc.into()
            }
            PollPid::Soh => {
                let raw = u16_be(field(data, 0)?);
                let soh = filters::soh(raw)?;
                let usable = self.capacity.usable_kwh(soh);
                tracing::trace!(
                    soh,
                    usable_kwh = usable,
                    nominal_kwh = self.capacity.nominal_kwh(),
                    "SOH"
                );
                usable_kwh = Some(usable);
                soh.into()
            }
            PollPid::Ready => {
                let raw = u16_be(field(data, 0)?);
                let ready = filters::ready(raw);
                if ready != sink.flag(metric) {
                    tracing::info!(raw = format_args!("0x{raw:04X}"), ready, "READY flag changed");
                }
                transition = self.poll.on_ready(ready);
                if let Some(state) = transition {
                    tracing::info!(state = %state, "vehicle {}, setting poll state", if ready { "on" } else { "off" });
                }
                ready.into()
            }
            PollPid::PlugPresent => {
                let raw = u16_be(field(data, 0)?);
                let present = filters::plug_present(raw);
                tracing::debug!(raw = format_args!("0x{raw:04X}"), present, "plug present");
                present.into()
            }
            PollPid::HvacTemp => {
                let raw = u16_be(field(data, 0)?);
                let t = TempFilter::HVAC.apply(raw, sink.flag(Metric::EnvOn))?;
                tracing::debug!(celsius = t, "HVAC/coolant temperature");
                t.into()
            }
            PollPid::AmbientTemp => {
                let raw = u16_be(field(data, 0)?);
                let t = TempFilter::AMBIENT.apply(raw, sink.flag(Metric::EnvOn))?;
                tracing::debug!(celsius = t, "ambient temperature");
                t.into()
            }
        };

        if pid.change_gated() {
            if sink.get(metric).as_ref() == Some(&value) {
                return Err(Rejection::Unchanged);
            }
            tracing::debug!(metric = %metric, value = %value, "{} changed", pid.name());
        }
        DecodedSignal::new(source, metric, value).publish(sink);
        if let Some(kwh) = usable_kwh {
            DecodedSignal::new(source, Metric::BatteryCapacity, kwh).publish(sink);
        }
        Ok(transition)
    }
}
