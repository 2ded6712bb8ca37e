//! The T90 vehicle decoder: cached line state plus dispatch.
//!
//! One instance per vehicle. All state that survives between frames lives
//! here; callers serialise access (one frame or reply at a time).

use serde::Deserialize;
use t90_protocol::{Metric, PollState};

use crate::derived::{AcLine, Capacity, NOMINAL_CAPACITY_KWH};
use crate::error::Rejection;
use crate::poll::PollStateMachine;
use crate::registry::{self, Rule};
use crate::sink::MetricSink;
use crate::types::{CanFrame, PollReply, SignalId, VEHICLE_BUS};

/// Per-vehicle decoder settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DecoderConfig {
    /// Bus the native frames arrive on; frames from other buses are ignored.
    #[serde(default = "default_bus")]
    pub bus: u8,
    /// Nominal pack capacity before SOH derating.
    #[serde(default = "default_nominal_capacity")]
    pub nominal_capacity_kwh: f64,
}

fn default_bus() -> u8 {
    VEHICLE_BUS
}

fn default_nominal_capacity() -> f64 {
    NOMINAL_CAPACITY_KWH
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            bus: default_bus(),
            nominal_capacity_kwh: default_nominal_capacity(),
        }
    }
}

/// Maxus T90 EV decoder.
#[derive(Debug)]
pub struct Maxt90Decoder {
    pub(crate) bus: u8,
    pub(crate) ac_line: AcLine,
    pub(crate) capacity: Capacity,
    pub(crate) poll: PollStateMachine,
    /// Last valid lock byte seen on 0x281.
    pub(crate) last_lock_byte: Option<u8>,
}

impl Maxt90Decoder {
    pub fn new(config: &DecoderConfig) -> Self {
        tracing::info!(
            bus = config.bus,
            nominal_capacity_kwh = config.nominal_capacity_kwh,
            "initialising Maxus T90 EV decoder"
        );
        Self {
            bus: config.bus,
            ac_line: AcLine::new(),
            capacity: Capacity::new(config.nominal_capacity_kwh),
            poll: PollStateMachine::new(),
            last_lock_byte: None,
        }
    }

    /// Publish the nominal capacity and seed usable capacity with it,
    /// so consumers see a battery size before the first SOH reply.
    pub fn init_metrics(&self, sink: &mut dyn MetricSink) {
        let nominal = self.capacity.nominal_kwh();
        for metric in [Metric::NominalCapacity, Metric::BatteryCapacity] {
            sink.set(metric, nominal.into(), metric.unit());
        }
    }

    pub fn bus(&self) -> u8 {
        self.bus
    }

    pub fn poll_state(&self) -> PollState {
        self.poll.state()
    }

    pub fn ac_line(&self) -> &AcLine {
        &self.ac_line
    }

    pub fn capacity(&self) -> &Capacity {
        &self.capacity
    }

    /// Decode a native CAN frame. Never fails; rejected frames are logged.
    pub fn handle_frame(&mut self, frame: &CanFrame, sink: &mut dyn MetricSink) {
        let id = SignalId::Can(frame.id);
        if let Err(rejection) = self.try_frame(frame, sink) {
            log_rejection(id, &rejection);
        }
    }

    /// Decode a poll reply. Returns the requested poll state on a transition.
    pub fn handle_poll_reply(
        &mut self,
        reply: &PollReply,
        sink: &mut dyn MetricSink,
    ) -> Option<PollState> {
        let id = SignalId::Pid(reply.pid);
        match self.try_poll_reply(reply, sink) {
            Ok(transition) => transition,
            Err(rejection) => {
                log_rejection(id, &rejection);
                None
            }
        }
    }

    fn try_frame(&mut self, frame: &CanFrame, sink: &mut dyn MetricSink) -> Result<(), Rejection> {
        if frame.bus != self.bus {
            return Err(Rejection::ForeignBus {
                bus: frame.bus,
                expected: self.bus,
            });
        }
        let id = SignalId::Can(frame.id);
        let Some(Rule::Can(signal)) = registry::lookup(id) else {
            return Err(Rejection::UnknownId(id));
        };
        check_len(signal.min_len(), &frame.data)?;
        self.decode_can(signal, &frame.data, sink)
    }

    fn try_poll_reply(
        &mut self,
        reply: &PollReply,
        sink: &mut dyn MetricSink,
    ) -> Result<Option<PollState>, Rejection> {
        let id = SignalId::Pid(reply.pid);
        let Some(Rule::Poll(pid)) = registry::lookup(id) else {
            return Err(Rejection::UnknownId(id));
        };
        check_len(pid.min_len(), &reply.data)?;
        self.decode_poll(pid, &reply.data, sink)
    }
}

fn check_len(need: usize, data: &[u8]) -> Result<(), Rejection> {
    if data.len() < need {
        return Err(Rejection::TooShort {
            need,
            got: data.len(),
        });
    }
    Ok(())
}

/// Native frames arrive many times a second, so their implausible values
/// stay at trace level; poll replies are rare enough to warn about.
fn log_rejection(id: SignalId, rejection: &Rejection) {
    match (id, rejection) {
        (SignalId::Pid(_), r) if r.is_implausible() => {
            tracing::warn!(source = %id, reason = %r, "poll reply ignored");
        }
        (SignalId::Can(0x540), r) if r.is_implausible() => {
            tracing::warn!(source = %id, reason = %r, "odometer ignored");
        }
        (_, Rejection::UnknownId(_) | Rejection::ForeignBus { .. } | Rejection::Unchanged) => {}
        (_, r) => {
            tracing::trace!(source = %id, reason = %r, "ignored");
        }
    }
}
