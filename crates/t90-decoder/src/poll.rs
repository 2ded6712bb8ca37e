//! Poll list, request builder, and the poll-rate state machine.
//!
//! READY is polled in every state so a wake-up is noticed; everything else
//! is only polled while the vehicle is on, so a parked car is not kept awake.

use t90_protocol::PollState;

use crate::registry::PollPid;
use crate::types::{
    CanFrame, POLL_REQUEST_ID, POLL_RESPONSE_ID, SERVICE_READ_DATA_BY_ID, VEHICLE_BUS,
};

// ---------------------------------------------------------------------------
// Poll list
// ---------------------------------------------------------------------------

/// One polled extended PID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollEntry {
    pub pid: PollPid,
    pub request_id: u32,
    pub response_id: u32,
    /// Poll interval in seconds per state `[off, on, charging]`; 0 = not polled.
    pub intervals: [u16; 3],
}

impl PollEntry {
    const fn new(pid: PollPid, intervals: [u16; 3]) -> Self {
        Self {
            pid,
            request_id: POLL_REQUEST_ID,
            response_id: POLL_RESPONSE_ID,
            intervals,
        }
    }

    pub fn interval(&self, state: PollState) -> u16 {
        self.intervals[state.index()]
    }

    /// Whether the PID is due `tick_secs` whole seconds after `state` was
    /// entered. Callers pass elapsed time, not an absolute timestamp.
    pub fn is_due(&self, state: PollState, tick_secs: u64) -> bool {
        match self.interval(state) {
            0 => false,
            n => tick_secs % u64::from(n) == 0,
        }
    }
}

pub static POLL_LIST: [PollEntry; 7] = [
    PollEntry::new(PollPid::Vin, [0, 3600, 3600]),
    PollEntry::new(PollPid::Soc, [0, 10, 10]),
    PollEntry::new(PollPid::Soh, [0, 1800, 1800]),
    PollEntry::new(PollPid::Ready, [5, 10, 10]),
    PollEntry::new(PollPid::PlugPresent, [0, 10, 10]),
    PollEntry::new(PollPid::HvacTemp, [0, 30, 30]),
    PollEntry::new(PollPid::AmbientTemp, [0, 30, 30]),
];

/// PIDs due `tick_secs` seconds after entering `state`.
pub fn due(state: PollState, tick_secs: u64) -> impl Iterator<Item = &'static PollEntry> {
    POLL_LIST
        .iter()
        .filter(move |e| e.is_due(state, tick_secs))
}

// ---------------------------------------------------------------------------
// Request builder
// ---------------------------------------------------------------------------

/// Build the single-frame read-data-by-identifier request for a PID.
pub fn build_poll_request(pid: u16) -> CanFrame {
    let [hi, lo] = pid.to_be_bytes();
    CanFrame::new(
        VEHICLE_BUS,
        POLL_REQUEST_ID,
        vec![0x03, SERVICE_READ_DATA_BY_ID, hi, lo, 0x00, 0x00, 0x00, 0x00],
    )
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Poll-rate state, driven only by the READY flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollStateMachine {
    state: PollState,
}

impl PollStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    /// Feed an accepted READY decode. Returns the new state on a transition.
    ///
    /// ON only reverts to OFF via READY = false; CHARGING is never entered.
    pub fn on_ready(&mut self, ready: bool) -> Option<PollState> {
        let next = match (ready, self.state) {
            (false, PollState::Off) => return None,
            (false, _) => PollState::Off,
            (true, PollState::Off) => PollState::On,
            (true, _) => return None,
        };
        self.state = next;
        Some(next)
    }
}
