//! Decode registry: which identifiers the decoder understands.
//!
//! Each native CAN message and extended PID maps to exactly one rule.
//! Unknown identifiers map to `None` and are ignored by the dispatcher.

use t90_protocol::Metric;

use crate::types::SignalId;

// ── Native CAN messages ─────────────────────────────────────────

/// Native CAN messages decoded from the vehicle bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanSignal {
    /// 0x266: byte 2 bit 0 = parking brake applied.
    Handbrake,
    /// 0x281 (BCM): byte 1 = 0xA9 locked / 0xA8 unlocked.
    LockState,
    /// 0x362: bytes 0–1 BE, V × 100.
    AcVoltage,
    /// 0x373: bytes 0–1 BE, empirical A × 164.
    AcCurrent,
    /// 0x510: byte 3, suspected gear selector. Logged only.
    GearCandidate,
    /// 0x540: bytes 4–6 LE, km × 10.
    Odometer,
}

impl CanSignal {
    pub const ALL: [CanSignal; 6] = [
        Self::Handbrake,
        Self::LockState,
        Self::AcVoltage,
        Self::AcCurrent,
        Self::GearCandidate,
        Self::Odometer,
    ];

    pub fn from_id(id: u32) -> Option<Self> {
        match id {
            0x266 => Some(Self::Handbrake),
            0x281 => Some(Self::LockState),
            0x362 => Some(Self::AcVoltage),
            0x373 => Some(Self::AcCurrent),
            0x510 => Some(Self::GearCandidate),
            0x540 => Some(Self::Odometer),
            _ => None,
        }
    }

    pub fn id(&self) -> u32 {
        match self {
            Self::Handbrake => 0x266,
            Self::LockState => 0x281,
            Self::AcVoltage => 0x362,
            Self::AcCurrent => 0x373,
            Self::GearCandidate => 0x510,
            Self::Odometer => 0x540,
        }
    }

    /// Shortest payload covering every byte the rule reads.
    pub fn min_len(&self) -> usize {
        match self {
            Self::Handbrake => 3,
            Self::LockState => 2,
            Self::AcVoltage | Self::AcCurrent => 2,
            Self::GearCandidate => 4,
            Self::Odometer => 7,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Handbrake => "handbrake",
            Self::LockState => "lock_state",
            Self::AcVoltage => "ac_voltage",
            Self::AcCurrent => "ac_current",
            Self::GearCandidate => "gear_candidate",
            Self::Odometer => "odometer",
        }
    }

    /// Metric the rule writes, if any.
    pub fn metric(&self) -> Option<Metric> {
        match self {
            Self::Handbrake => Some(Metric::EnvHandbrake),
            Self::LockState => Some(Metric::EnvLocked),
            Self::AcVoltage => Some(Metric::ChargeVoltage),
            Self::AcCurrent => Some(Metric::ChargeCurrent),
            Self::GearCandidate => None,
            Self::Odometer => Some(Metric::Odometer),
        }
    }

    /// Publish only when the decoded value differs from the stored metric.
    pub fn change_gated(&self) -> bool {
        matches!(self, Self::Odometer)
    }
}

// ── Extended OBD-II PIDs ────────────────────────────────────────

/// Extended PIDs polled from the vehicle ECU (0x7E3 → 0x7EB).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PollPid {
    Vin,
    Soc,
    Soh,
    Ready,
    PlugPresent,
    HvacTemp,
    AmbientTemp,
}

impl PollPid {
    pub const ALL: [PollPid; 7] = [
        Self::Vin,
        Self::Soc,
        Self::Soh,
        Self::Ready,
        Self::PlugPresent,
        Self::HvacTemp,
        Self::AmbientTemp,
    ];

    pub fn from_pid(pid: u16) -> Option<Self> {
        match pid {
            0xF190 => Some(Self::Vin),
            0xE002 => Some(Self::Soc),
            0xE003 => Some(Self::Soh),
            0xE004 => Some(Self::Ready),
            0xE009 => Some(Self::PlugPresent),
            0xE010 => Some(Self::HvacTemp),
            0xE025 => Some(Self::AmbientTemp),
            _ => None,
        }
    }

    pub fn pid(&self) -> u16 {
        match self {
            Self::Vin => 0xF190,
            Self::Soc => 0xE002,
            Self::Soh => 0xE003,
            Self::Ready => 0xE004,
            Self::PlugPresent => 0xE009,
            Self::HvacTemp => 0xE010,
            Self::AmbientTemp => 0xE025,
        }
    }

    pub fn min_len(&self) -> usize {
        match self {
            Self::Vin | Self::Soc => 1,
            Self::Soh | Self::Ready | Self::PlugPresent | Self::HvacTemp | Self::AmbientTemp => 2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Vin => "vin",
            Self::Soc => "soc",
            Self::Soh => "soh",
            Self::Ready => "ready",
            Self::PlugPresent => "plug_present",
            Self::HvacTemp => "hvac_temp",
            Self::AmbientTemp => "ambient_temp",
        }
    }

    pub fn metric(&self) -> Metric {
        match self {
            Self::Vin => Metric::Vin,
            Self::Soc => Metric::BatterySoc,
            Self::Soh => Metric::BatterySoh,
            Self::Ready => Metric::EnvOn,
            Self::PlugPresent => Metric::ChargePilot,
            Self::HvacTemp => Metric::HvacTemp,
            Self::AmbientTemp => Metric::AmbientTemp,
        }
    }

    pub fn change_gated(&self) -> bool {
        matches!(self, Self::Soc | Self::Soh)
    }
}

// ── Lookup ──────────────────────────────────────────────────────

/// A matched decode rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Can(CanSignal),
    Poll(PollPid),
}

/// Select the decode rule for an identifier.
pub fn lookup(id: SignalId) -> Option<Rule> {
    match id {
        SignalId::Can(id) => CanSignal::from_id(id).map(Rule::Can),
        SignalId::Pid(pid) => PollPid::from_pid(pid).map(Rule::Poll),
    }
}
