//! Per-signal scaling and plausibility checks.
//!
//! Every function takes the raw integer as read from the payload and returns
//! the scaled physical value, or the reason it is not believable. Sleeping
//! or faulted ECUs answer with fixed default patterns, so range checks alone
//! are not enough for several signals.

use crate::error::{DecodeResult, Rejection};

// ── Native CAN signals ──────────────────────────────────────────

/// Single-phase mains window (UK / EU).
pub const AC_VOLTAGE_MIN: f64 = 150.0;
pub const AC_VOLTAGE_MAX: f64 = 280.0;

/// Typical single-phase EVSE currents.
pub const AC_CURRENT_MIN: f64 = 0.1;
pub const AC_CURRENT_MAX: f64 = 40.0;

/// Empirical: raw 2388 at ≈3.28 kW / 226.1 V, one LSB ≈ 6 mA.
pub const AC_CURRENT_DIVISOR: f64 = 164.0;

pub const ODOMETER_MAX_KM: f64 = 1_000_000.0;

pub const LOCK_BYTE_LOCKED: u8 = 0xA9;
pub const LOCK_BYTE_UNLOCKED: u8 = 0xA8;

/// AC line voltage, V × 100.
pub fn ac_voltage(raw: u16) -> DecodeResult<f64> {
    let v = f64::from(raw) / 100.0;
    if (AC_VOLTAGE_MIN..=AC_VOLTAGE_MAX).contains(&v) {
        Ok(v)
    } else {
        Err(Rejection::OutOfRange {
            raw: raw.into(),
            value: v,
        })
    }
}

/// AC line current, A × 164.
pub fn ac_current(raw: u16) -> DecodeResult<f64> {
    let a = f64::from(raw) / AC_CURRENT_DIVISOR;
    if (AC_CURRENT_MIN..=AC_CURRENT_MAX).contains(&a) {
        Ok(a)
    } else {
        Err(Rejection::OutOfRange {
            raw: raw.into(),
            value: a,
        })
    }
}

/// Odometer, km × 10. Zero is what the cluster sends before it has a value.
pub fn odometer(raw: u32) -> DecodeResult<f64> {
    let km = f64::from(raw) / 10.0;
    if km > 0.0 && km < ODOMETER_MAX_KM {
        Ok(km)
    } else {
        Err(Rejection::OutOfRange { raw, value: km })
    }
}

/// Lock byte: `true` = locked.
pub fn lock_state(byte: u8) -> DecodeResult<bool> {
    match byte {
        LOCK_BYTE_LOCKED => Ok(true),
        LOCK_BYTE_UNLOCKED => Ok(false),
        other => Err(Rejection::UnknownValue { raw: other.into() }),
    }
}

pub fn handbrake(byte: u8) -> bool {
    byte & 0x01 != 0
}

// ── Extended PIDs ───────────────────────────────────────────────

/// Timeout / error pattern for 16-bit PIDs.
pub const RAW_ERROR: u16 = 0xFFFF;

/// SOH placeholder (≈61.44 %) seen before the BMS has a real estimate.
pub const SOH_PLACEHOLDER: u16 = 0x1800;

/// Default pattern returned by the temperature PIDs.
pub const TEMP_DEFAULT: u16 = 0x0200;

/// State of charge, percent. Zero means the car is off or the poll timed out.
pub fn soc(raw: u8) -> DecodeResult<f64> {
    let soc = f64::from(raw);
    if soc > 0.0 && soc <= 100.0 {
        Ok(soc)
    } else {
        Err(Rejection::OutOfRange {
            raw: raw.into(),
            value: soc,
        })
    }
}

/// State of health, % × 100.
pub fn soh(raw: u16) -> DecodeResult<f64> {
    if raw == RAW_ERROR || raw == SOH_PLACEHOLDER {
        return Err(Rejection::BogusPattern { raw: raw.into() });
    }
    let soh = f64::from(raw) / 100.0;
    if soh <= 50.0 || soh > 150.0 {
        return Err(Rejection::OutOfRange {
            raw: raw.into(),
            value: soh,
        });
    }
    Ok(soh)
}

/// READY bitfield: bit 2 or bit 3 set.
pub fn ready(raw: u16) -> bool {
    raw & 0x000C != 0
}

/// Plug bitfield: low byte clear means a plug is present.
pub fn plug_present(raw: u16) -> bool {
    raw & 0x00FF == 0x00
}

/// Plausibility rule for a 0.1 °C temperature PID.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempFilter {
    /// Raw value the ECU reports while the vehicle is off.
    pub off_default: u16,
    pub min_c: f64,
    pub max_c: f64,
}

impl TempFilter {
    /// HVAC / coolant loop: 45.8 °C while off.
    pub const HVAC: TempFilter = TempFilter {
        off_default: 458,
        min_c: -40.0,
        max_c: 125.0,
    };

    /// Ambient: 7.5 °C while off.
    pub const AMBIENT: TempFilter = TempFilter {
        off_default: 75,
        min_c: -50.0,
        max_c: 80.0,
    };

    pub fn apply(&self, raw: u16, ready: bool) -> DecodeResult<f64> {
        if !ready && raw == self.off_default {
            return Err(Rejection::DefaultWhileOff { raw: raw.into() });
        }
        if raw == TEMP_DEFAULT || raw == RAW_ERROR {
            return Err(Rejection::BogusPattern { raw: raw.into() });
        }
        let t = f64::from(raw) / 10.0;
        if t < self.min_c || t > self.max_c {
            return Err(Rejection::OutOfRange {
                raw: raw.into(),
                value: t,
            });
        }
        Ok(t)
    }
}
