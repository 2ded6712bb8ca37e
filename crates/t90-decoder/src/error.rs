//! Decode rejection types.
//!
//! Rejections never leave the decoder: the dispatcher logs them and the
//! target metric keeps its last good value.

use thiserror::Error;

use crate::types::SignalId;

/// Why a frame or poll reply produced no metric update.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("no decode rule for {0}")]
    UnknownId(SignalId),

    #[error("frame from bus {bus} ignored (vehicle bus is {expected})")]
    ForeignBus { bus: u8, expected: u8 },

    #[error("payload too short: need {need} bytes, got {got}")]
    TooShort { need: usize, got: usize },

    #[error("value {value} out of range (raw=0x{raw:04X})")]
    OutOfRange { raw: u32, value: f64 },

    #[error("known bogus pattern raw=0x{raw:04X}")]
    BogusPattern { raw: u32 },

    #[error("default raw=0x{raw:04X} reported while vehicle is off")]
    DefaultWhileOff { raw: u32 },

    #[error("unrecognised value 0x{raw:02X}")]
    UnknownValue { raw: u32 },

    #[error("text field contains non-ASCII bytes")]
    NonAscii,

    #[error("value unchanged")]
    Unchanged,
}

impl Rejection {
    /// Decoded fine, but the value is not plausible.
    pub fn is_implausible(&self) -> bool {
        matches!(
            self,
            Self::OutOfRange { .. }
                | Self::BogusPattern { .. }
                | Self::DefaultWhileOff { .. }
                | Self::NonAscii
        )
    }
}

/// Convenience alias for decode results.
pub type DecodeResult<T> = Result<T, Rejection>;
