use serde::{Deserialize, Serialize};

/// Poll-rate regime requested from the external polling scheduler.
///
/// The numeric index selects the per-state interval column of the poll list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollState {
    /// Vehicle off: only READY is polled.
    #[default]
    Off,
    /// Vehicle on / driving.
    On,
    /// Reserved; never entered by the current decoder.
    Charging,
}

impl PollState {
    pub fn index(&self) -> usize {
        match self {
            Self::Off => 0,
            Self::On => 1,
            Self::Charging => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::On => "on",
            Self::Charging => "charging",
        }
    }
}

impl std::fmt::Display for PollState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
