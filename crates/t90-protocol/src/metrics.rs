use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Named metrics written by the vehicle decoder.
///
/// Standard metrics use the `v.*` namespace shared with other vehicles;
/// T90-specific channels live under `xmt.*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Metric {
    #[serde(rename = "v.b.soc")]
    BatterySoc,
    #[serde(rename = "v.b.soh")]
    BatterySoh,
    /// Usable capacity after SOH derating.
    #[serde(rename = "v.b.capacity")]
    BatteryCapacity,
    #[serde(rename = "v.p.odometer")]
    Odometer,
    /// Vehicle READY / on.
    #[serde(rename = "v.e.on")]
    EnvOn,
    #[serde(rename = "v.e.locked")]
    EnvLocked,
    #[serde(rename = "v.e.handbrake")]
    EnvHandbrake,
    #[serde(rename = "v.e.temp")]
    AmbientTemp,
    #[serde(rename = "v.c.pilot")]
    ChargePilot,
    #[serde(rename = "v.c.voltage")]
    ChargeVoltage,
    #[serde(rename = "v.c.current")]
    ChargeCurrent,
    #[serde(rename = "v.c.power")]
    ChargePower,
    #[serde(rename = "v.vin")]
    Vin,
    /// HVAC / coolant loop temperature (custom channel).
    #[serde(rename = "xmt.v.hvac.temp")]
    HvacTemp,
    /// Nominal pack capacity before SOH (custom channel).
    #[serde(rename = "xmt.b.capacity")]
    NominalCapacity,
}

impl Metric {
    pub const ALL: [Metric; 15] = [
        Self::BatterySoc,
        Self::BatterySoh,
        Self::BatteryCapacity,
        Self::Odometer,
        Self::EnvOn,
        Self::EnvLocked,
        Self::EnvHandbrake,
        Self::AmbientTemp,
        Self::ChargePilot,
        Self::ChargeVoltage,
        Self::ChargeCurrent,
        Self::ChargePower,
        Self::Vin,
        Self::HvacTemp,
        Self::NominalCapacity,
    ];

    /// Dotted metric name as seen by downstream consumers.
    pub fn name(&self) -> &'static str {
        match self {
            Self::BatterySoc => "v.b.soc",
            Self::BatterySoh => "v.b.soh",
            Self::BatteryCapacity => "v.b.capacity",
            Self::Odometer => "v.p.odometer",
            Self::EnvOn => "v.e.on",
            Self::EnvLocked => "v.e.locked",
            Self::EnvHandbrake => "v.e.handbrake",
            Self::AmbientTemp => "v.e.temp",
            Self::ChargePilot => "v.c.pilot",
            Self::ChargeVoltage => "v.c.voltage",
            Self::ChargeCurrent => "v.c.current",
            Self::ChargePower => "v.c.power",
            Self::Vin => "v.vin",
            Self::HvacTemp => "xmt.v.hvac.temp",
            Self::NominalCapacity => "xmt.b.capacity",
        }
    }

    /// Unit the metric is published in, if it carries one.
    pub fn unit(&self) -> Option<Unit> {
        match self {
            Self::BatterySoc | Self::BatterySoh => Some(Unit::Percent),
            Self::BatteryCapacity | Self::NominalCapacity => Some(Unit::KiloWattHours),
            Self::Odometer => Some(Unit::Kilometers),
            Self::AmbientTemp | Self::HvacTemp => Some(Unit::Celsius),
            Self::ChargeVoltage => Some(Unit::Volts),
            Self::ChargeCurrent => Some(Unit::Amps),
            Self::ChargePower => Some(Unit::KiloWatts),
            Self::EnvOn
            | Self::EnvLocked
            | Self::EnvHandbrake
            | Self::ChargePilot
            | Self::Vin => None,
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Unit of measurement attached to a metric write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Percent,
    KiloWattHours,
    Kilometers,
    Celsius,
    Volts,
    Amps,
    KiloWatts,
}

impl Unit {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Percent => "%",
            Self::KiloWattHours => "kWh",
            Self::Kilometers => "km",
            Self::Celsius => "°C",
            Self::Volts => "V",
            Self::Amps => "A",
            Self::KiloWatts => "kW",
        }
    }
}

/// A metric value: numeric, boolean or text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Bool(bool),
    Float(f64),
    Text(String),
}

impl MetricValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for MetricValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<String> for MetricValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl std::fmt::Display for MetricValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// A single metric update, as emitted to downstream consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricWrite {
    /// When the update was recorded.
    pub time: DateTime<Utc>,
    /// Metric that changed.
    pub metric: Metric,
    /// New value.
    pub value: MetricValue,
    /// Unit of measurement (if applicable).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<Unit>,
}
