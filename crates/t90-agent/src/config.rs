//! Agent configuration, loadable from TOML.

use serde::Deserialize;
use t90_decoder::DecoderConfig;

use crate::error::{AgentError, AgentResult};

/// Top-level configuration for the agent.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Vehicle decoder settings (bus, nominal capacity).
    #[serde(default)]
    pub vehicle: DecoderConfig,
    /// Where frames come from.
    pub source: SourceConfig,
    /// Where metric updates go.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Candump capture to replay.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Path to a `candump -l` style log.
    pub candump_path: String,
    /// Interface name in the capture that carries the vehicle bus.
    #[serde(default = "default_interface")]
    pub interface: String,
    /// Honour capture timestamps instead of replaying as fast as possible.
    #[serde(default)]
    pub realtime: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Emit logs as JSON lines.
    #[serde(default)]
    pub json_logs: bool,
    /// File to append metric updates to; stdout when absent.
    #[serde(default)]
    pub metrics_path: Option<String>,
}

fn default_interface() -> String {
    "can0".to_string()
}

impl AgentConfig {
    /// Load config from a TOML file path.
    pub fn from_file(path: &str) -> AgentResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> AgentResult<Self> {
        let config: Self =
            toml::from_str(contents).map_err(|e| AgentError::Config(e.to_string()))?;
        if config.vehicle.nominal_capacity_kwh <= 0.0 {
            return Err(AgentError::Config(format!(
                "vehicle.nominal_capacity_kwh must be positive, got {}",
                config.vehicle.nominal_capacity_kwh
            )));
        }
        Ok(config)
    }
}
