//! Agent error types.

use thiserror::Error;

/// Errors raised by the agent runtime (never by the decoder itself).
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("ISO-TP reassembly error: {0}")]
    IsoTp(String),

    #[error("{0}")]
    Other(String),
}

/// Convenience alias for agent results.
pub type AgentResult<T> = Result<T, AgentError>;
