//! Error types for rolling and configuration

use thiserror::Error;

/// Why a roll was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RollError {
    #[error("invalid dice expression: {0}")]
    InvalidExpression(String),

    #[error("unsupported die d{0} (expected one of d4, d6, d8, d10, d12, d20, d100)")]
    InvalidDie(u32),

    #[error("expression contains no dice")]
    NoDiceInExpression,

    #[error("dice engine is not ready")]
    EngineNotReady,

    #[error("dice engine was destroyed")]
    EngineDestroyed,

    #[error("physics fault: {0}")]
    PhysicsFault(String),

    #[error("roll was replaced by a newer roll")]
    Superseded,

    #[error("roll was cleared before it settled")]
    Cleared,
}

/// Problems loading or validating a [`TrayConfig`](super::TrayConfig)
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid RON config: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("unsupported config format `{0}` (expected .json or .ron)")]
    UnknownFormat(String),

    #[error("invalid color `{value}`: {reason}")]
    Color { value: String, reason: String },

    #[error("{field}: {reason}")]
    OutOfRange { field: &'static str, reason: String },
}
