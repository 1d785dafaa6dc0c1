//! Error types shared by every windturbine crate.

use thiserror::Error;

/// Result alias used across the workspace.
pub type Result<T> = std::result::Result<T, WindTurbineError>;

#[derive(Debug, Error)]
pub enum WindTurbineError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// The watched file never appeared.
    #[error("Timed out after {waited_secs}s waiting for {path}")]
    Timeout { path: String, waited_secs: u64 },

    /// Input file is malformed or lacks a required key.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A published value could not be interpreted as the expected type.
    #[error("Type error: {0}")]
    Type(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Delivery error: {0}")]
    Delivery(String),

    /// The run context was read before a value was published, or written twice.
    #[error("Run context error: {0}")]
    Context(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WindTurbineError {
    /// Short machine-readable kind, used in run summaries and operator alerts.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Timeout { .. } => "timeout",
            Self::Parse(_) => "parse",
            Self::Type(_) => "type",
            Self::Storage(_) => "storage",
            Self::Delivery(_) => "delivery",
            Self::Context(_) => "context",
            Self::Io(_) => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_kind() {
        let err = WindTurbineError::Timeout {
            path: "/tmp/data.json".into(),
            waited_secs: 30,
        };
        assert_eq!(err.to_string(), "Timed out after 30s waiting for /tmp/data.json");
        assert_eq!(err.kind(), "timeout");

        let io: WindTurbineError = std::io::Error::other("disk gone").into();
        assert_eq!(io.kind(), "io");
    }
}
