//! Error types for the projection engine.
//!
//! Malformed input never surfaces as an error from the projection itself;
//! these are returned at the controller, transport and config boundaries,
//! and used internally to describe why an event was discarded.

use thiserror::Error;

/// The main error type for projection operations.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// The event lacks the fields needed to project it.
    #[error("Malformed event: {reason}")]
    MalformedEvent {
        /// What is missing or wrong.
        reason: String,
    },

    /// The event declares a kind the projection does not handle.
    #[error("Unrecognized event kind: {0}")]
    UnrecognizedEvent(String),

    /// A stage identifier outside the fixed pipeline.
    #[error("Unknown stage: {0}")]
    UnknownStage(String),

    /// The streaming collaborator failed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The controller task is no longer running.
    #[error("Workflow controller is closed")]
    ControllerClosed,

    /// A configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A workflow invariant does not hold.
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProjectionError {
    /// Creates a malformed event error.
    #[must_use]
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedEvent {
            reason: reason.into(),
        }
    }

    /// Creates a transport error.
    #[must_use]
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport(reason.into())
    }

    /// Returns true for errors caused by bad event input.
    ///
    /// These are discarded by the projection instead of propagated.
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedEvent { .. } | Self::UnrecognizedEvent(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ProjectionError::malformed("missing agent_name").to_string(),
            "Malformed event: missing agent_name"
        );
        assert_eq!(
            ProjectionError::UnknownStage("qa".into()).to_string(),
            "Unknown stage: qa"
        );
        assert_eq!(
            ProjectionError::transport("socket closed").to_string(),
            "Transport error: socket closed"
        );
    }

    #[test]
    fn test_input_errors() {
        assert!(ProjectionError::malformed("x").is_input_error());
        assert!(ProjectionError::UnrecognizedEvent("x".into()).is_input_error());
        assert!(!ProjectionError::ControllerClosed.is_input_error());
    }

    #[test]
    fn test_from_serde_error() {
        let err = serde_json::from_str::<u8>("nope").unwrap_err();
        let converted: ProjectionError = err.into();
        assert!(matches!(converted, ProjectionError::Serialization(_)));
    }
}
