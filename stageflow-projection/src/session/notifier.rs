use crate::utils::iso_timestamp;
use serde::Serialize;
use tracing::warn;

/// A stream error worth surfacing to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorNotice {
    /// The error message.
    pub message: String,
    /// When the notice was raised, ISO 8601.
    pub raised_at: String,
}

/// Raises each distinct stream error once.
///
/// A repeated message is suppressed until the error clears.
#[derive(Debug, Clone, Default)]
pub struct ErrorNotifier {
    last: Option<String>,
}

impl ErrorNotifier {
    /// Creates a notifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds the transport's current error value.
    pub fn observe(&mut self, error: Option<&str>) -> Option<ErrorNotice> {
        let Some(message) = error else {
            self.last = None;
            return None;
        };
        if message.is_empty() || self.last.as_deref() == Some(message) {
            return None;
        }

        warn!(error = %message, "Stream error");
        self.last = Some(message.to_string());
        Some(ErrorNotice {
            message: message.to_string(),
            raised_at: iso_timestamp(),
        })
    }
}
