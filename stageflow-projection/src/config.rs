//! Configuration for the projection engine and its controller.

use crate::core::StageId;
use crate::errors::ProjectionError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// How a progress value lower than the stored one is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProgressPolicy {
    /// The latest reported value replaces the stored one.
    #[default]
    LastWriteWins,
    /// Regressions are ignored while a stage is active.
    Monotonic,
}

/// Output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionConfig {
    /// Interval of the progress ticker in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Largest progress increment a single tick may add.
    #[serde(default = "default_tick_max_increment")]
    pub tick_max_increment: u8,
    /// Message id prefix marking messages that must not be displayed.
    #[serde(default = "default_do_not_render_prefix")]
    pub do_not_render_prefix: String,
    /// Policy for decreasing progress values.
    #[serde(default)]
    pub progress_policy: ProgressPolicy,
    /// Default `tracing` filter directive.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// Log output format.
    #[serde(default)]
    pub log_format: LogFormat,
    /// Delay between simulated progress steps in milliseconds.
    #[serde(default = "default_demo_step_delay_ms")]
    pub demo_step_delay_ms: u64,
    /// Delay between simulated stages in milliseconds.
    #[serde(default = "default_demo_stage_delay_ms")]
    pub demo_stage_delay_ms: u64,
    /// Extra agent-to-stage mappings.
    #[serde(default)]
    pub agent_overrides: HashMap<String, StageId>,
}

fn default_tick_interval_ms() -> u64 {
    1500
}

fn default_tick_max_increment() -> u8 {
    5
}

fn default_do_not_render_prefix() -> String {
    "do-not-render-".to_string()
}

fn default_log_filter() -> String {
    "info".to_string()
}

fn default_demo_step_delay_ms() -> u64 {
    200
}

fn default_demo_stage_delay_ms() -> u64 {
    2000
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            tick_max_increment: default_tick_max_increment(),
            do_not_render_prefix: default_do_not_render_prefix(),
            progress_policy: ProgressPolicy::default(),
            log_filter: default_log_filter(),
            log_format: LogFormat::default(),
            demo_step_delay_ms: default_demo_step_delay_ms(),
            demo_stage_delay_ms: default_demo_stage_delay_ms(),
            agent_overrides: HashMap::new(),
        }
    }
}

impl ProjectionConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates a JSON document.
    pub fn from_json_str(raw: &str) -> Result<Self, ProjectionError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ProjectionError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ProjectionError> {
        if self.tick_interval_ms == 0 {
            return Err(ProjectionError::Config(
                "tick_interval_ms must be greater than zero".into(),
            ));
        }
        if self.tick_max_increment == 0 || self.tick_max_increment > 100 {
            return Err(ProjectionError::Config(format!(
                "tick_max_increment must be within 1..=100, got {}",
                self.tick_max_increment
            )));
        }
        Ok(())
    }

    /// Sets the ticker interval.
    #[must_use]
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Sets the progress policy.
    #[must_use]
    pub fn with_progress_policy(mut self, policy: ProgressPolicy) -> Self {
        self.progress_policy = policy;
        self
    }

    /// Sets the demo playback delays.
    #[must_use]
    pub fn with_demo_delays(mut self, step: Duration, stage: Duration) -> Self {
        self.demo_step_delay_ms = u64::try_from(step.as_millis()).unwrap_or(u64::MAX);
        self.demo_stage_delay_ms = u64::try_from(stage.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Adds an agent-to-stage mapping.
    #[must_use]
    pub fn with_agent_override(mut self, agent: impl Into<String>, stage: StageId) -> Self {
        self.agent_overrides.insert(agent.into(), stage);
        self
    }

    /// Ticker interval as a `Duration`.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Demo step delay as a `Duration`.
    #[must_use]
    pub fn demo_step_delay(&self) -> Duration {
        Duration::from_millis(self.demo_step_delay_ms)
    }

    /// Demo stage delay as a `Duration`.
    #[must_use]
    pub fn demo_stage_delay(&self) -> Duration {
        Duration::from_millis(self.demo_stage_delay_ms)
    }
}
