//! Deterministic event script for exercising the projection without a
//! live backend.
//!
//! For every stage the simulator emits `progress` events at 0, 20, ...,
//! 100 followed by one `content_ready` event carrying the stage's
//! canonical payload, then moves to the next stage.

mod payloads;

use crate::cancellation::CancellationToken;
use crate::core::StageId;
use crate::events::{StageData, UiEvent};
use std::time::Duration;
use tracing::debug;

pub use payloads::canonical_payload;

/// Progress values reported for every stage, in order.
pub const PROGRESS_STEPS: [u8; 6] = [0, 20, 40, 60, 80, 100];

/// Script for one simulated stage.
#[derive(Debug, Clone)]
pub struct StageScript {
    /// The stage.
    pub stage: StageId,
    /// Agent identifier used on the emitted events.
    pub agent: &'static str,
    /// Payload attached to the `content_ready` event.
    pub payload: StageData,
}

impl StageScript {
    /// The standard script for a stage.
    #[must_use]
    pub fn canonical(stage: StageId) -> Self {
        Self {
            stage,
            agent: agent_for(stage),
            payload: canonical_payload(stage),
        }
    }

    /// Progress events followed by the `content_ready` event.
    #[must_use]
    pub fn events(&self) -> Vec<UiEvent> {
        let name = self.stage.display_name();
        let mut events: Vec<UiEvent> = PROGRESS_STEPS
            .iter()
            .map(|p| {
                UiEvent::new("progress")
                    .with_id(format!("demo-{}-progress-{p}", self.stage))
                    .with_agent(self.agent)
                    .with_content(&format!("Processing {name} stage... {p}% complete"))
                    .with_progress(*p)
            })
            .collect();
        events.push(
            UiEvent::new("content_ready")
                .with_id(format!("demo-{}-content-ready", self.stage))
                .with_agent(self.agent)
                .with_content(&format!("{name} stage completed successfully"))
                .with_stage_data(&self.payload),
        );
        events
    }
}

fn agent_for(stage: StageId) -> &'static str {
    match stage {
        StageId::StoryGeneration => "story_writer",
        StageId::DesignGeneration => "design_architect",
        StageId::CodeGeneration => "code_developer",
        StageId::Testing => "test_engineer",
        StageId::Deployment => "deployment_manager",
    }
}

/// Pacing for timed playback.
#[derive(Debug, Clone, Copy)]
pub struct PlaybackTiming {
    /// Delay before each event within a stage.
    pub step_delay: Duration,
    /// Delay between stages.
    pub stage_delay: Duration,
}

/// Produces the canonical event sequence.
#[derive(Debug, Clone)]
pub struct ProgressSimulator {
    scripts: Vec<StageScript>,
}

impl Default for ProgressSimulator {
    fn default() -> Self {
        Self::for_stages(&StageId::ALL)
    }
}

impl ProgressSimulator {
    /// Creates a simulator covering the whole pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a simulator covering `stages`, in the given order.
    #[must_use]
    pub fn for_stages(stages: &[StageId]) -> Self {
        Self {
            scripts: stages.iter().copied().map(StageScript::canonical).collect(),
        }
    }

    /// Per-stage scripts.
    #[must_use]
    pub fn scripts(&self) -> &[StageScript] {
        &self.scripts
    }

    /// The full event sequence. Identical on every call.
    #[must_use]
    pub fn events(&self) -> Vec<UiEvent> {
        self.scripts.iter().flat_map(StageScript::events).collect()
    }

    /// Feeds the sequence to `on_event` with the given pacing.
    ///
    /// Stops early when `cancel` fires or `on_event` returns `false`.
    /// Returns true if every event was delivered.
    pub async fn play<F>(
        &self,
        timing: PlaybackTiming,
        cancel: &CancellationToken,
        mut on_event: F,
    ) -> bool
    where
        F: FnMut(UiEvent) -> bool,
    {
        for (index, script) in self.scripts.iter().enumerate() {
            if index > 0 && !pause(timing.stage_delay, cancel).await {
                return false;
            }
            for event in script.events() {
                if !pause(timing.step_delay, cancel).await {
                    return false;
                }
                if !on_event(event) {
                    debug!(stage = %script.stage, "Playback receiver gone");
                    return false;
                }
            }
        }
        true
    }
}

async fn pause(delay: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        () = cancel.cancelled() => false,
        () = tokio::time::sleep(delay) => true,
    }
}
