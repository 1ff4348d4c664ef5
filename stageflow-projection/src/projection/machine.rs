//! The stage state machine.
//!
//! Every mutation of [`WorkflowData`] goes through here. One event is
//! applied at a time; after each application at most one stage is active
//! and `overall_progress` is recomputed.

use crate::config::{ProgressPolicy, ProjectionConfig};
use crate::core::{Stage, StageId, StageStatus, WorkflowData};
use crate::errors::ProjectionError;
use crate::events::{EventClassifier, EventKind, ProjectionNotice, UiEvent, WorkflowEvent};
use crate::projection::{AgentStageResolver, ProgressAggregator};
use crate::utils::{now_utc, Timestamp};
use tracing::{debug, error, warn};

/// Applies events to a [`WorkflowData`].
#[derive(Debug, Clone, Default)]
pub struct StageStateMachine {
    resolver: AgentStageResolver,
    policy: ProgressPolicy,
}

impl StageStateMachine {
    /// Creates a state machine.
    #[must_use]
    pub fn new(resolver: AgentStageResolver, policy: ProgressPolicy) -> Self {
        Self { resolver, policy }
    }

    /// Creates a state machine from configuration.
    #[must_use]
    pub fn from_config(config: &ProjectionConfig) -> Self {
        let resolver = AgentStageResolver::new().with_overrides(&config.agent_overrides);
        Self::new(resolver, config.progress_policy)
    }

    /// The agent resolver in use.
    #[must_use]
    pub fn resolver(&self) -> &AgentStageResolver {
        &self.resolver
    }

    /// Returns the state that results from applying `event` to `state`.
    #[must_use]
    pub fn apply(&self, state: &WorkflowData, event: &WorkflowEvent) -> WorkflowData {
        let mut next = state.clone();
        self.apply_at(&mut next, event, now_utc());
        next
    }

    /// Classifies and applies a raw event.
    ///
    /// Events that cannot be classified are discarded with a warning and
    /// leave `state` untouched.
    pub fn apply_raw(
        &self,
        state: &mut WorkflowData,
        raw: &UiEvent,
        now: Timestamp,
    ) -> Vec<ProjectionNotice> {
        match EventClassifier::classify(raw) {
            Ok(event) => self.apply_at(state, &event, now),
            Err(err) => {
                warn!(event_name = %raw.name, event_id = ?raw.id, error = %err, "Discarding event");
                vec![ProjectionNotice::EventDiscarded {
                    reason: err.to_string(),
                }]
            }
        }
    }

    /// Applies a classified event in place, stamping transitions with `now`.
    pub fn apply_at(
        &self,
        state: &mut WorkflowData,
        event: &WorkflowEvent,
        now: Timestamp,
    ) -> Vec<ProjectionNotice> {
        if let Err(err) = check_invariants(state) {
            warn!(error = %err, "Workflow invariant broken before apply");
        }

        let target = self.resolver.resolve(&event.agent_id);
        if !self.resolver.is_known(&event.agent_id) {
            debug!(agent = %event.agent_id, stage = %target, "Unknown agent, using fallback stage");
        }

        let mut notices = Vec::new();
        hand_off(state, target, now, &mut notices);

        if let Some(stage) = state.stage_mut(target) {
            stage.agent_name.clone_from(&event.agent_id);
            match event.kind {
                EventKind::Progress => self.apply_progress(stage, event, now, &mut notices),
                EventKind::ContentReady => apply_content_ready(stage, event, now, &mut notices),
                EventKind::AiResponse => self.apply_ai_response(stage, event, now, &mut notices),
            }
            debug!(
                kind = %event.kind,
                agent = %event.agent_id,
                stage = %target,
                status = %stage.status,
                progress = stage.progress,
                "Applied event"
            );
        }

        self.finish(state, target);
        notices
    }

    /// Advances the active stage by `increment` points.
    ///
    /// Used by the progress ticker; a stage pushed to 100 completes.
    pub fn nudge_active(
        &self,
        state: &mut WorkflowData,
        increment: u8,
        now: Timestamp,
    ) -> Vec<ProjectionNotice> {
        let mut notices = Vec::new();
        let Some(stage) = state
            .stages
            .iter_mut()
            .find(|s| s.status == StageStatus::Active)
        else {
            return notices;
        };

        let target = stage.id;
        stage.progress = stage.progress.saturating_add(increment).min(100);
        if stage.progress >= 100 && stage.complete(now) {
            notices.push(ProjectionNotice::StageCompleted {
                stage: target,
                handed_off: false,
            });
        }

        self.finish(state, target);
        notices
    }

    /// Replaces a stage's content.
    pub fn update_stage_content(&self, state: &mut WorkflowData, stage: StageId, content: &str) {
        if let Some(s) = state.stage_mut(stage) {
            s.content = Some(content.to_string());
        }
    }

    /// Forces a stage to completed.
    pub fn mark_stage_complete(
        &self,
        state: &mut WorkflowData,
        stage: StageId,
        now: Timestamp,
    ) -> Vec<ProjectionNotice> {
        let mut notices = Vec::new();
        if let Some(s) = state.stage_mut(stage) {
            if s.complete(now) {
                notices.push(ProjectionNotice::StageCompleted {
                    stage,
                    handed_off: false,
                });
            }
        }
        self.finish(state, stage);
        notices
    }

    /// Marks a stage failed. Completed stages are left alone.
    pub fn mark_stage_failed(
        &self,
        state: &mut WorkflowData,
        stage: StageId,
        reason: &str,
        now: Timestamp,
    ) -> Vec<ProjectionNotice> {
        let mut notices = Vec::new();
        if let Some(s) = state.stage_mut(stage) {
            if s.fail(now) {
                s.set_content(Some(reason));
                notices.push(ProjectionNotice::StageFailed {
                    stage,
                    reason: reason.to_string(),
                });
            }
        }
        self.finish(state, stage);
        notices
    }

    fn apply_progress(
        &self,
        stage: &mut Stage,
        event: &WorkflowEvent,
        now: Timestamp,
        notices: &mut Vec<ProjectionNotice>,
    ) {
        if stage.activate(now) {
            notices.push(ProjectionNotice::StageActivated { stage: stage.id });
        }
        stage.set_content(event.content.as_deref());

        if stage.status != StageStatus::Active {
            return;
        }
        if let Some(progress) = event.progress {
            self.update_progress(stage, progress);
        }
        if stage.progress >= 100 && stage.complete(now) {
            notices.push(ProjectionNotice::StageCompleted {
                stage: stage.id,
                handed_off: false,
            });
        }
    }

    fn apply_ai_response(
        &self,
        stage: &mut Stage,
        event: &WorkflowEvent,
        now: Timestamp,
        notices: &mut Vec<ProjectionNotice>,
    ) {
        stage.set_content(event.content.as_deref());
        match event.progress {
            Some(progress) if progress >= 100 => {
                if stage.complete(now) {
                    notices.push(ProjectionNotice::StageCompleted {
                        stage: stage.id,
                        handed_off: false,
                    });
                }
            }
            Some(progress) if stage.status == StageStatus::Active => {
                self.update_progress(stage, progress);
            }
            _ => {}
        }
    }

    fn update_progress(&self, stage: &mut Stage, progress: u8) {
        if progress < stage.progress {
            debug!(
                stage = %stage.id,
                stored = stage.progress,
                reported = progress,
                policy = ?self.policy,
                "Progress regression"
            );
        }
        stage.progress = match self.policy {
            ProgressPolicy::LastWriteWins => progress,
            ProgressPolicy::Monotonic => stage.progress.max(progress),
        };
    }

    fn finish(&self, state: &mut WorkflowData, target: StageId) {
        select_current(state, target);
        state.overall_progress = ProgressAggregator::aggregate(&state.stages);
        if let Err(err) = check_invariants(state) {
            error!(error = %err, "Workflow invariant broken after apply");
        }
    }
}

fn apply_content_ready(
    stage: &mut Stage,
    event: &WorkflowEvent,
    now: Timestamp,
    notices: &mut Vec<ProjectionNotice>,
) {
    stage.set_content(event.content.as_deref());
    if let Some(data) = &event.payload {
        stage.payload.merge(data);
    }
    if stage.complete(now) {
        notices.push(ProjectionNotice::StageCompleted {
            stage: stage.id,
            handed_off: false,
        });
    }
}

/// Completes every active stage other than `target`.
fn hand_off(
    state: &mut WorkflowData,
    target: StageId,
    now: Timestamp,
    notices: &mut Vec<ProjectionNotice>,
) {
    for stage in state
        .stages
        .iter_mut()
        .filter(|s| s.id != target && s.status == StageStatus::Active)
    {
        stage.complete(now);
        notices.push(ProjectionNotice::StageCompleted {
            stage: stage.id,
            handed_off: true,
        });
    }
}

/// Picks `current_stage` after a change to `target`.
///
/// The sole active stage wins. With nothing active, an empty selection
/// falls back to the first pending stage, and a selection whose stage has
/// finished advances to the next pending stage after `target`. Any other
/// selection is left as is.
fn select_current(state: &mut WorkflowData, target: StageId) {
    let active = state.active_stages().next().map(|s| s.id);
    if let Some(id) = active {
        state.current_stage = Some(id);
        return;
    }

    let first_pending = state
        .stages
        .iter()
        .find(|s| s.status == StageStatus::Pending)
        .map(|s| s.id);

    match state.current_stage {
        None => state.current_stage = first_pending,
        Some(current) => {
            let finished = state
                .stage(current)
                .map_or(true, |s| s.status.is_terminal());
            if !finished {
                return;
            }
            let next = state
                .stages
                .iter()
                .skip(target.index() + 1)
                .find(|s| s.status == StageStatus::Pending)
                .map(|s| s.id)
                .or(first_pending);
            if let Some(next) = next {
                state.current_stage = Some(next);
            }
        }
    }
}

/// Checks the structural invariants of a workflow.
///
/// - stages are the fixed list in pipeline order
/// - at most one stage is active
/// - progress values are within 0-100, completed stages are at 100
/// - started stages have a start time, terminal stages an end time
pub fn check_invariants(state: &WorkflowData) -> Result<(), ProjectionError> {
    let ids_match = state.stages.len() == StageId::ALL.len()
        && state.stages.iter().zip(StageId::ALL).all(|(s, id)| s.id == id);
    if !ids_match {
        return Err(ProjectionError::InvariantViolation(
            "stage list does not match the pipeline".into(),
        ));
    }

    let active: Vec<_> = state.active_stages().map(|s| s.id.as_str()).collect();
    if active.len() > 1 {
        return Err(ProjectionError::InvariantViolation(format!(
            "multiple active stages: {}",
            active.join(", ")
        )));
    }

    for stage in &state.stages {
        if stage.progress > 100 {
            return Err(ProjectionError::InvariantViolation(format!(
                "{} progress {} exceeds 100",
                stage.id, stage.progress
            )));
        }
        if stage.status == StageStatus::Completed && stage.progress != 100 {
            return Err(ProjectionError::InvariantViolation(format!(
                "{} is completed at {}%",
                stage.id, stage.progress
            )));
        }
        if stage.status.is_started() && stage.start_time.is_none() {
            return Err(ProjectionError::InvariantViolation(format!(
                "{} started without a start time",
                stage.id
            )));
        }
        if stage.status.is_terminal() != stage.end_time.is_some() {
            return Err(ProjectionError::InvariantViolation(format!(
                "{} end time does not match status {}",
                stage.id, stage.status
            )));
        }
    }

    if state.overall_progress > 100 {
        return Err(ProjectionError::InvariantViolation(format!(
            "overall progress {} exceeds 100",
            state.overall_progress
        )));
    }
    Ok(())
}
