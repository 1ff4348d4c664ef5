//! Single-owner workflow state and the operations exposed to the display.

use crate::cancellation::CancellationToken;
use crate::config::ProjectionConfig;
use crate::core::{StageId, WorkflowData};
use crate::errors::ProjectionError;
use crate::events::{EventClassifier, EventSink, ProjectionNotice, UiEvent, WorkflowEvent};
use crate::messages::{ensure_tool_calls_have_responses, Message, MessageFilter};
use crate::projection::StageStateMachine;
use crate::session::{ErrorNotice, ErrorNotifier, SessionTrackers};
use crate::simulation::ProgressSimulator;
use crate::transport::{StreamTransport, SubmitRequest};
use crate::utils::now_utc;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Owns the [`WorkflowData`] of one display session.
///
/// Every mutation goes through `&mut self`, so callers serialize access
/// either by owning the controller or through a
/// [`ControllerHandle`](super::ControllerHandle).
pub struct WorkflowController {
    config: ProjectionConfig,
    machine: StageStateMachine,
    filter: MessageFilter,
    data: WorkflowData,
    manual_selection: Option<StageId>,
    cursor: usize,
    resets: u64,
    session: SessionTrackers,
    errors: ErrorNotifier,
    submission: Arc<CancellationToken>,
    sink: Arc<dyn EventSink>,
    transport: Arc<dyn StreamTransport>,
}

impl std::fmt::Debug for WorkflowController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowController")
            .field("current_stage", &self.data.current_stage)
            .field("overall_progress", &self.data.overall_progress)
            .field("manual_selection", &self.manual_selection)
            .field("cursor", &self.cursor)
            .field("resets", &self.resets)
            .finish_non_exhaustive()
    }
}

impl WorkflowController {
    /// Creates a controller after validating `config`.
    pub fn new(
        config: ProjectionConfig,
        transport: Arc<dyn StreamTransport>,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, ProjectionError> {
        config.validate()?;
        Ok(Self {
            machine: StageStateMachine::from_config(&config),
            filter: MessageFilter::from_config(&config),
            config,
            data: WorkflowData::new(),
            manual_selection: None,
            cursor: 0,
            resets: 0,
            session: SessionTrackers::default(),
            errors: ErrorNotifier::new(),
            submission: Arc::new(CancellationToken::new()),
            sink,
            transport,
        })
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    /// Current workflow state.
    #[must_use]
    pub fn workflow_data(&self) -> &WorkflowData {
        &self.data
    }

    /// Transient per-session state.
    #[must_use]
    pub fn session(&self) -> &SessionTrackers {
        &self.session
    }

    /// The stage pinned by [`select_stage`](Self::select_stage), if any.
    #[must_use]
    pub fn manual_selection(&self) -> Option<StageId> {
        self.manual_selection
    }

    /// True while some stage is active.
    #[must_use]
    pub fn has_active_stage(&self) -> bool {
        self.data.has_active_stage()
    }

    /// How many times the workflow has been reset, whatever the trigger.
    #[must_use]
    pub fn reset_count(&self) -> u64 {
        self.resets
    }

    /// Token cancelled when the current submission is stopped.
    #[must_use]
    pub fn submission_token(&self) -> Arc<CancellationToken> {
        Arc::clone(&self.submission)
    }

    /// Restores the initial five-stage workflow and clears session state.
    pub fn reset_workflow(&mut self) {
        self.reset("requested");
    }

    /// Resets for a new work item and remembers its identifier.
    pub fn reset_for_new_epic(&mut self, id: &str) {
        let notice = self.begin_epic(id);
        self.emit(&[notice]);
    }

    fn begin_epic(&mut self, id: &str) -> ProjectionNotice {
        self.reset(&format!("new work item {id}"));
        self.session.remember_epic(id);
        ProjectionNotice::EpicDetected { id: id.to_string() }
    }

    fn reset(&mut self, reason: &str) -> ProjectionNotice {
        info!(reason, "Resetting workflow");
        self.resets += 1;
        self.data = WorkflowData::new();
        self.manual_selection = None;
        self.session.reset();
        let notice = ProjectionNotice::WorkflowReset {
            reason: reason.to_string(),
        };
        self.emit(std::slice::from_ref(&notice));
        notice
    }

    /// The transport's messages, deduplicated and without hidden ones.
    #[must_use]
    pub fn filtered_messages(&self) -> Vec<Message> {
        self.filter.project(&self.transport.snapshot().messages)
    }

    /// Applies one raw event from the stream.
    pub fn apply_event(&mut self, event: &UiEvent) -> Vec<ProjectionNotice> {
        match EventClassifier::classify(event) {
            Ok(classified) => {
                self.session.track(&classified);
                self.project(&classified)
            }
            Err(err) => {
                warn!(event_name = %event.name, event_id = ?event.id, error = %err, "Discarding event");
                let notices = vec![ProjectionNotice::EventDiscarded {
                    reason: err.to_string(),
                }];
                self.emit(&notices);
                notices
            }
        }
    }

    /// Applies the events of a full `ui` snapshot that have not been seen.
    ///
    /// A snapshot shorter than the previous one means the stream started
    /// over, so the workflow is reset before replaying it.
    pub fn ingest_ui_snapshot(&mut self, events: &[UiEvent]) -> Vec<ProjectionNotice> {
        let mut notices = Vec::new();
        if events.len() < self.cursor {
            notices.push(self.reset("event stream restarted"));
            self.cursor = 0;
        }

        for event in &events[self.cursor..] {
            notices.extend(self.apply_event(event));
        }
        self.cursor = events.len();
        notices
    }

    /// Clears the progress bubble when a new assistant message arrived.
    pub fn observe_messages(&mut self, messages: &[Message]) -> bool {
        self.session.observe_messages(messages)
    }

    /// Feeds the transport's error value; returns a notice for new errors.
    pub fn observe_stream_error(&mut self, error: Option<&str>) -> Option<ErrorNotice> {
        let notice = self.errors.observe(error)?;
        self.emit(&[ProjectionNotice::StreamError {
            message: notice.message.clone(),
        }]);
        Some(notice)
    }

    /// Pulls the transport snapshot and projects everything new in it.
    pub fn sync_from_transport(&mut self) -> Vec<ProjectionNotice> {
        let snapshot = self.transport.snapshot();
        let mut notices = self.ingest_ui_snapshot(&snapshot.ui);
        self.observe_messages(&snapshot.messages);
        if let Some(notice) = self.observe_stream_error(snapshot.error.as_deref()) {
            notices.push(ProjectionNotice::StreamError {
                message: notice.message,
            });
        }
        notices
    }

    /// Advances the active stage by `increment` points.
    pub fn tick_with(&mut self, increment: u8) -> Vec<ProjectionNotice> {
        let notices = self.machine.nudge_active(&mut self.data, increment, now_utc());
        self.settle(notices)
    }

    /// Pins `current_stage` to `stage` until the next reset.
    pub fn select_stage(&mut self, stage: StageId) {
        debug!(%stage, "Stage selected");
        self.manual_selection = Some(stage);
        self.data.current_stage = Some(stage);
    }

    /// Replaces a stage's content.
    pub fn update_stage_content(&mut self, stage: StageId, content: &str) {
        self.machine
            .update_stage_content(&mut self.data, stage, content);
    }

    /// Forces a stage to completed.
    pub fn mark_stage_complete(&mut self, stage: StageId) -> Vec<ProjectionNotice> {
        let notices = self
            .machine
            .mark_stage_complete(&mut self.data, stage, now_utc());
        self.settle(notices)
    }

    /// Marks a stage failed with `reason` as its content.
    pub fn mark_stage_failed(&mut self, stage: StageId, reason: &str) -> Vec<ProjectionNotice> {
        let notices = self
            .machine
            .mark_stage_failed(&mut self.data, stage, reason, now_utc());
        self.settle(notices)
    }

    /// Resets and applies the whole simulator script at once.
    pub fn run_demo(&mut self) -> Vec<ProjectionNotice> {
        self.reset_workflow();
        ProgressSimulator::new()
            .events()
            .iter()
            .flat_map(|event| self.apply_demo_event(event))
            .collect()
    }

    /// Applies a simulator event without touching session trackers.
    pub fn apply_demo_event(&mut self, event: &UiEvent) -> Vec<ProjectionNotice> {
        match EventClassifier::classify(event) {
            Ok(classified) => self.project(&classified),
            Err(err) => {
                debug!(error = %err, "Skipping demo event");
                Vec::new()
            }
        }
    }

    /// Submits user text to the transport.
    ///
    /// Blank input, or input while a run is streaming, is ignored and
    /// yields `Ok(false)`. A new work-item identifier in the text resets
    /// the workflow first.
    pub async fn submit_text(&mut self, text: &str) -> Result<bool, ProjectionError> {
        let snapshot = self.transport.snapshot();
        if text.trim().is_empty() || snapshot.is_loading {
            debug!(loading = snapshot.is_loading, "Ignoring submission");
            return Ok(false);
        }

        self.session.clear_progress();
        if let Some(id) = self.session.observe_input(text) {
            let notice = self.begin_epic(&id);
            self.sink.emit(&notice).await;
        }

        let mut batch =
            ensure_tool_calls_have_responses(&snapshot.messages, &self.config.do_not_render_prefix);
        if !batch.is_empty() {
            debug!(count = batch.len(), "Backfilling tool responses");
        }
        batch.push(Message::human(Uuid::new_v4().to_string(), text));

        self.submission = Arc::new(CancellationToken::new());
        self.transport.submit(SubmitRequest::messages(batch)).await?;
        Ok(true)
    }

    /// Stops the current run. Stage state is left as is.
    pub async fn stop(&mut self) -> Result<(), ProjectionError> {
        self.submission.cancel("stopped by caller");
        self.transport.stop().await
    }

    /// Reruns from the checkpoint preceding `message_id`.
    pub async fn regenerate(&mut self, message_id: &str) -> Result<(), ProjectionError> {
        let checkpoint = self
            .transport
            .message_metadata(message_id)
            .and_then(|m| m.parent_checkpoint);
        debug!(message_id, has_checkpoint = checkpoint.is_some(), "Regenerating");

        self.session.clear_progress();
        self.submission = Arc::new(CancellationToken::new());
        self.transport.submit(SubmitRequest::rerun(checkpoint)).await
    }

    fn project(&mut self, event: &WorkflowEvent) -> Vec<ProjectionNotice> {
        let notices = self.machine.apply_at(&mut self.data, event, now_utc());
        self.settle(notices)
    }

    fn settle(&mut self, notices: Vec<ProjectionNotice>) -> Vec<ProjectionNotice> {
        if let Some(stage) = self.manual_selection {
            self.data.current_stage = Some(stage);
        }
        self.emit(&notices);
        notices
    }

    fn emit(&self, notices: &[ProjectionNotice]) {
        for notice in notices {
            self.sink.try_emit(notice);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{StageStatus, StagePayload};
    use crate::events::{CollectingEventSink, NoOpEventSink, StageData};
    use crate::messages::{MessageRole, TOOL_RESPONSE_PLACEHOLDER};
    use crate::testing::assertions::{assert_initial, assert_single_active, assert_stage};
    use crate::testing::fixtures;
    use crate::transport::{
        Checkpoint, InMemoryTransport, MessageMetadata, MockStreamTransport, StreamSnapshot,
    };
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    /// Records which emit path each notice took.
    #[derive(Default)]
    struct SplitSink {
        awaited: Mutex<Vec<&'static str>>,
        immediate: Mutex<Vec<&'static str>>,
    }

    #[async_trait]
    impl EventSink for SplitSink {
        async fn emit(&self, notice: &ProjectionNotice) {
            self.awaited.lock().push(notice.event_type());
        }

        fn try_emit(&self, notice: &ProjectionNotice) {
            self.immediate.lock().push(notice.event_type());
        }
    }

    struct Harness {
        controller: WorkflowController,
        transport: Arc<InMemoryTransport>,
        sink: Arc<CollectingEventSink>,
    }

    fn harness() -> Harness {
        let transport = Arc::new(InMemoryTransport::new());
        let sink = Arc::new(CollectingEventSink::new());
        let controller =
            WorkflowController::new(ProjectionConfig::default(), transport.clone(), sink.clone())
                .unwrap();
        Harness {
            controller,
            transport,
            sink,
        }
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = ProjectionConfig {
            tick_interval_ms: 0,
            ..ProjectionConfig::default()
        };
        let result = WorkflowController::new(
            config,
            Arc::new(InMemoryTransport::new()),
            Arc::new(NoOpEventSink),
        );
        assert!(matches!(result, Err(ProjectionError::Config(_))));
    }

    #[test]
    fn test_apply_event_emits_notices() {
        let mut h = harness();
        h.controller
            .apply_event(&fixtures::progress_event("story_writer", 40));
        h.controller
            .apply_event(&fixtures::progress_event("design_architect", 10));

        assert_stage(h.controller.workflow_data(), StageId::StoryGeneration, StageStatus::Completed, 100);
        assert_single_active(h.controller.workflow_data(), StageId::DesignGeneration);
        assert_eq!(h.sink.notices_of_type("stage.activated").len(), 2);
        assert_eq!(h.sink.notices_of_type("stage.completed").len(), 1);
    }

    #[test]
    fn test_malformed_event_is_discarded() {
        let mut h = harness();
        let notices = h
            .controller
            .apply_event(&UiEvent::new("progress").with_progress(30));
        assert_eq!(notices.len(), 1);
        assert_initial(h.controller.workflow_data());
        assert_eq!(h.sink.notices_of_type("event.discarded").len(), 1);
    }

    #[test]
    fn test_snapshot_ingestion_uses_cursor() {
        let mut h = harness();
        let mut events = vec![
            fixtures::progress_event("story_writer", 40),
            fixtures::progress_event("story_writer", 60),
        ];
        h.controller.ingest_ui_snapshot(&events);
        assert_stage(h.controller.workflow_data(), StageId::StoryGeneration, StageStatus::Active, 60);

        // Replaying the same snapshot changes nothing.
        h.controller.update_stage_content(StageId::StoryGeneration, "manual");
        h.controller.ingest_ui_snapshot(&events);
        let story = h.controller.workflow_data().stage(StageId::StoryGeneration).unwrap();
        assert_eq!(story.content.as_deref(), Some("manual"));

        events.push(fixtures::progress_event("story_writer", 80));
        h.controller.ingest_ui_snapshot(&events);
        assert_stage(h.controller.workflow_data(), StageId::StoryGeneration, StageStatus::Active, 80);
    }

    #[test]
    fn test_shorter_snapshot_resets() {
        let mut h = harness();
        h.controller.ingest_ui_snapshot(&[
            fixtures::progress_event("story_writer", 100),
            fixtures::progress_event("design_architect", 50),
        ]);
        let notices = h
            .controller
            .ingest_ui_snapshot(&[fixtures::progress_event("code_developer", 5)]);

        assert!(matches!(notices[0], ProjectionNotice::WorkflowReset { .. }));
        assert_eq!(h.controller.reset_count(), 1);
        let data = h.controller.workflow_data();
        assert_stage(data, StageId::StoryGeneration, StageStatus::Pending, 0);
        assert_single_active(data, StageId::CodeGeneration);
    }

    #[test]
    fn test_manual_selection_is_pinned() {
        let mut h = harness();
        h.controller.select_stage(StageId::Testing);
        h.controller
            .apply_event(&fixtures::progress_event("story_writer", 10));
        assert_eq!(h.controller.workflow_data().current_stage, Some(StageId::Testing));

        h.controller.reset_workflow();
        assert_eq!(h.controller.manual_selection(), None);
        h.controller
            .apply_event(&fixtures::progress_event("story_writer", 10));
        assert_eq!(
            h.controller.workflow_data().current_stage,
            Some(StageId::StoryGeneration)
        );
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut h = harness();
        for event in ProgressSimulator::for_stages(&[StageId::StoryGeneration, StageId::DesignGeneration]).events() {
            h.controller.apply_event(&event);
        }
        h.controller
            .apply_event(&fixtures::ai_response_event("code_developer", "thinking"));
        assert!(h.controller.workflow_data().overall_progress > 0);

        h.controller.reset_workflow();
        assert_eq!(*h.controller.workflow_data(), WorkflowData::new());
        assert!(h.controller.session().ai_responses().is_empty());
        assert!(h.controller.session().latest_progress().is_none());
        assert_eq!(h.sink.notices_of_type("workflow.reset").len(), 1);
    }

    #[test]
    fn test_manual_operations() {
        let mut h = harness();
        h.controller
            .apply_event(&fixtures::progress_event("code_developer", 30));
        h.controller.mark_stage_complete(StageId::CodeGeneration);
        assert_stage(h.controller.workflow_data(), StageId::CodeGeneration, StageStatus::Completed, 100);
        assert_eq!(h.controller.workflow_data().overall_progress, 20);

        h.controller.mark_stage_failed(StageId::Testing, "runner crashed");
        let testing = h.controller.workflow_data().stage(StageId::Testing).unwrap();
        assert_eq!(testing.status, StageStatus::Failed);
        assert_eq!(h.sink.notices_of_type("stage.failed").len(), 1);
    }

    #[test]
    fn test_tick_with() {
        let mut h = harness();
        assert!(h.controller.tick_with(5).is_empty());
        assert_initial(h.controller.workflow_data());

        h.controller
            .apply_event(&fixtures::progress_event("test_engineer", 96));
        h.controller.tick_with(3);
        assert_stage(h.controller.workflow_data(), StageId::Testing, StageStatus::Active, 99);
        h.controller.tick_with(3);
        assert_stage(h.controller.workflow_data(), StageId::Testing, StageStatus::Completed, 100);
        assert!(!h.controller.has_active_stage());
    }

    #[test]
    fn test_run_demo_completes_pipeline() {
        let mut h = harness();
        h.controller
            .apply_event(&fixtures::progress_event("story_writer", 70));
        h.controller.run_demo();

        let data = h.controller.workflow_data();
        assert!(data.is_complete());
        assert_eq!(data.overall_progress, 100);
        assert!(matches!(
            &data.stage(StageId::Deployment).unwrap().payload,
            StagePayload::Deployment { deployment_info: Some(_) }
        ));
        // Demo events do not feed the progress bubble.
        assert!(h.controller.session().latest_progress().is_none());
    }

    #[test]
    fn test_filtered_messages() {
        let h = harness();
        h.transport.push_message(Message::human("h1", "hi"));
        h.transport.push_message(Message::assistant("a1", "x"));
        h.transport.push_message(Message::assistant("a2", "x"));
        h.transport
            .push_message(Message::assistant("do-not-render-1", "internal"));

        let ids: Vec<_> = h
            .controller
            .filtered_messages()
            .into_iter()
            .filter_map(|m| m.id)
            .collect();
        assert_eq!(ids, vec!["h1", "a1"]);
    }

    #[test]
    fn test_sync_from_transport() {
        let mut h = harness();
        h.transport
            .push_event(fixtures::progress_event("story_writer", 20));
        h.transport.set_error(Some("connection reset"));

        let notices = h.controller.sync_from_transport();
        assert!(notices.contains(&ProjectionNotice::StreamError {
            message: "connection reset".into()
        }));
        assert!(h.controller.session().latest_progress().is_some());

        // The same error is not raised twice.
        let notices = h.controller.sync_from_transport();
        assert!(notices.is_empty());

        h.transport.push_message(Message::assistant("a1", "done"));
        h.controller.sync_from_transport();
        assert!(h.controller.session().latest_progress().is_none());
    }

    #[tokio::test]
    async fn test_submit_text() {
        let mut h = harness();
        assert!(h.controller.submit_text("build the login page").await.unwrap());

        let submissions = h.transport.submissions();
        assert_eq!(submissions.len(), 1);
        let messages = submissions[0].messages.clone().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, MessageRole::Human);
        assert_eq!(messages[0].content.as_text(), Some("build the login page"));
    }

    #[tokio::test]
    async fn test_blank_or_loading_submission_is_ignored() {
        let mut h = harness();
        assert!(!h.controller.submit_text("   ").await.unwrap());

        h.transport.set_loading(true);
        assert!(!h.controller.submit_text("hello").await.unwrap());
        assert!(h.transport.submissions().is_empty());
    }

    #[tokio::test]
    async fn test_new_epic_resets_once() {
        let mut h = harness();
        h.controller
            .apply_event(&fixtures::progress_event("story_writer", 50));

        h.controller.submit_text("Please start epic APEX-101").await.unwrap();
        assert_initial(h.controller.workflow_data());
        assert_eq!(h.controller.reset_count(), 1);
        assert_eq!(h.controller.session().current_epic(), Some("APEX-101"));
        assert_eq!(
            h.sink.notices_of_type("workflow.epic_detected"),
            vec![ProjectionNotice::EpicDetected {
                id: "APEX-101".into()
            }]
        );

        h.transport.set_loading(false);
        h.controller
            .apply_event(&fixtures::progress_event("story_writer", 50));
        h.controller.submit_text("more detail on APEX-101").await.unwrap();
        assert_stage(h.controller.workflow_data(), StageId::StoryGeneration, StageStatus::Active, 50);
        assert_eq!(h.sink.notices_of_type("workflow.epic_detected").len(), 1);
        assert_eq!(h.controller.reset_count(), 1);
    }

    #[tokio::test]
    async fn test_submission_awaits_sink_for_epic_notice() {
        let sink = Arc::new(SplitSink::default());
        let mut controller = WorkflowController::new(
            ProjectionConfig::default(),
            Arc::new(InMemoryTransport::new()),
            sink.clone(),
        )
        .unwrap();

        controller.submit_text("kick off APEX-7").await.unwrap();
        assert_eq!(*sink.awaited.lock(), vec!["workflow.epic_detected"]);
        assert_eq!(*sink.immediate.lock(), vec!["workflow.reset"]);

        controller.reset_for_new_epic("APEX-8");
        assert_eq!(sink.awaited.lock().len(), 1);
        assert_eq!(
            *sink.immediate.lock(),
            vec!["workflow.reset", "workflow.reset", "workflow.epic_detected"]
        );
    }

    #[tokio::test]
    async fn test_unanswered_tool_calls_are_backfilled() {
        let mut h = harness();
        h.transport.push_message(
            Message::assistant("a1", "looking that up").with_tool_call("call-1", "search"),
        );

        h.controller.submit_text("thanks").await.unwrap();
        let messages = h.transport.submissions()[0].messages.clone().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::Tool);
        assert_eq!(messages[0].tool_call_id.as_deref(), Some("call-1"));
        assert_eq!(messages[0].content.as_text(), Some(TOOL_RESPONSE_PLACEHOLDER));
        assert_eq!(messages[1].role, MessageRole::Human);

        // The synthetic response is hidden from display.
        let shown = h.controller.filtered_messages();
        assert!(shown.iter().all(|m| m.role != MessageRole::Tool));
    }

    #[tokio::test]
    async fn test_stop_keeps_stage_state() {
        let mut h = harness();
        h.controller.submit_text("go").await.unwrap();
        h.controller
            .apply_event(&fixtures::progress_event("design_architect", 35));
        let token = h.controller.submission_token();
        let before = h.controller.workflow_data().clone();

        h.controller.stop().await.unwrap();
        assert!(token.is_cancelled());
        assert_eq!(h.transport.stop_count(), 1);
        assert_eq!(*h.controller.workflow_data(), before);
    }

    #[tokio::test]
    async fn test_regenerate_uses_parent_checkpoint() {
        let mut h = harness();
        let checkpoint = Checkpoint {
            checkpoint_id: Some("cp-7".into()),
            ..Checkpoint::default()
        };
        h.transport.set_metadata(
            "a1",
            MessageMetadata {
                parent_checkpoint: Some(checkpoint.clone()),
                ..MessageMetadata::default()
            },
        );

        h.controller.regenerate("a1").await.unwrap();
        let submission = &h.transport.submissions()[0];
        assert!(submission.messages.is_none());
        assert_eq!(submission.checkpoint, Some(checkpoint));
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let mut transport = MockStreamTransport::new();
        transport
            .expect_snapshot()
            .returning(StreamSnapshot::default);
        transport
            .expect_submit()
            .times(1)
            .returning(|_| Err(ProjectionError::transport("offline")));

        let mut controller = WorkflowController::new(
            ProjectionConfig::default(),
            Arc::new(transport),
            Arc::new(NoOpEventSink),
        )
        .unwrap();

        let err = controller.submit_text("hello").await.unwrap_err();
        assert!(matches!(err, ProjectionError::Transport(_)));
    }

    #[test]
    fn test_content_ready_payload_through_controller() {
        let mut h = harness();
        let data = StageData {
            stories: Some(vec![crate::core::Story {
                jira_id: "APEX-1".into(),
                ..Default::default()
            }]),
            ..StageData::default()
        };
        h.controller
            .apply_event(&fixtures::content_ready_event("story_writer", &data));
        let story = h.controller.workflow_data().stage(StageId::StoryGeneration).unwrap();
        assert!(matches!(
            &story.payload,
            StagePayload::StoryGeneration { stories: Some(s) } if s.len() == 1
        ));
    }
}
