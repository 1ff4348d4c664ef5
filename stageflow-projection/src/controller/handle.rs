//! Task-owned controller behind an async handle.
//!
//! The [`WorkflowController`] lives inside one spawned task. Commands,
//! ticker nudges and demo playback events are all handled by that task's
//! `select!` loop, so no two updates ever interleave.

use super::{ProgressTicker, WorkflowController};
use crate::cancellation::CancellationToken;
use crate::core::{StageId, WorkflowData};
use crate::errors::ProjectionError;
use crate::events::{ProjectionNotice, UiEvent};
use crate::messages::Message;
use crate::simulation::{PlaybackTiming, ProgressSimulator};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

const COMMAND_BUFFER: usize = 64;

type Job = Box<dyn FnOnce(&mut WorkflowController) + Send>;
type Reply<T> = oneshot::Sender<Result<T, ProjectionError>>;

enum Command {
    Run(Job),
    Reset {
        epic: Option<String>,
        reply: oneshot::Sender<()>,
    },
    PlayDemo(oneshot::Sender<()>),
    Submit {
        text: String,
        reply: Reply<bool>,
    },
    Stop(Reply<()>),
    Regenerate {
        message_id: String,
        reply: Reply<()>,
    },
}

/// Async front-end to a [`WorkflowController`] running in its own task.
///
/// Besides forwarding calls, the task runs the [`ProgressTicker`] while
/// a stage is active and plays the demo script with real delays.
/// Dropping the handle stops the task.
#[derive(Debug)]
pub struct ControllerHandle {
    commands: mpsc::Sender<Command>,
    shutdown: Arc<CancellationToken>,
    task: Option<JoinHandle<()>>,
}

impl ControllerHandle {
    /// Spawns the controller task on the current runtime.
    #[must_use]
    pub fn spawn(controller: WorkflowController) -> Self {
        let (commands, receiver) = mpsc::channel(COMMAND_BUFFER);
        let shutdown = Arc::new(CancellationToken::new());
        let (actor, demo_rx) = Actor::new(controller);
        let task = tokio::spawn(actor.run(demo_rx, receiver, Arc::clone(&shutdown)));
        info!("Workflow controller started");
        Self {
            commands,
            shutdown,
            task: Some(task),
        }
    }

    async fn call<R, F>(&self, f: F) -> Result<R, ProjectionError>
    where
        F: FnOnce(&mut WorkflowController) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::new(move |controller| {
            let _ = tx.send(f(controller));
        });
        self.send(Command::Run(job)).await?;
        rx.await.map_err(|_| ProjectionError::ControllerClosed)
    }

    async fn send(&self, command: Command) -> Result<(), ProjectionError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| ProjectionError::ControllerClosed)
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, ProjectionError> {
        let (tx, rx) = oneshot::channel();
        self.send(build(tx)).await?;
        rx.await.map_err(|_| ProjectionError::ControllerClosed)
    }

    /// A copy of the current workflow state.
    pub async fn workflow_data(&self) -> Result<WorkflowData, ProjectionError> {
        self.call(|c| c.workflow_data().clone()).await
    }

    /// The transport's messages as they should be displayed.
    pub async fn filtered_messages(&self) -> Result<Vec<Message>, ProjectionError> {
        self.call(|c| c.filtered_messages()).await
    }

    /// Applies one raw event.
    pub async fn apply_event(&self, event: UiEvent) -> Result<Vec<ProjectionNotice>, ProjectionError> {
        self.call(move |c| c.apply_event(&event)).await
    }

    /// Applies the unseen events of a full `ui` snapshot.
    pub async fn ingest_ui_snapshot(
        &self,
        events: Vec<UiEvent>,
    ) -> Result<Vec<ProjectionNotice>, ProjectionError> {
        self.call(move |c| c.ingest_ui_snapshot(&events)).await
    }

    /// Pulls and projects the transport's current snapshot.
    pub async fn sync_from_transport(&self) -> Result<Vec<ProjectionNotice>, ProjectionError> {
        self.call(WorkflowController::sync_from_transport).await
    }

    /// Pins the current stage.
    pub async fn select_stage(&self, stage: StageId) -> Result<(), ProjectionError> {
        self.call(move |c| c.select_stage(stage)).await
    }

    /// Replaces a stage's content.
    pub async fn update_stage_content(
        &self,
        stage: StageId,
        content: impl Into<String>,
    ) -> Result<(), ProjectionError> {
        let content = content.into();
        self.call(move |c| c.update_stage_content(stage, &content)).await
    }

    /// Forces a stage to completed.
    pub async fn mark_stage_complete(&self, stage: StageId) -> Result<(), ProjectionError> {
        self.call(move |c| {
            c.mark_stage_complete(stage);
        })
        .await
    }

    /// Marks a stage failed.
    pub async fn mark_stage_failed(
        &self,
        stage: StageId,
        reason: impl Into<String>,
    ) -> Result<(), ProjectionError> {
        let reason = reason.into();
        self.call(move |c| {
            c.mark_stage_failed(stage, &reason);
        })
        .await
    }

    /// Resets the workflow and stops any demo playback.
    pub async fn reset_workflow(&self) -> Result<(), ProjectionError> {
        self.request(|reply| Command::Reset { epic: None, reply })
            .await
    }

    /// Resets for a new work item and stops any demo playback.
    pub async fn reset_for_new_epic(&self, id: impl Into<String>) -> Result<(), ProjectionError> {
        let epic = Some(id.into());
        self.request(|reply| Command::Reset { epic, reply }).await
    }

    /// Resets and starts timed playback of the demo script.
    ///
    /// Returns once playback has started.
    pub async fn run_demo(&self) -> Result<(), ProjectionError> {
        self.request(Command::PlayDemo).await
    }

    /// Submits user text.
    pub async fn submit_text(&self, text: impl Into<String>) -> Result<bool, ProjectionError> {
        let text = text.into();
        self.request(|reply| Command::Submit { text, reply }).await?
    }

    /// Stops the current run and any demo playback.
    pub async fn stop(&self) -> Result<(), ProjectionError> {
        self.request(Command::Stop).await?
    }

    /// Reruns from the checkpoint preceding `message_id`.
    pub async fn regenerate(&self, message_id: impl Into<String>) -> Result<(), ProjectionError> {
        let message_id = message_id.into();
        self.request(|reply| Command::Regenerate { message_id, reply })
            .await?
    }

    /// Stops the task and waits for it to finish.
    pub async fn shutdown(mut self) {
        self.shutdown.cancel("shutdown requested");
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for ControllerHandle {
    fn drop(&mut self) {
        self.shutdown.cancel("handle dropped");
    }
}

struct Actor {
    controller: WorkflowController,
    timing: PlaybackTiming,
    demo_tx: mpsc::UnboundedSender<(u64, UiEvent)>,
    demo_generation: u64,
    demo_cancel: Option<Arc<CancellationToken>>,
}

impl Actor {
    fn new(controller: WorkflowController) -> (Self, mpsc::UnboundedReceiver<(u64, UiEvent)>) {
        let timing = PlaybackTiming {
            step_delay: controller.config().demo_step_delay(),
            stage_delay: controller.config().demo_stage_delay(),
        };
        let (demo_tx, demo_rx) = mpsc::unbounded_channel();
        (
            Self {
                controller,
                timing,
                demo_tx,
                demo_generation: 0,
                demo_cancel: None,
            },
            demo_rx,
        )
    }

    async fn run(
        mut self,
        mut demo_rx: mpsc::UnboundedReceiver<(u64, UiEvent)>,
        mut commands: mpsc::Receiver<Command>,
        shutdown: Arc<CancellationToken>,
    ) {
        let mut ticker = ProgressTicker::from_config(self.controller.config());

        loop {
            ticker.sync(self.controller.has_active_stage());

            tokio::select! {
                () = shutdown.cancelled() => break,
                command = commands.recv() => match command {
                    Some(command) => self.handle(command).await,
                    None => break,
                },
                Some((generation, event)) = demo_rx.recv() => {
                    if generation == self.demo_generation {
                        self.controller.apply_demo_event(&event);
                    }
                }
                increment = ticker.tick() => {
                    self.controller.tick_with(increment);
                }
            }
        }

        self.cancel_demo("controller stopped");
        debug!("Workflow controller task finished");
    }

    async fn handle(&mut self, command: Command) {
        let resets = self.controller.reset_count();
        let restarts_demo = matches!(command, Command::PlayDemo(_));

        match command {
            Command::Run(job) => job(&mut self.controller),
            Command::Reset { epic, reply } => {
                match epic {
                    Some(id) => self.controller.reset_for_new_epic(&id),
                    None => self.controller.reset_workflow(),
                }
                let _ = reply.send(());
            }
            Command::PlayDemo(reply) => {
                self.start_demo();
                let _ = reply.send(());
            }
            Command::Submit { text, reply } => {
                let _ = reply.send(self.controller.submit_text(&text).await);
            }
            Command::Stop(reply) => {
                self.cancel_demo("stopped by caller");
                let _ = reply.send(self.controller.stop().await);
            }
            Command::Regenerate { message_id, reply } => {
                let _ = reply.send(self.controller.regenerate(&message_id).await);
            }
        }

        // Snapshot restarts and new work items reset from inside the
        // controller; playback of the old run must not outlive them.
        if !restarts_demo && self.controller.reset_count() != resets {
            self.cancel_demo("workflow reset");
        }
    }

    fn start_demo(&mut self) {
        self.cancel_demo("demo restarted");
        self.controller.reset_workflow();
        self.demo_generation += 1;

        let token = Arc::new(CancellationToken::new());
        let playback = Arc::clone(&token);
        let tx = self.demo_tx.clone();
        let generation = self.demo_generation;
        let timing = self.timing;
        tokio::spawn(async move {
            let finished = ProgressSimulator::new()
                .play(timing, &playback, |event| tx.send((generation, event)).is_ok())
                .await;
            let reason = playback.reason();
            debug!(
                generation,
                finished,
                reason = reason.as_deref().unwrap_or("script exhausted"),
                "Demo playback ended"
            );
        });
        info!(generation, "Demo playback started");
        self.demo_cancel = Some(token);
    }

    fn cancel_demo(&mut self, reason: &str) {
        if let Some(token) = self.demo_cancel.take() {
            token.cancel(reason);
            // Events already queued by the old playback must not apply.
            self.demo_generation += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProjectionConfig;
    use crate::core::StageStatus;
    use crate::events::CollectingEventSink;
    use crate::testing::assertions::{assert_initial, assert_stage};
    use crate::testing::fixtures;
    use crate::transport::InMemoryTransport;
    use std::time::Duration;

    fn spawn() -> (ControllerHandle, Arc<InMemoryTransport>) {
        let transport = Arc::new(InMemoryTransport::new());
        let controller = WorkflowController::new(
            ProjectionConfig::default(),
            transport.clone(),
            Arc::new(CollectingEventSink::new()),
        )
        .unwrap();
        (ControllerHandle::spawn(controller), transport)
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_nudges_active_stage() {
        let (handle, _) = spawn();
        handle
            .apply_event(fixtures::progress_event("code_developer", 40))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(1600)).await;
        let data = handle.workflow_data().await.unwrap();
        let progress = data.stage(StageId::CodeGeneration).unwrap().progress;
        assert!((41..=45).contains(&progress), "progress was {progress}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_idle_without_active_stage() {
        let (handle, _) = spawn();
        handle
            .apply_event(fixtures::progress_event("story_writer", 100))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_secs(10)).await;
        let data = handle.workflow_data().await.unwrap();
        assert_stage(&data, StageId::StoryGeneration, StageStatus::Completed, 100);
        assert_eq!(data.overall_progress, 20);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_demo_completes() {
        let (handle, _) = spawn();
        handle.run_demo().await.unwrap();

        tokio::time::sleep(Duration::from_secs(60)).await;
        let data = handle.workflow_data().await.unwrap();
        assert!(data.is_complete());
        assert_eq!(data.overall_progress, 100);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_cancels_demo() {
        let (handle, _) = spawn();
        handle.run_demo().await.unwrap();
        tokio::time::sleep(Duration::from_millis(700)).await;
        assert!(handle.workflow_data().await.unwrap().has_active_stage());

        handle.reset_workflow().await.unwrap();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_initial(&handle.workflow_data().await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_epic_submission_cancels_demo() {
        let (handle, transport) = spawn();
        handle.run_demo().await.unwrap();
        tokio::time::sleep(Duration::from_millis(700)).await;
        assert!(handle.workflow_data().await.unwrap().has_active_stage());

        assert!(handle.submit_text("start epic APEX-1").await.unwrap());
        assert_eq!(transport.submissions().len(), 1);

        tokio::time::sleep(Duration::from_secs(60)).await;
        let data = handle.workflow_data().await.unwrap();
        assert_initial(&data);
        assert!(!data.is_complete());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_restart_cancels_demo() {
        let (handle, _) = spawn();
        handle.run_demo().await.unwrap();
        tokio::time::sleep(Duration::from_millis(700)).await;

        handle
            .ingest_ui_snapshot(vec![
                fixtures::progress_event("story_writer", 10),
                fixtures::progress_event("story_writer", 20),
            ])
            .await
            .unwrap();
        let notices = handle
            .ingest_ui_snapshot(vec![fixtures::ai_response_event("code_developer", "restarted")])
            .await
            .unwrap();
        assert!(matches!(notices[0], ProjectionNotice::WorkflowReset { .. }));

        tokio::time::sleep(Duration::from_secs(60)).await;
        let data = handle.workflow_data().await.unwrap();
        assert!(data.stages.iter().all(|s| s.status == StageStatus::Pending));
        assert_eq!(data.overall_progress, 0);
        assert_eq!(
            data.stage(StageId::CodeGeneration).unwrap().content.as_deref(),
            Some("restarted")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_restart_idles_ticker() {
        let (handle, _) = spawn();
        handle
            .ingest_ui_snapshot(vec![
                fixtures::progress_event("story_writer", 100),
                fixtures::progress_event("design_architect", 30),
            ])
            .await
            .unwrap();
        handle.ingest_ui_snapshot(Vec::new()).await.unwrap();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_initial(&handle.workflow_data().await.unwrap());
    }

    #[tokio::test]
    async fn test_submit_and_stop_through_handle() {
        let (handle, transport) = spawn();
        assert!(handle.submit_text("start epic APEX-9").await.unwrap());
        assert_eq!(transport.submissions().len(), 1);

        handle.stop().await.unwrap();
        assert_eq!(transport.stop_count(), 1);
    }

    #[tokio::test]
    async fn test_manual_operations_through_handle() {
        let (handle, _) = spawn();
        handle.select_stage(StageId::Testing).await.unwrap();
        handle
            .update_stage_content(StageId::Testing, "manual")
            .await
            .unwrap();
        handle.mark_stage_complete(StageId::StoryGeneration).await.unwrap();
        handle
            .mark_stage_failed(StageId::Deployment, "rollback")
            .await
            .unwrap();

        let data = handle.workflow_data().await.unwrap();
        assert_eq!(data.current_stage, Some(StageId::Testing));
        assert_stage(&data, StageId::StoryGeneration, StageStatus::Completed, 100);
        assert_eq!(
            data.stage(StageId::Deployment).map(|s| s.status),
            Some(StageStatus::Failed)
        );
    }

    #[tokio::test]
    async fn test_calls_fail_after_shutdown() {
        let (handle, _) = spawn();
        let commands = handle.commands.clone();
        handle.shutdown().await;

        let (tx, _rx) = oneshot::channel();
        assert!(commands.send(Command::PlayDemo(tx)).await.is_err());
    }
}
