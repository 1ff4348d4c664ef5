use crate::detection::{EpicTracker, IdentifierDetector};
use crate::events::{EventKind, WorkflowEvent};
use crate::messages::{Message, MessageRole};
use std::collections::HashSet;
use tracing::debug;

/// Transient display state derived from the event and message streams.
#[derive(Debug, Clone)]
pub struct SessionTrackers {
    latest_progress: Option<WorkflowEvent>,
    ai_responses: Vec<WorkflowEvent>,
    seen_responses: HashSet<String>,
    last_ai_message_id: Option<String>,
    epics: EpicTracker,
}

impl Default for SessionTrackers {
    fn default() -> Self {
        Self::new(IdentifierDetector::new())
    }
}

impl SessionTrackers {
    /// Creates empty trackers using `detector` for work-item detection.
    #[must_use]
    pub fn new(detector: IdentifierDetector) -> Self {
        Self {
            latest_progress: None,
            ai_responses: Vec::new(),
            seen_responses: HashSet::new(),
            last_ai_message_id: None,
            epics: EpicTracker::new(detector),
        }
    }

    /// Records a classified event.
    ///
    /// `progress` events replace the progress bubble; `ai_response` events
    /// are appended unless one with the same key was already recorded.
    pub fn track(&mut self, event: &WorkflowEvent) {
        match event.kind {
            EventKind::Progress => self.latest_progress = Some(event.clone()),
            EventKind::AiResponse => {
                if self.seen_responses.insert(event.dedup_key()) {
                    self.ai_responses.push(event.clone());
                }
            }
            EventKind::ContentReady => {}
        }
    }

    /// Clears the progress bubble when a new assistant message has arrived.
    ///
    /// Returns true if a new assistant message was seen.
    pub fn observe_messages(&mut self, messages: &[Message]) -> bool {
        let Some(last_ai) = messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::Assistant)
        else {
            return false;
        };
        if last_ai.id == self.last_ai_message_id {
            return false;
        }
        debug!(message_id = ?last_ai.id, "Assistant message arrived, clearing progress");
        self.last_ai_message_id.clone_from(&last_ai.id);
        self.latest_progress = None;
        true
    }

    /// Scans user input for a work-item identifier.
    ///
    /// On a new identifier, recorded agent output is cleared and the
    /// identifier is returned.
    pub fn observe_input(&mut self, text: &str) -> Option<String> {
        let id = self.epics.observe(text)?;
        self.latest_progress = None;
        self.ai_responses.clear();
        self.seen_responses.clear();
        Some(id)
    }

    /// True unless an agent response from `agent` has been recorded.
    #[must_use]
    pub fn should_show_progress_for_agent(&self, agent: &str) -> bool {
        !self.ai_responses.iter().any(|e| e.agent_id == agent)
    }

    /// The progress event to display, if any.
    #[must_use]
    pub fn progress_bubble(&self) -> Option<&WorkflowEvent> {
        self.latest_progress
            .as_ref()
            .filter(|e| self.should_show_progress_for_agent(&e.agent_id))
    }

    /// The latest progress event, regardless of agent responses.
    #[must_use]
    pub fn latest_progress(&self) -> Option<&WorkflowEvent> {
        self.latest_progress.as_ref()
    }

    /// Recorded agent responses in arrival order.
    #[must_use]
    pub fn ai_responses(&self) -> &[WorkflowEvent] {
        &self.ai_responses
    }

    /// The last work-item identifier seen in user input.
    #[must_use]
    pub fn current_epic(&self) -> Option<&str> {
        self.epics.last()
    }

    /// Forgets the progress bubble and the last assistant message, as on
    /// a new submission.
    pub fn clear_progress(&mut self) {
        self.latest_progress = None;
        self.last_ai_message_id = None;
    }

    /// Records `id` as the current work item.
    pub fn remember_epic(&mut self, id: impl Into<String>) {
        self.epics.remember(id);
    }

    /// Returns to the initial state, forgetting the work item too.
    pub fn reset(&mut self) {
        self.clear_progress();
        self.ai_responses.clear();
        self.seen_responses.clear();
        self.epics.clear();
    }
}
