//! The aggregate workflow view.

use crate::core::{Stage, StageId, StageStatus};
use serde::{Deserialize, Serialize};

/// Returns the fixed initial stage list, all pending.
#[must_use]
pub fn initial_stages() -> Vec<Stage> {
    StageId::ALL.iter().copied().map(Stage::new).collect()
}

/// Ordered stages plus the selected stage and overall progress.
///
/// Owned by the projection engine; the display layer only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowData {
    /// Stages in pipeline order. Cardinality never changes.
    pub stages: Vec<Stage>,
    /// Stage the display should focus on.
    #[serde(with = "current_stage_serde")]
    pub current_stage: Option<StageId>,
    /// Aggregate completion, 0-100.
    pub overall_progress: u8,
}

impl Default for WorkflowData {
    fn default() -> Self {
        Self {
            stages: initial_stages(),
            current_stage: None,
            overall_progress: 0,
        }
    }
}

impl WorkflowData {
    /// Creates the initial workflow.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a stage.
    #[must_use]
    pub fn stage(&self, id: StageId) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id == id)
    }

    /// Looks up a stage mutably.
    pub fn stage_mut(&mut self, id: StageId) -> Option<&mut Stage> {
        self.stages.iter_mut().find(|s| s.id == id)
    }

    /// Stages currently active.
    pub fn active_stages(&self) -> impl Iterator<Item = &Stage> {
        self.stages
            .iter()
            .filter(|s| s.status == StageStatus::Active)
    }

    /// Returns true if any stage is active.
    #[must_use]
    pub fn has_active_stage(&self) -> bool {
        self.active_stages().next().is_some()
    }

    /// Returns true once every stage is completed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.stages
            .iter()
            .all(|s| s.status == StageStatus::Completed)
    }
}

/// `currentStage` is an empty string on the wire when nothing is selected.
mod current_stage_serde {
    use crate::core::StageId;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<StageId>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(value.map_or("", |id| id.as_str()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<StageId>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if s.is_empty() {
            return Ok(None);
        }
        s.parse().map(Some).map_err(serde::de::Error::custom)
    }
}
