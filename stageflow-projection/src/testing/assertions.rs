//! Assertions on workflow state.

use crate::core::{StageId, StageStatus, WorkflowData};
use crate::projection::check_invariants;

/// Asserts that the workflow invariants hold.
pub fn assert_invariants(data: &WorkflowData) {
    if let Err(err) = check_invariants(data) {
        panic!("Workflow invariant broken: {err}");
    }
}

/// Asserts that `stage` is the only active stage.
pub fn assert_single_active(data: &WorkflowData, stage: StageId) {
    let active: Vec<StageId> = data.active_stages().map(|s| s.id).collect();
    assert_eq!(
        active,
        vec![stage],
        "Expected {stage} to be the only active stage, got {active:?}"
    );
}

/// Asserts a stage's status and progress.
pub fn assert_stage(data: &WorkflowData, stage: StageId, status: StageStatus, progress: u8) {
    let Some(actual) = data.stage(stage) else {
        panic!("Stage {stage} missing from workflow");
    };
    assert_eq!(
        (actual.status, actual.progress),
        (status, progress),
        "Unexpected state for {stage}"
    );
}

/// Asserts that the workflow equals the initial state.
pub fn assert_initial(data: &WorkflowData) {
    assert_eq!(
        *data,
        WorkflowData::new(),
        "Expected the initial workflow"
    );
}
