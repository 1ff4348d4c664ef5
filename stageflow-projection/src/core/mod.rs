//! Core data model: stages, statuses and the workflow aggregate.

mod stage;
mod status;
mod workflow;

pub use stage::{
    CodeFile, DeploymentInfo, FileKind, Priority, Stage, StageId, StagePayload, Story,
    TestCase, TestOutcome,
};
pub use status::StageStatus;
pub use workflow::{initial_stages, WorkflowData};
