//! Pipeline stage identity, state and stage-typed payloads.

use crate::core::StageStatus;
use crate::errors::ProjectionError;
use crate::events::StageData;
use crate::utils::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of one step of the fixed pipeline.
///
/// Declaration order is pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    /// Requirements analysis and user stories.
    StoryGeneration,
    /// UI/UX design and architecture.
    DesignGeneration,
    /// Code implementation.
    CodeGeneration,
    /// Quality assurance.
    Testing,
    /// Production deployment.
    Deployment,
}

impl StageId {
    /// All stages in pipeline order.
    pub const ALL: [StageId; 5] = [
        StageId::StoryGeneration,
        StageId::DesignGeneration,
        StageId::CodeGeneration,
        StageId::Testing,
        StageId::Deployment,
    ];

    /// Returns the wire identifier.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StoryGeneration => "story_generation",
            Self::DesignGeneration => "design_generation",
            Self::CodeGeneration => "code_generation",
            Self::Testing => "testing",
            Self::Deployment => "deployment",
        }
    }

    /// Position of the stage in the pipeline.
    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            Self::StoryGeneration => 0,
            Self::DesignGeneration => 1,
            Self::CodeGeneration => 2,
            Self::Testing => 3,
            Self::Deployment => 4,
        }
    }

    /// Short display name.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::StoryGeneration => "Analyze",
            Self::DesignGeneration => "Design",
            Self::CodeGeneration => "Code",
            Self::Testing => "Test",
            Self::Deployment => "Deploy",
        }
    }

    /// One-line description of the stage.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::StoryGeneration => "Requirements analysis & user stories",
            Self::DesignGeneration => "UI/UX design & architecture",
            Self::CodeGeneration => "Code implementation & development",
            Self::Testing => "Quality assurance & testing",
            Self::Deployment => "Production deployment & launch",
        }
    }

    /// Human-readable name of the agent that normally drives the stage.
    #[must_use]
    pub fn default_agent_name(&self) -> &'static str {
        match self {
            Self::StoryGeneration => "Story Writer",
            Self::DesignGeneration => "Design Architect",
            Self::CodeGeneration => "Code Developer",
            Self::Testing => "Test Engineer",
            Self::Deployment => "Deployment Manager",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StageId {
    type Err = ProjectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| ProjectionError::UnknownStage(s.to_string()))
    }
}

/// Priority shared by stories and test cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Priority {
    /// High priority.
    High,
    /// Medium priority.
    #[default]
    Medium,
    /// Low priority.
    Low,
}

/// A user story produced by the analysis stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Story {
    /// Local identifier.
    pub id: String,
    /// Work-item key in the tracker (e.g. `APEX-101`).
    pub jira_id: String,
    /// Story title.
    pub title: String,
    /// Story description.
    pub description: String,
    /// Acceptance criteria, in order.
    pub acceptance_criteria: Vec<String>,
    /// Story priority.
    pub priority: Priority,
    /// Estimate, if given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story_points: Option<u32>,
}

/// Whether a [`CodeFile`] node is a file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// A regular file.
    #[default]
    File,
    /// A directory with children.
    Directory,
}

/// A node of the generated file tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CodeFile {
    /// Node identifier.
    pub id: String,
    /// File or directory name.
    pub name: String,
    /// Absolute path within the generated project.
    pub path: String,
    /// Node kind.
    #[serde(rename = "type")]
    pub kind: FileKind,
    /// Size in bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Source language.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// File contents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Children of a directory node.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CodeFile>,
}

impl CodeFile {
    /// Counts file (non-directory) nodes in this subtree.
    #[must_use]
    pub fn file_count(&self) -> usize {
        match self.kind {
            FileKind::File => 1,
            FileKind::Directory => self.children.iter().map(Self::file_count).sum(),
        }
    }
}

/// Outcome of a test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TestOutcome {
    /// Test passed.
    Pass,
    /// Test failed.
    Fail,
    /// Test not yet run.
    #[default]
    Pending,
}

/// A test case produced by the testing stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TestCase {
    /// Test identifier.
    pub id: String,
    /// Test name.
    pub name: String,
    /// What the test covers.
    pub description: String,
    /// Steps, in order.
    pub steps: Vec<String>,
    /// Expected result.
    pub expected_result: String,
    /// Test outcome.
    pub status: TestOutcome,
    /// Test priority.
    pub priority: Priority,
}

/// Deployment record produced by the deployment stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DeploymentInfo {
    /// Target environment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    /// Deployment status reported by the agent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Public URL of the deployment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Free-text notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Any other fields the agent attached.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Stage-typed output content.
///
/// Each stage carries exactly the variant matching its [`StageId`].
/// Fields are `None` until an event supplies them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StagePayload {
    /// Requirements produced by the analysis stage.
    #[serde(rename_all = "camelCase")]
    StoryGeneration {
        /// User stories.
        stories: Option<Vec<Story>>,
    },
    /// Design document.
    #[serde(rename_all = "camelCase")]
    DesignGeneration {
        /// Markdown design text.
        design_content: Option<String>,
    },
    /// Generated source tree.
    #[serde(rename_all = "camelCase")]
    CodeGeneration {
        /// Root nodes of the file tree.
        code_files: Option<Vec<CodeFile>>,
    },
    /// Test results.
    #[serde(rename_all = "camelCase")]
    Testing {
        /// Test cases.
        test_cases: Option<Vec<TestCase>>,
        /// Generated test sources.
        test_files: Option<Vec<CodeFile>>,
    },
    /// Deployment outcome.
    #[serde(rename_all = "camelCase")]
    Deployment {
        /// Deployment record.
        deployment_info: Option<DeploymentInfo>,
    },
}

impl StagePayload {
    /// Creates the empty payload for a stage.
    #[must_use]
    pub fn empty(stage: StageId) -> Self {
        match stage {
            StageId::StoryGeneration => Self::StoryGeneration { stories: None },
            StageId::DesignGeneration => Self::DesignGeneration {
                design_content: None,
            },
            StageId::CodeGeneration => Self::CodeGeneration { code_files: None },
            StageId::Testing => Self::Testing {
                test_cases: None,
                test_files: None,
            },
            StageId::Deployment => Self::Deployment {
                deployment_info: None,
            },
        }
    }

    /// Merges the fields of `data` that belong to this stage.
    ///
    /// Fields absent from `data` are left untouched. Returns whether
    /// anything changed.
    pub fn merge(&mut self, data: &StageData) -> bool {
        fn set<T: Clone + PartialEq>(slot: &mut Option<T>, incoming: Option<&T>) -> bool {
            match incoming {
                Some(value) if slot.as_ref() != Some(value) => {
                    *slot = Some(value.clone());
                    true
                }
                _ => false,
            }
        }

        match self {
            Self::StoryGeneration { stories } => set(stories, data.stories.as_ref()),
            Self::DesignGeneration { design_content } => {
                set(design_content, data.design_content.as_ref())
            }
            Self::CodeGeneration { code_files } => set(code_files, data.code_files.as_ref()),
            Self::Testing {
                test_cases,
                test_files,
            } => {
                let cases = set(test_cases, data.test_cases.as_ref());
                let files = set(test_files, data.test_files.as_ref());
                cases || files
            }
            Self::Deployment { deployment_info } => {
                set(deployment_info, data.deployment_info.as_ref())
            }
        }
    }

    /// Returns true if no field has been populated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::StoryGeneration { stories } => stories.is_none(),
            Self::DesignGeneration { design_content } => design_content.is_none(),
            Self::CodeGeneration { code_files } => code_files.is_none(),
            Self::Testing {
                test_cases,
                test_files,
            } => test_cases.is_none() && test_files.is_none(),
            Self::Deployment { deployment_info } => deployment_info.is_none(),
        }
    }
}

/// One step of the pipeline as shown to the display layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    /// Stage identifier.
    pub id: StageId,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Current status.
    pub status: StageStatus,
    /// Completion percentage, 0-100.
    pub progress: u8,
    /// Latest free-text content reported for the stage.
    pub content: Option<String>,
    /// Agent that last reported on the stage.
    pub agent_name: String,
    /// When the stage first left `pending`.
    pub start_time: Option<Timestamp>,
    /// When the stage reached a terminal status.
    pub end_time: Option<Timestamp>,
    /// Stage-typed output.
    pub payload: StagePayload,
}

impl Stage {
    /// Creates the initial pending stage.
    #[must_use]
    pub fn new(id: StageId) -> Self {
        Self {
            id,
            name: id.display_name().to_string(),
            description: id.description().to_string(),
            status: StageStatus::Pending,
            progress: 0,
            content: None,
            agent_name: id.default_agent_name().to_string(),
            start_time: None,
            end_time: None,
            payload: StagePayload::empty(id),
        }
    }

    /// Moves a pending stage to active. Returns true on transition.
    pub fn activate(&mut self, now: Timestamp) -> bool {
        if self.status != StageStatus::Pending {
            return false;
        }
        self.status = StageStatus::Active;
        self.start_time.get_or_insert(now);
        true
    }

    /// Forces the stage to completed at 100%.
    ///
    /// `end_time` is stamped only on the first terminal transition.
    /// Returns true if the status changed.
    pub fn complete(&mut self, now: Timestamp) -> bool {
        let changed = self.status != StageStatus::Completed;
        if self.status == StageStatus::Failed {
            return false;
        }
        self.status = StageStatus::Completed;
        self.progress = 100;
        self.start_time.get_or_insert(now);
        self.end_time.get_or_insert(now);
        changed
    }

    /// Marks the stage failed. Completed stages stay completed.
    pub fn fail(&mut self, now: Timestamp) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = StageStatus::Failed;
        self.start_time.get_or_insert(now);
        self.end_time.get_or_insert(now);
        true
    }

    /// Replaces the content if `content` is non-empty.
    pub fn set_content(&mut self, content: Option<&str>) {
        if let Some(text) = content.filter(|c| !c.is_empty()) {
            self.content = Some(text.to_string());
        }
    }
}
