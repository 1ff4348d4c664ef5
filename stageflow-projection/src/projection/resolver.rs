//! Agent identifier to stage lookup.

use crate::core::StageId;
use std::collections::HashMap;

/// Agent table used by the pipeline's agents.
const DEFAULT_AGENTS: [(&str, StageId); 7] = [
    ("story_writer", StageId::StoryGeneration),
    ("design_architect", StageId::DesignGeneration),
    ("code_developer", StageId::CodeGeneration),
    ("test_engineer", StageId::Testing),
    ("deployment_manager", StageId::Deployment),
    ("deployment_specialist", StageId::Deployment),
    ("supervisor", StageId::StoryGeneration),
];

/// Maps agent identifiers to stages.
///
/// Lookup is total: unknown agents resolve to the fallback stage so that
/// no event is ever dropped for want of a mapping.
#[derive(Debug, Clone)]
pub struct AgentStageResolver {
    table: HashMap<String, StageId>,
    fallback: StageId,
}

impl Default for AgentStageResolver {
    fn default() -> Self {
        Self {
            table: DEFAULT_AGENTS
                .iter()
                .map(|(agent, stage)| ((*agent).to_string(), *stage))
                .collect(),
            fallback: StageId::ALL[0],
        }
    }
}

impl AgentStageResolver {
    /// Creates a resolver with the standard agent table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces mappings. Keys are normalized like lookups.
    #[must_use]
    pub fn with_overrides<'a, I>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a StageId)>,
    {
        for (agent, stage) in overrides {
            self.table.insert(normalize(agent), *stage);
        }
        self
    }

    /// Resolves an agent to its stage.
    #[must_use]
    pub fn resolve(&self, agent_id: &str) -> StageId {
        self.table
            .get(&normalize(agent_id))
            .copied()
            .unwrap_or(self.fallback)
    }

    /// Returns true if the agent has an explicit mapping.
    #[must_use]
    pub fn is_known(&self, agent_id: &str) -> bool {
        self.table.contains_key(&normalize(agent_id))
    }
}

fn normalize(agent_id: &str) -> String {
    agent_id.trim().to_lowercase()
}
