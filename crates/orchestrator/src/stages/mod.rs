//! Agent stages: pure computations from sprint state to a partial update.

mod development;
mod planning;
mod retro;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sprint_core::{SprintState, StateUpdate};

use crate::error::Result;
use crate::personas::PersonaStore;
use crate::provider::CompletionProvider;

pub use development::DevelopmentStage;
pub use planning::PlanningStage;
pub use retro::{RetroStage, Velocity};

/// The role-specialized agents of the simulated Scrum team.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    ProductOwner,
    Architect,
    Developer,
    Qa,
    ScrumMaster,
}

impl AgentRole {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::ProductOwner => "Product Owner",
            Self::Architect => "Software Architect",
            Self::Developer => "Senior Backend Developer",
            Self::Qa => "QA Engineer",
            Self::ScrumMaster => "Scrum Master",
        }
    }

    /// Short identifier used in agent update events.
    pub fn agent_id(&self) -> &'static str {
        match self {
            Self::ProductOwner => "po",
            Self::Architect => "arch",
            Self::Developer => "dev",
            Self::Qa => "qa",
            Self::ScrumMaster => "sm",
        }
    }

    /// Persona file stem: role name lowercased, spaces as underscores.
    pub fn persona_key(&self) -> String {
        self.display_name().to_lowercase().replace(' ', "_")
    }
}

/// Dependencies a stage may draw on while producing its update.
#[derive(Clone)]
pub struct StageContext {
    pub provider: Arc<dyn CompletionProvider>,
    pub personas: Arc<PersonaStore>,
    /// Budget for a single completion call made by a stage.
    pub provider_timeout: Duration,
}

impl StageContext {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        personas: Arc<PersonaStore>,
        provider_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            personas,
            provider_timeout,
        }
    }

    /// Ask the completion provider for a note from `role`, using the
    /// role's persona as the system prompt.
    pub async fn agent_note(&self, role: AgentRole, prompt: &str) -> Result<String> {
        let persona = self.personas.load(role).await;
        self.provider
            .complete(&persona, prompt, self.provider_timeout)
            .await
    }
}

/// One phase's computation: read-only view of the current state in, sparse
/// delta out. Stages never mutate the state they receive; the sequencer
/// applies the returned update through the merge rules.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Agents acting in this stage; the first entry is the primary one.
    fn agents(&self) -> &'static [AgentRole];

    /// What the primary agent is "thinking" while the stage runs.
    fn thought(&self) -> &'static str;

    /// Progress line logged when the stage starts.
    fn log_line(&self) -> &'static str;

    async fn produce(&self, state: &SprintState, ctx: &StageContext) -> Result<StateUpdate>;
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;
    use crate::provider::ScriptedProvider;

    pub fn scripted_context() -> StageContext {
        StageContext::new(
            Arc::new(ScriptedProvider),
            Arc::new(PersonaStore::new(None)),
            Duration::from_secs(5),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persona_key_convention() {
        assert_eq!(AgentRole::ProductOwner.persona_key(), "product_owner");
        assert_eq!(AgentRole::ScrumMaster.persona_key(), "scrum_master");
        assert_eq!(
            AgentRole::Developer.persona_key(),
            "senior_backend_developer"
        );
    }

    #[test]
    fn test_agent_ids_are_unique() {
        let ids = [
            AgentRole::ProductOwner.agent_id(),
            AgentRole::Architect.agent_id(),
            AgentRole::Developer.agent_id(),
            AgentRole::Qa.agent_id(),
            AgentRole::ScrumMaster.agent_id(),
        ];
        let unique: std::collections::HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
    }
}
