//! Sprint retrospective: the Scrum Master summarizes the backlog, collects
//! artifacts and closes the sprint.

use async_trait::async_trait;
use sprint_core::{ArtifactKind, ArtifactRecord, SprintState, StateUpdate, StoryStatus};

use crate::error::Result;

use super::{AgentRole, Stage, StageContext};

pub struct RetroStage;

const AGENTS: &[AgentRole] = &[AgentRole::ScrumMaster];

/// Velocity summary for a backlog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Velocity {
    pub completed: usize,
    pub total: usize,
}

impl Velocity {
    pub fn of(state: &SprintState) -> Self {
        Self {
            completed: state
                .backlog
                .iter()
                .filter(|s| s.status == StoryStatus::Done)
                .count(),
            total: state.backlog.len(),
        }
    }

    /// An empty backlog is never a success; `0/0` reads as PARTIAL.
    pub fn is_success(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }

    pub fn status_line(&self) -> &'static str {
        if self.is_success() {
            "SUCCESS"
        } else {
            "PARTIAL"
        }
    }
}

impl std::fmt::Display for Velocity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.completed, self.total)
    }
}

#[async_trait]
impl Stage for RetroStage {
    fn agents(&self) -> &'static [AgentRole] {
        AGENTS
    }

    fn thought(&self) -> &'static str {
        "Summarizing the sprint..."
    }

    fn log_line(&self) -> &'static str {
        "Starting Sprint Retrospective and reporting..."
    }

    async fn produce(&self, state: &SprintState, ctx: &StageContext) -> Result<StateUpdate> {
        let velocity = Velocity::of(state);
        let artifact_summary = state
            .artifacts
            .keys()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");

        let report = format!(
            "# Sprint Review Report\n\
             **Goal**: {goal}\n\
             **Status**: {status}\n\
             **Velocity**: {velocity} stories completed\n\n\
             ## Artifacts Produced\n\
             {artifacts}\n\n\
             ## Agent Feedback\n\
             - Product Owner: Requirements were met.\n\
             - Architect: Design was followed.\n\
             - QA: All tests passed.\n",
            goal = state.sprint_goal(),
            status = velocity.status_line(),
            artifacts = if artifact_summary.is_empty() {
                "None".to_string()
            } else {
                artifact_summary
            },
        );

        let sm_note = ctx
            .agent_note(
                AgentRole::ScrumMaster,
                "Summarize the sprint outcome for the stakeholders",
            )
            .await?;

        Ok(StateUpdate::new()
            .with_artifact(
                "final_sprint_report",
                ArtifactRecord::new(
                    ArtifactKind::Design,
                    "Sprint Review Report",
                    format!("{velocity} {}", velocity.status_line()),
                    report,
                ),
            )
            .with_message(AgentRole::ScrumMaster.display_name(), sm_note)
            .with_message(
                AgentRole::ScrumMaster.display_name(),
                "Sprint Retrospective completed. Final report generated.",
            )
            .with_complete(true))
    }
}
