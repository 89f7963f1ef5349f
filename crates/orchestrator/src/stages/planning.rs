//! Sprint planning: the Product Owner populates the backlog and the
//! Architect signs off a design artifact.

use async_trait::async_trait;
use sprint_core::{ArtifactKind, ArtifactRecord, SprintState, StateUpdate, UserStory};

use crate::error::Result;

use super::{AgentRole, Stage, StageContext};

pub struct PlanningStage;

const AGENTS: &[AgentRole] = &[AgentRole::ProductOwner, AgentRole::Architect];

#[async_trait]
impl Stage for PlanningStage {
    fn agents(&self) -> &'static [AgentRole] {
        AGENTS
    }

    fn thought(&self) -> &'static str {
        "Analyzing requirements..."
    }

    fn log_line(&self) -> &'static str {
        "Breaking down the goal into user stories..."
    }

    async fn produce(&self, state: &SprintState, ctx: &StageContext) -> Result<StateUpdate> {
        let goal = state.sprint_goal();

        let story = UserStory::new(
            "STORY-001",
            format!("Implementation for {goal}"),
            format!("As a user, I want the system to {goal}."),
        )
        .with_acceptance_criteria(vec![
            "Functionality works".to_string(),
            "Code is clean".to_string(),
        ])
        .with_complexity(3);

        let design = format!(
            "# Technical Design for {goal}\n- Architecture: RESTful\n- Validation: PASS"
        );

        let po_note = ctx
            .agent_note(
                AgentRole::ProductOwner,
                &format!("Break down the sprint goal into user stories: {goal}"),
            )
            .await?;
        let arch_note = ctx
            .agent_note(
                AgentRole::Architect,
                &format!("Review the backlog and validate feasibility for: {goal}"),
            )
            .await?;

        Ok(StateUpdate::new()
            .with_backlog(vec![story])
            .with_artifact(
                "technical_design",
                ArtifactRecord::new(
                    ArtifactKind::Design,
                    "Technical Design",
                    "RESTful architecture",
                    design,
                ),
            )
            .with_message(AgentRole::ProductOwner.display_name(), po_note)
            .with_message(AgentRole::Architect.display_name(), arch_note)
            .with_message(
                AgentRole::ScrumMaster.display_name(),
                "Sprint Planning completed. Backlog is ready.",
            ))
    }
}
