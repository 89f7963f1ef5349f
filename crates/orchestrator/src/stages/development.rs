//! Development and QA, folded into one stage: the Developer implements the
//! active story, QA runs tests against the merged code.

use async_trait::async_trait;
use sprint_core::{ArtifactKind, ArtifactRecord, SprintState, StateUpdate, StoryStatus};

use crate::error::{OrchestratorError, Result};

use super::{AgentRole, Stage, StageContext};

pub struct DevelopmentStage;

const AGENTS: &[AgentRole] = &[AgentRole::Developer, AgentRole::Qa];

#[async_trait]
impl Stage for DevelopmentStage {
    fn agents(&self) -> &'static [AgentRole] {
        AGENTS
    }

    fn thought(&self) -> &'static str {
        "Writing code..."
    }

    fn log_line(&self) -> &'static str {
        "Implementing the active story..."
    }

    async fn produce(&self, state: &SprintState, ctx: &StageContext) -> Result<StateUpdate> {
        let story_id = state
            .current_story_id
            .as_deref()
            .ok_or_else(|| OrchestratorError::StoryNotFound("<none selected>".to_string()))?;

        // A dangling story reference is a hard failure, not a silent no-op.
        if state.story(story_id).is_none() {
            return Err(OrchestratorError::StoryNotFound(story_id.to_string()));
        }

        let code = format!(
            "# Implementation for {story_id}\ndef handler():\n    return {{\"status\": \"ok\"}}\n"
        );
        let test_report = format!(
            "Tests for {story_id}: 100% PASS\n- Unit test: OK\n- Integration test: OK"
        );

        // Full replacement backlog with only the target story advanced.
        let backlog = state
            .backlog
            .iter()
            .cloned()
            .map(|mut story| {
                if story.id == story_id {
                    story.status = StoryStatus::Done;
                }
                story
            })
            .collect();

        let dev_note = ctx
            .agent_note(
                AgentRole::Developer,
                &format!("Implement the story {story_id}"),
            )
            .await?;
        let qa_note = ctx
            .agent_note(
                AgentRole::Qa,
                &format!("Run the test suite against the implementation of {story_id}"),
            )
            .await?;

        Ok(StateUpdate::new()
            .with_backlog(backlog)
            .with_artifact(
                "source_code",
                ArtifactRecord::new(ArtifactKind::Code, "main.py", "main.py", code),
            )
            .with_artifact(
                "test_report",
                ArtifactRecord::new(ArtifactKind::Test, "Test Report", "100% PASS", test_report),
            )
            .with_message(AgentRole::Developer.display_name(), dev_note)
            .with_message(AgentRole::Qa.display_name(), qa_note)
            .with_message(
                AgentRole::ScrumMaster.display_name(),
                format!("Development and QA completed for {story_id}. 100% test pass."),
            ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::testutil::scripted_context;
    use sprint_core::UserStory;

    fn planned_state() -> SprintState {
        let mut state = SprintState::new("A health check API");
        state
            .apply(
                StateUpdate::new().with_backlog(vec![
                    UserStory::new("STORY-001", "Health check", "As a user..."),
                    UserStory::new("STORY-002", "Metrics", "As an operator..."),
                ]),
            )
            .unwrap();
        state.current_story_id = Some("STORY-001".to_string());
        state
    }

    #[tokio::test]
    async fn test_development_advances_only_target_story() {
        let state = planned_state();
        let update = DevelopmentStage
            .produce(&state, &scripted_context())
            .await
            .unwrap();

        let backlog = update.backlog.as_ref().unwrap();
        assert_eq!(backlog[0].status, StoryStatus::Done);
        assert_eq!(backlog[1].status, StoryStatus::Todo);
    }

    #[tokio::test]
    async fn test_development_produces_code_and_test_artifacts() {
        let state = planned_state();
        let update = DevelopmentStage
            .produce(&state, &scripted_context())
            .await
            .unwrap();

        assert_eq!(update.artifacts["source_code"].kind, ArtifactKind::Code);
        assert_eq!(update.artifacts["test_report"].kind, ArtifactKind::Test);
        assert!(update.artifacts["test_report"].content.contains("100% PASS"));
    }

    #[tokio::test]
    async fn test_dangling_story_id_is_not_found() {
        let mut state = planned_state();
        state.current_story_id = Some("STORY-999".to_string());

        let err = DevelopmentStage
            .produce(&state, &scripted_context())
            .await
            .unwrap_err();

        assert!(matches!(err, OrchestratorError::StoryNotFound(id) if id == "STORY-999"));
    }

    #[tokio::test]
    async fn test_missing_current_story_is_not_found() {
        let mut state = planned_state();
        state.current_story_id = None;

        let err = DevelopmentStage
            .produce(&state, &scripted_context())
            .await
            .unwrap_err();

        assert!(matches!(err, OrchestratorError::StoryNotFound(_)));
    }
}
