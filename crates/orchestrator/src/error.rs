use sprint_core::CoreError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Sprint goal must not be empty")]
    EmptyGoal,

    #[error("Invalid phase transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Planning produced an empty backlog")]
    EmptyBacklog,

    #[error("Story not found in backlog: {0}")]
    StoryNotFound(String),

    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("Stage {role} failed: {reason}")]
    StageFailed { role: String, reason: String },

    #[error("Stage {role} timed out after {seconds}s")]
    StageTimeout { role: String, seconds: u64 },

    #[error("Completion provider error: {0}")]
    Provider(String),

    #[error("Sprint run cancelled")]
    Cancelled,

    #[error(transparent)]
    State(#[from] CoreError),
}

impl OrchestratorError {
    /// Create a stage failure error.
    pub fn stage_failed(role: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::StageFailed {
            role: role.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OrchestratorError::StoryNotFound("STORY-042".to_string());
        assert!(err.to_string().contains("STORY-042"));

        let err = OrchestratorError::stage_failed("Developer", "provider unavailable");
        assert!(err.to_string().contains("Developer"));
    }

    #[test]
    fn test_core_error_conversion() {
        let core = CoreError::BacklogDroppedStory("STORY-001".to_string());
        let err: OrchestratorError = core.into();
        assert!(matches!(err, OrchestratorError::State(_)));
    }
}
