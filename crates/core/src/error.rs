use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Merge would drop story from backlog: {0}")]
    BacklogDroppedStory(String),

    #[error("Story {id} status regression from {from} to {to}")]
    StatusRegression {
        id: String,
        from: String,
        to: String,
    },

    #[error("Duplicate story id in backlog: {0}")]
    DuplicateStoryId(String),

    #[error("Sprint completion flag cannot be reverted")]
    CompletionReverted,

    #[error("Validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = CoreError::BacklogDroppedStory("STORY-001".to_string());
        assert!(error.to_string().contains("STORY-001"));
    }
}
