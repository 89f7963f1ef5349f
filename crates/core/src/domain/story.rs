use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle of a backlog story within one sprint.
///
/// The ordering is meaningful: a story only ever moves forward, and the
/// merge rules in [`super::SprintState`] reject any update that would move
/// a story back.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum StoryStatus {
    #[default]
    Todo,
    InProgress,
    Review,
    Done,
}

impl StoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Review => "review",
            Self::Done => "done",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "todo" => Some(Self::Todo),
            "in_progress" => Some(Self::InProgress),
            "review" => Some(Self::Review),
            "done" => Some(Self::Done),
            _ => None,
        }
    }
}

/// A single backlog entry, owned by whichever stage holds the current phase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct UserStory {
    pub id: String,
    pub title: String,
    pub description: String,
    pub acceptance_criteria: Vec<String>,
    pub status: StoryStatus,
    /// Complexity score, non-negative (Fibonacci-ish by convention).
    pub complexity: u32,
}

impl UserStory {
    pub fn new(id: impl Into<String>, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            acceptance_criteria: Vec::new(),
            status: StoryStatus::default(),
            complexity: 0,
        }
    }

    pub fn with_acceptance_criteria(mut self, criteria: Vec<String>) -> Self {
        self.acceptance_criteria = criteria;
        self
    }

    pub fn with_status(mut self, status: StoryStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_complexity(mut self, complexity: u32) -> Self {
        self.complexity = complexity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_story_creation() {
        let story = UserStory::new("STORY-001", "Health check", "As a user...");

        assert_eq!(story.id, "STORY-001");
        assert_eq!(story.status, StoryStatus::Todo);
        assert!(story.acceptance_criteria.is_empty());
        assert_eq!(story.complexity, 0);
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(StoryStatus::Todo.as_str(), "todo");
        assert_eq!(StoryStatus::InProgress.as_str(), "in_progress");
        assert_eq!(StoryStatus::Done.as_str(), "done");
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!(StoryStatus::parse("todo"), Some(StoryStatus::Todo));
        assert_eq!(StoryStatus::parse("review"), Some(StoryStatus::Review));
        assert_eq!(StoryStatus::parse("invalid"), None);
    }

    #[test]
    fn test_status_ordering_is_monotonic() {
        assert!(StoryStatus::Todo < StoryStatus::InProgress);
        assert!(StoryStatus::InProgress < StoryStatus::Review);
        assert!(StoryStatus::Review < StoryStatus::Done);
    }

    #[test]
    fn test_story_builder() {
        let story = UserStory::new("STORY-002", "Test", "Desc")
            .with_status(StoryStatus::Done)
            .with_complexity(3)
            .with_acceptance_criteria(vec!["works".to_string()]);

        assert_eq!(story.status, StoryStatus::Done);
        assert_eq!(story.complexity, 3);
        assert_eq!(story.acceptance_criteria.len(), 1);
    }
}
