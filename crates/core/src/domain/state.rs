use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::CoreError;

use super::story::{StoryStatus, UserStory};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Design,
    Code,
    Test,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Design => "design",
            Self::Code => "code",
            Self::Test => "test",
        }
    }
}

/// A named deliverable produced by a stage (design doc, source file,
/// test report, ...). Stored in the sprint state under its artifact name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ArtifactRecord {
    pub kind: ArtifactKind,
    pub title: String,
    pub preview: String,
    pub content: String,
}

impl ArtifactRecord {
    pub fn new(
        kind: ArtifactKind,
        title: impl Into<String>,
        preview: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            title: title.into(),
            preview: preview.into(),
            content: content.into(),
        }
    }
}

/// One entry in the inter-agent message history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct Message {
    pub author: String,
    pub content: String,
}

impl Message {
    pub fn new(author: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            content: content.into(),
        }
    }
}

/// Sparse delta returned by a stage. Absent fields mean "no change".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateUpdate {
    /// Full replacement backlog. A stage intending a partial edit must
    /// return the entire backlog with only the intended items changed.
    pub backlog: Option<Vec<UserStory>>,
    pub current_story_id: Option<String>,
    pub artifacts: BTreeMap<String, ArtifactRecord>,
    pub messages: Vec<Message>,
    pub blockers: Vec<String>,
    pub is_complete: Option<bool>,
}

impl StateUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backlog(mut self, backlog: Vec<UserStory>) -> Self {
        self.backlog = Some(backlog);
        self
    }

    pub fn with_artifact(mut self, name: impl Into<String>, artifact: ArtifactRecord) -> Self {
        self.artifacts.insert(name.into(), artifact);
        self
    }

    pub fn with_message(mut self, author: impl Into<String>, content: impl Into<String>) -> Self {
        self.messages.push(Message::new(author, content));
        self
    }

    pub fn with_blocker(mut self, blocker: impl Into<String>) -> Self {
        self.blockers.push(blocker.into());
        self
    }

    pub fn with_complete(mut self, complete: bool) -> Self {
        self.is_complete = Some(complete);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.backlog.is_none()
            && self.current_story_id.is_none()
            && self.artifacts.is_empty()
            && self.messages.is_empty()
            && self.blockers.is_empty()
            && self.is_complete.is_none()
    }
}

/// The single shared aggregate threaded through every sprint phase.
///
/// The sequencer owns the state exclusively for the sprint's duration and
/// folds each stage's [`StateUpdate`] in via [`SprintState::apply`]. Once
/// `is_complete` is set the state is handed off read-only.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SprintState {
    sprint_goal: String,
    pub backlog: Vec<UserStory>,
    pub current_story_id: Option<String>,
    pub artifacts: BTreeMap<String, ArtifactRecord>,
    pub messages: Vec<Message>,
    pub blockers: Vec<String>,
    pub is_complete: bool,
}

impl SprintState {
    pub fn new(goal: impl Into<String>) -> Self {
        Self {
            sprint_goal: goal.into(),
            backlog: Vec::new(),
            current_story_id: None,
            artifacts: BTreeMap::new(),
            messages: Vec::new(),
            blockers: Vec::new(),
            is_complete: false,
        }
    }

    /// The goal is fixed at sprint start; there is deliberately no setter.
    pub fn sprint_goal(&self) -> &str {
        &self.sprint_goal
    }

    pub fn story(&self, id: &str) -> Option<&UserStory> {
        self.backlog.iter().find(|s| s.id == id)
    }

    /// Fold a stage's partial update into the state.
    ///
    /// Per-field rules:
    /// - `artifacts`: key union, later writes overwrite same-key values,
    ///   previously-present keys are never removed.
    /// - `messages`: appended in application order.
    /// - `blockers`: appended, never removed.
    /// - `backlog`: whole-field replace, rejected if it drops an existing
    ///   story id, regresses a story's status, or contains duplicate ids.
    /// - `current_story_id`: replace when present.
    /// - `is_complete`: replace when present, monotonic once true.
    pub fn apply(&mut self, update: StateUpdate) -> Result<(), CoreError> {
        if let Some(ref backlog) = update.backlog {
            self.validate_backlog(backlog)?;
        }
        if update.is_complete == Some(false) && self.is_complete {
            return Err(CoreError::CompletionReverted);
        }

        // All checks passed; from here the merge cannot partially fail.
        if let Some(backlog) = update.backlog {
            self.backlog = backlog;
        }
        if let Some(id) = update.current_story_id {
            self.current_story_id = Some(id);
        }
        for (name, artifact) in update.artifacts {
            self.artifacts.insert(name, artifact);
        }
        self.messages.extend(update.messages);
        self.blockers.extend(update.blockers);
        if let Some(complete) = update.is_complete {
            self.is_complete = complete;
        }
        Ok(())
    }

    fn validate_backlog(&self, incoming: &[UserStory]) -> Result<(), CoreError> {
        let mut seen = HashSet::new();
        for story in incoming {
            if !seen.insert(story.id.as_str()) {
                return Err(CoreError::DuplicateStoryId(story.id.clone()));
            }
        }

        for existing in &self.backlog {
            let Some(replacement) = incoming.iter().find(|s| s.id == existing.id) else {
                return Err(CoreError::BacklogDroppedStory(existing.id.clone()));
            };
            if replacement.status < existing.status {
                return Err(CoreError::StatusRegression {
                    id: existing.id.clone(),
                    from: existing.status.as_str().to_string(),
                    to: replacement.status.as_str().to_string(),
                });
            }
        }
        Ok(())
    }
}
