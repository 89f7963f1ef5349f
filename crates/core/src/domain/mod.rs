mod state;
mod story;

pub use state::{ArtifactKind, ArtifactRecord, Message, SprintState, StateUpdate};
pub use story::{StoryStatus, UserStory};
