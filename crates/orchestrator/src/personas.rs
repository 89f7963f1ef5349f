//! Persona (system prompt) loading for the role agents.

use std::path::PathBuf;

use crate::stages::AgentRole;

/// Loads the system prompt for a role from a directory of markdown files.
///
/// Lookup tries `<dir>/<display name>.md` first, then the snake_case
/// fallback (`<dir>/<role name lowercased, spaces as underscores>.md`).
/// A missing file is not an error; the store substitutes a generic prompt
/// so a sprint never fails on persona configuration.
#[derive(Debug, Clone, Default)]
pub struct PersonaStore {
    dir: Option<PathBuf>,
}

impl PersonaStore {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    pub async fn load(&self, role: AgentRole) -> String {
        if let Some(ref dir) = self.dir {
            let candidates = [
                dir.join(format!("{}.md", role.display_name())),
                dir.join(format!("{}.md", role.persona_key())),
            ];
            for path in candidates {
                match tokio::fs::read_to_string(&path).await {
                    Ok(content) => return content,
                    Err(_) => continue,
                }
            }
            tracing::debug!(
                role = role.display_name(),
                dir = %dir.display(),
                "No persona file found, using default prompt"
            );
        }
        Self::default_prompt(role)
    }

    fn default_prompt(role: AgentRole) -> String {
        format!("You are the {} of the Scrum team.", role.display_name())
    }
}
