//! Narrow seam for the external completion dependency of a stage.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// Prompt in, text out. A production implementation delegates to an LLM
/// API and must respect `timeout`; the sequencer additionally bounds the
/// whole stage call, so a misbehaving provider cannot hang a sprint.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(
        &self,
        system_prompt: &str,
        prompt: &str,
        timeout: Duration,
    ) -> Result<String>;
}

/// Deterministic offline provider standing in for a real completion call.
///
/// Stages use it for the free-text portions of their output (agent notes);
/// the structural parts of each partial update are computed by the stage
/// itself.
#[derive(Debug, Clone, Default)]
pub struct ScriptedProvider;

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(
        &self,
        _system_prompt: &str,
        prompt: &str,
        _timeout: Duration,
    ) -> Result<String> {
        let subject = prompt.lines().next().unwrap_or("the current task");
        Ok(format!(
            "I have reviewed the sprint state and completed my part: {subject}"
        ))
    }
}
