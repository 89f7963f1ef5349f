//! The fixed phase order a sprint run moves through.

use serde::{Deserialize, Serialize};

use crate::error::{OrchestratorError, Result};

/// Phases of one sprint run. `Failed` is reachable from every
/// non-terminal phase; `Completed` only from `Retro`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SprintPhase {
    #[default]
    Created,
    Planning,
    Development,
    Retro,
    Completed,
    Failed,
}

impl SprintPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Planning => "planning",
            Self::Development => "development",
            Self::Retro => "retro",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created" => Some(Self::Created),
            "planning" => Some(Self::Planning),
            "development" => Some(Self::Development),
            "retro" => Some(Self::Retro),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

pub struct PhaseStateMachine;

impl PhaseStateMachine {
    pub fn validate_transition(from: SprintPhase, to: SprintPhase) -> Result<()> {
        if Self::allowed_transitions(from).contains(&to) {
            Ok(())
        } else {
            Err(OrchestratorError::InvalidTransition {
                from: from.as_str().to_string(),
                to: to.as_str().to_string(),
            })
        }
    }

    fn allowed_transitions(from: SprintPhase) -> Vec<SprintPhase> {
        match from {
            SprintPhase::Created => vec![SprintPhase::Planning, SprintPhase::Failed],
            SprintPhase::Planning => vec![SprintPhase::Development, SprintPhase::Failed],
            SprintPhase::Development => vec![SprintPhase::Retro, SprintPhase::Failed],
            SprintPhase::Retro => vec![SprintPhase::Completed, SprintPhase::Failed],
            SprintPhase::Completed => vec![],
            SprintPhase::Failed => vec![],
        }
    }

    pub fn can_transition(from: SprintPhase, to: SprintPhase) -> bool {
        Self::validate_transition(from, to).is_ok()
    }

    pub fn next_phase(current: SprintPhase) -> Option<SprintPhase> {
        match current {
            SprintPhase::Created => Some(SprintPhase::Planning),
            SprintPhase::Planning => Some(SprintPhase::Development),
            SprintPhase::Development => Some(SprintPhase::Retro),
            SprintPhase::Retro => Some(SprintPhase::Completed),
            SprintPhase::Completed => None,
            SprintPhase::Failed => None,
        }
    }
}
