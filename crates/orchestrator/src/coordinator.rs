//! Session coordinator: maps session ids to live sprint runs.
//!
//! The registry is the only resource shared across sessions; each entry is
//! inserted on `create_session` and removed exactly once, on teardown or on
//! run completion, whichever comes first.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use events::{EventBus, EventEnvelope};
use tokio::sync::broadcast;
use tracing::{error, info};
use uuid::Uuid;

use crate::error::{OrchestratorError, Result};
use crate::personas::PersonaStore;
use crate::provider::CompletionProvider;
use crate::sequencer::{SequencerConfig, SprintSequencer};
use crate::stages::StageContext;

pub type SessionId = Uuid;

struct SessionEntry {
    bus: EventBus,
    cancelled: Arc<AtomicBool>,
}

/// Creates, tracks and tears down sprint sessions.
///
/// Clone-able handle; all clones share one registry. Per-session state is
/// exclusively owned by that session's sequencer task, so the registry lock
/// only guards insert/lookup/remove.
#[derive(Clone)]
pub struct SessionCoordinator {
    sessions: Arc<RwLock<HashMap<SessionId, SessionEntry>>>,
    provider: Arc<dyn CompletionProvider>,
    personas: Arc<PersonaStore>,
    config: SequencerConfig,
}

impl SessionCoordinator {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        personas: PersonaStore,
        config: SequencerConfig,
    ) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            provider,
            personas: Arc::new(personas),
            config,
        }
    }

    /// Validate the goal, register a session and start its sequencer run.
    ///
    /// The returned receiver is subscribed before the run is spawned, so a
    /// caller that created the session sees every event from the start.
    /// An empty goal is rejected before anything is created.
    pub fn create_session(
        &self,
        goal: &str,
    ) -> Result<(SessionId, broadcast::Receiver<EventEnvelope>)> {
        let goal = goal.trim().to_string();
        if goal.is_empty() {
            return Err(OrchestratorError::EmptyGoal);
        }

        let session_id = Uuid::new_v4();
        let bus = EventBus::new();
        let rx = bus.subscribe();

        let ctx = StageContext::new(
            Arc::clone(&self.provider),
            Arc::clone(&self.personas),
            provider_budget(&self.config),
        );
        let sequencer = SprintSequencer::new(bus.clone(), ctx, self.config.clone());
        let cancelled = sequencer.cancel_flag();

        {
            let mut sessions = self.sessions.write().expect("session registry poisoned");
            sessions.insert(
                session_id,
                SessionEntry {
                    bus,
                    cancelled,
                },
            );
        }

        info!(session_id = %session_id, goal = %goal, "Session created");

        let registry = Arc::clone(&self.sessions);
        tokio::spawn(async move {
            match sequencer.run(&goal).await {
                Ok(_) => info!(session_id = %session_id, "Sprint run finished"),
                Err(OrchestratorError::Cancelled) => {
                    info!(session_id = %session_id, "Sprint run cancelled")
                }
                Err(err) => error!(session_id = %session_id, error = %err, "Sprint run failed"),
            }
            // Completion-side removal; a concurrent teardown may have won.
            if let Ok(mut sessions) = registry.write() {
                sessions.remove(&session_id);
            }
        });

        Ok((session_id, rx))
    }

    /// Stop a session at its next phase boundary and release its channel.
    pub fn teardown(&self, session_id: SessionId) -> Result<()> {
        let mut sessions = self.sessions.write().expect("session registry poisoned");
        match sessions.remove(&session_id) {
            Some(entry) => {
                entry.cancelled.store(true, Ordering::SeqCst);
                info!(session_id = %session_id, "Session torn down");
                Ok(())
            }
            None => Err(OrchestratorError::SessionNotFound(session_id)),
        }
    }

    /// Attach another observer to a running session.
    pub fn subscribe(
        &self,
        session_id: SessionId,
    ) -> Result<broadcast::Receiver<EventEnvelope>> {
        let sessions = self.sessions.read().expect("session registry poisoned");
        sessions
            .get(&session_id)
            .map(|entry| entry.bus.subscribe())
            .ok_or(OrchestratorError::SessionNotFound(session_id))
    }

    pub fn contains(&self, session_id: SessionId) -> bool {
        self.sessions
            .read()
            .expect("session registry poisoned")
            .contains_key(&session_id)
    }

    pub fn active_count(&self) -> usize {
        self.sessions
            .read()
            .expect("session registry poisoned")
            .len()
    }

    pub fn session_ids(&self) -> Vec<SessionId> {
        self.sessions
            .read()
            .expect("session registry poisoned")
            .keys()
            .copied()
            .collect()
    }
}

/// A single completion call gets most of the stage budget; the remainder
/// covers the stage's own bookkeeping.
fn provider_budget(config: &SequencerConfig) -> Duration {
    config.stage_timeout.mul_f32(0.9)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ScriptedProvider;
    use async_trait::async_trait;
    use events::Event;
    use tokio::sync::Notify;

    fn scripted_coordinator() -> SessionCoordinator {
        SessionCoordinator::new(
            Arc::new(ScriptedProvider),
            PersonaStore::new(None),
            SequencerConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_session_runs_to_completion() {
        let coordinator = scripted_coordinator();
        let (_id, mut rx) = coordinator.create_session("A health check API").unwrap();

        let mut saw_complete = false;
        while let Ok(envelope) = rx.recv().await {
            if let Event::Complete { success } = envelope.event {
                assert!(success);
                saw_complete = true;
                break;
            }
        }
        assert!(saw_complete);

        // The run removes its own registry entry after the terminal event.
        for _ in 0..100 {
            if coordinator.active_count() == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("session entry was not retired");
    }

    #[tokio::test]
    async fn test_empty_goal_creates_nothing() {
        let coordinator = scripted_coordinator();

        let err = coordinator.create_session("").unwrap_err();

        assert!(matches!(err, OrchestratorError::EmptyGoal));
        assert_eq!(coordinator.active_count(), 0);
    }

    #[tokio::test]
    async fn test_teardown_unknown_session() {
        let coordinator = scripted_coordinator();
        let err = coordinator.teardown(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, OrchestratorError::SessionNotFound(_)));
    }

    /// Provider that blocks until released, keeping the run in planning.
    struct GatedProvider {
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl CompletionProvider for GatedProvider {
        async fn complete(&self, _: &str, _: &str, _: Duration) -> crate::error::Result<String> {
            self.gate.notified().await;
            Ok("released".to_string())
        }
    }

    #[tokio::test]
    async fn test_teardown_removes_entry_exactly_once() {
        let gate = Arc::new(Notify::new());
        let coordinator = SessionCoordinator::new(
            Arc::new(GatedProvider { gate: Arc::clone(&gate) }),
            PersonaStore::new(None),
            SequencerConfig::default(),
        );

        let (id, _rx) = coordinator.create_session("A health check API").unwrap();
        assert!(coordinator.contains(id));

        coordinator.teardown(id).unwrap();
        assert!(!coordinator.contains(id));

        let err = coordinator.teardown(id).unwrap_err();
        assert!(matches!(err, OrchestratorError::SessionNotFound(_)));

        gate.notify_waiters();
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let coordinator = scripted_coordinator();

        let (id_a, mut rx_a) = coordinator.create_session("goal a").unwrap();
        let (id_b, mut rx_b) = coordinator.create_session("goal b").unwrap();
        assert_ne!(id_a, id_b);

        // Both observers see their own terminal event.
        for rx in [&mut rx_a, &mut rx_b] {
            let mut done = false;
            while let Ok(envelope) = rx.recv().await {
                if envelope.event.is_terminal() {
                    done = true;
                    break;
                }
            }
            assert!(done);
        }
    }

    #[tokio::test]
    async fn test_subscribe_unknown_session() {
        let coordinator = scripted_coordinator();
        let err = coordinator.subscribe(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, OrchestratorError::SessionNotFound(_)));
    }
}
