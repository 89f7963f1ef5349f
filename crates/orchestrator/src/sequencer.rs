//! The phase sequencer: drives the stages in fixed order, applies their
//! partial updates through the merge rules and emits update events.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use events::{AgentStatus, Event, EventBus, EventEnvelope};
use sprint_core::{SprintState, StateUpdate};
use tracing::{debug, info};

use crate::error::{OrchestratorError, Result};
use crate::stages::{DevelopmentStage, PlanningStage, RetroStage, Stage, StageContext, Velocity};
use crate::state_machine::{PhaseStateMachine, SprintPhase};

/// Tuning for one sequencer run.
#[derive(Debug, Clone)]
pub struct SequencerConfig {
    /// Bound on a single stage invocation, external completion included.
    pub stage_timeout: Duration,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            stage_timeout: Duration::from_secs(30),
        }
    }
}

/// Runs one sprint from `Created` to `Completed` (or `Failed`).
///
/// The sequencer owns the [`SprintState`] exclusively for the run's
/// duration. Event emission goes through the session's [`EventBus`] and is
/// never allowed to block or abort the run; a stalled or absent observer
/// only means dropped events.
pub struct SprintSequencer {
    bus: EventBus,
    ctx: StageContext,
    config: SequencerConfig,
    cancelled: Arc<AtomicBool>,
    phase: SprintPhase,
}

impl SprintSequencer {
    pub fn new(bus: EventBus, ctx: StageContext, config: SequencerConfig) -> Self {
        Self {
            bus,
            ctx,
            config,
            cancelled: Arc::new(AtomicBool::new(false)),
            phase: SprintPhase::Created,
        }
    }

    /// Flag observed between stage invocations; setting it stops the run
    /// at the next phase boundary without emitting further events.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn phase(&self) -> SprintPhase {
        self.phase
    }

    /// Execute the full phase sequence for `goal`.
    ///
    /// On success the returned state has `is_complete == true` and the
    /// stream carried exactly one `Complete` event. On failure the stream
    /// carried exactly one `Error` event and the error is returned. A
    /// cancelled run stops silently.
    pub async fn run(mut self, goal: &str) -> Result<SprintState> {
        match self.run_inner(goal).await {
            Ok(state) => Ok(state),
            Err(OrchestratorError::Cancelled) => {
                info!(phase = self.phase.as_str(), "Sprint run cancelled");
                Err(OrchestratorError::Cancelled)
            }
            Err(err) => {
                self.phase = SprintPhase::Failed;
                self.emit(Event::Error {
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    async fn run_inner(&mut self, goal: &str) -> Result<SprintState> {
        let goal = goal.trim();
        if goal.is_empty() {
            return Err(OrchestratorError::EmptyGoal);
        }

        let mut state = SprintState::new(goal);

        self.advance(SprintPhase::Planning)?;
        self.emit(Event::log(
            "System",
            format!("Sprint started with goal: \"{goal}\""),
        ));

        self.run_stage(&PlanningStage, &mut state).await?;
        if state.backlog.is_empty() {
            return Err(OrchestratorError::EmptyBacklog);
        }
        // The sequencer, not the planning stage, selects the active story.
        let first_story = state.backlog[0].id.clone();
        state.apply(StateUpdate {
            current_story_id: Some(first_story),
            ..StateUpdate::default()
        })?;

        self.advance(SprintPhase::Development)?;
        self.run_stage(&DevelopmentStage, &mut state).await?;

        self.advance(SprintPhase::Retro)?;
        self.run_stage(&RetroStage, &mut state).await?;

        self.advance(SprintPhase::Completed)?;
        let velocity = Velocity::of(&state);
        self.emit(Event::log(
            "System",
            "Sprint retrospective complete. Ready for next cycle.",
        ));
        self.emit(Event::Complete {
            success: velocity.is_success(),
        });

        info!(
            goal = goal,
            velocity = %velocity,
            "Sprint completed"
        );
        Ok(state)
    }

    /// Invoke one stage against an immutable snapshot of the state, then
    /// fold its update in and surface the transition as events.
    async fn run_stage(&mut self, stage: &dyn Stage, state: &mut SprintState) -> Result<()> {
        if self.cancelled.load(Ordering::SeqCst) {
            return Err(OrchestratorError::Cancelled);
        }

        let primary = stage.agents()[0];
        for (i, role) in stage.agents().iter().enumerate() {
            let thought = (i == 0).then(|| stage.thought().to_string());
            self.emit(Event::agent_update(
                role.agent_id(),
                role.display_name(),
                AgentStatus::Active,
                thought,
            ));
        }
        self.emit(Event::log(primary.display_name(), stage.log_line()));

        let produced = tokio::time::timeout(self.config.stage_timeout, stage.produce(state, &self.ctx))
            .await
            .map_err(|_| OrchestratorError::StageTimeout {
                role: primary.display_name().to_string(),
                seconds: self.config.stage_timeout.as_secs(),
            })??;

        // Events reflect exactly what the merge accepted, so snapshot the
        // delta before applying it.
        let artifacts: Vec<_> = produced.artifacts.values().cloned().collect();
        let messages = produced.messages.clone();
        state.apply(produced)?;

        for artifact in artifacts {
            self.emit(Event::artifact(
                artifact.title,
                artifact.kind,
                artifact.preview,
                artifact.content,
            ));
        }
        for message in messages {
            self.emit(Event::log(message.author, message.content));
        }

        for role in stage.agents() {
            self.emit(Event::agent_update(
                role.agent_id(),
                role.display_name(),
                AgentStatus::Done,
                None,
            ));
        }
        Ok(())
    }

    fn advance(&mut self, to: SprintPhase) -> Result<()> {
        PhaseStateMachine::validate_transition(self.phase, to)?;
        self.phase = to;
        Ok(())
    }

    fn emit(&self, event: Event) {
        let delivered = self.bus.publish(EventEnvelope::new(event));
        if delivered == 0 {
            // No observer; the event is dropped by design.
            debug!(phase = self.phase.as_str(), "Update event dropped, no subscriber");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::personas::PersonaStore;
    use crate::provider::{CompletionProvider, ScriptedProvider};
    use async_trait::async_trait;
    use sprint_core::StoryStatus;
    use tokio::sync::broadcast::Receiver;

    fn scripted_sequencer(bus: EventBus) -> SprintSequencer {
        let ctx = StageContext::new(
            Arc::new(ScriptedProvider),
            Arc::new(PersonaStore::new(None)),
            Duration::from_secs(5),
        );
        SprintSequencer::new(bus, ctx, SequencerConfig::default())
    }

    async fn drain(rx: &mut Receiver<EventEnvelope>) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(envelope) = rx.try_recv() {
            events.push(envelope.event);
        }
        events
    }

    #[tokio::test]
    async fn test_full_run_completes_with_all_artifacts() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let sequencer = scripted_sequencer(bus);

        let state = sequencer.run("A health check API").await.unwrap();

        assert!(state.is_complete);
        for key in [
            "technical_design",
            "source_code",
            "test_report",
            "final_sprint_report",
        ] {
            assert!(state.artifacts.contains_key(key), "missing artifact {key}");
        }
        assert_eq!(state.backlog.len(), 1);
        assert_eq!(state.backlog[0].status, StoryStatus::Done);

        let report = &state.artifacts["final_sprint_report"];
        assert!(report.content.contains("1/1"));
        assert!(report.content.contains("SUCCESS"));

        let events = drain(&mut rx).await;
        let terminals: Vec<_> = events.iter().filter(|e| e.is_terminal()).collect();
        assert_eq!(terminals.len(), 1);
        assert!(matches!(events.last(), Some(Event::Complete { success: true })));
    }

    #[tokio::test]
    async fn test_events_arrive_in_phase_order() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let sequencer = scripted_sequencer(bus);

        sequencer.run("A health check API").await.unwrap();
        let events = drain(&mut rx).await;

        // First activation per agent id, in emission order.
        let mut activations = Vec::new();
        for event in &events {
            if let Event::AgentUpdate { agent_id, status: AgentStatus::Active, .. } = event {
                if !activations.contains(agent_id) {
                    activations.push(agent_id.clone());
                }
            }
        }
        assert_eq!(activations, vec!["po", "arch", "dev", "qa", "sm"]);
    }

    #[tokio::test]
    async fn test_empty_goal_rejected_without_events() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let sequencer = scripted_sequencer(bus);

        let err = sequencer.run("   ").await.unwrap_err();

        assert!(matches!(err, OrchestratorError::EmptyGoal));
        // Validation failures surface one Error event and nothing else.
        let events = drain(&mut rx).await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Event::Error { .. }));
    }

    struct FailingProvider;

    #[async_trait]
    impl CompletionProvider for FailingProvider {
        async fn complete(&self, _: &str, _: &str, _: Duration) -> crate::error::Result<String> {
            Err(OrchestratorError::Provider("upstream unavailable".to_string()))
        }
    }

    #[tokio::test]
    async fn test_stage_failure_emits_exactly_one_error_event() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let ctx = StageContext::new(
            Arc::new(FailingProvider),
            Arc::new(PersonaStore::new(None)),
            Duration::from_secs(5),
        );
        let sequencer = SprintSequencer::new(bus, ctx, SequencerConfig::default());

        let err = sequencer.run("A health check API").await.unwrap_err();
        assert!(matches!(err, OrchestratorError::Provider(_)));

        let events = drain(&mut rx).await;
        let errors = events
            .iter()
            .filter(|e| matches!(e, Event::Error { .. }))
            .count();
        assert_eq!(errors, 1);
        assert!(!events.iter().any(|e| matches!(e, Event::Complete { .. })));
        // The error terminates the stream.
        assert!(events.last().unwrap().is_terminal());
    }

    struct HangingProvider;

    #[async_trait]
    impl CompletionProvider for HangingProvider {
        async fn complete(&self, _: &str, _: &str, _: Duration) -> crate::error::Result<String> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_stage_times_out_and_fails() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let ctx = StageContext::new(
            Arc::new(HangingProvider),
            Arc::new(PersonaStore::new(None)),
            Duration::from_millis(50),
        );
        let config = SequencerConfig {
            stage_timeout: Duration::from_millis(50),
        };
        let sequencer = SprintSequencer::new(bus, ctx, config);

        let err = sequencer.run("A health check API").await.unwrap_err();
        assert!(matches!(err, OrchestratorError::StageTimeout { .. }));

        let events = drain(&mut rx).await;
        assert!(matches!(events.last(), Some(Event::Error { .. })));
    }

    #[tokio::test]
    async fn test_cancelled_run_stops_silently() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let sequencer = scripted_sequencer(bus);
        sequencer.cancel_flag().store(true, Ordering::SeqCst);

        let err = sequencer.run("A health check API").await.unwrap_err();
        assert!(matches!(err, OrchestratorError::Cancelled));

        let events = drain(&mut rx).await;
        assert!(!events.iter().any(|e| e.is_terminal()));
    }
}
