use std::path::PathBuf;
use std::sync::Arc;

use orchestrator::{
    CompletionProvider, PersonaStore, ScriptedProvider, SequencerConfig, SessionCoordinator,
};

#[derive(Clone)]
pub struct AppState {
    pub coordinator: SessionCoordinator,
}

impl AppState {
    /// State for a server backed by the scripted provider.
    pub fn new(persona_dir: Option<PathBuf>) -> Self {
        Self::with_provider(Arc::new(ScriptedProvider), persona_dir)
    }

    pub fn with_provider(
        provider: Arc<dyn CompletionProvider>,
        persona_dir: Option<PathBuf>,
    ) -> Self {
        let coordinator = SessionCoordinator::new(
            provider,
            PersonaStore::new(persona_dir),
            SequencerConfig::default(),
        );
        Self { coordinator }
    }
}
