//! Shared state handed to every handler

use std::sync::Arc;
use volley_execution::{JobRegistry, RunOrchestrator};

/// Handler state: the orchestrator owns the engine, the registry and the store
#[derive(Clone)]
pub struct AppContext {
    pub orchestrator: Arc<RunOrchestrator>,
}

impl AppContext {
    pub fn new(orchestrator: Arc<RunOrchestrator>) -> Self {
        Self { orchestrator }
    }

    pub fn registry(&self) -> &JobRegistry {
        self.orchestrator.registry()
    }
}
