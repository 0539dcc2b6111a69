//! Error types for run orchestration

use thiserror::Error;
use volley_core::{EngineError, ErrorPayload, ResolveError};

/// Errors surfaced by [`crate::RunOrchestrator::execute`]
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// The run request cannot be executed as asked
    #[error(transparent)]
    Rejected(#[from] ResolveError),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("error saving result: {0}")]
    Store(#[from] StoreError),
}

impl OrchestratorError {
    /// Short stable classification used as the `Error` field
    pub fn classification(&self) -> String {
        match self {
            OrchestratorError::Rejected(err) => err.classification(),
            OrchestratorError::Engine(_) => "engine error".to_string(),
            OrchestratorError::Store(_) => "error saving result".to_string(),
        }
    }

    /// Underlying cause used as the `Exception` field
    pub fn detail(&self) -> String {
        match self {
            OrchestratorError::Rejected(err) => err.detail(),
            OrchestratorError::Engine(err) => err.to_string(),
            OrchestratorError::Store(err) => err.to_string(),
        }
    }

    pub fn payload(&self) -> ErrorPayload {
        ErrorPayload::new(self.classification(), self.detail())
    }
}

/// Failure to persist a run result
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("cannot write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot serialize result: {0}")]
    Serialize(#[from] serde_json::Error),
}
