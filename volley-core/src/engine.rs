//! Load engine interface
//!
//! The orchestrator only depends on this trait, so the HTTP engine can be
//! replaced by a scripted one in tests.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::results::RunResults;
use crate::spec::RunSpec;

/// Errors reported by a load engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid header {header:?}: {reason}")]
    InvalidHeader { header: String, reason: String },

    #[error("http client error: {0}")]
    Client(String),

    #[error("run failed: {0}")]
    Run(String),
}

/// A load generator able to execute a [`RunSpec`]
#[async_trait]
pub trait LoadEngine: Send + Sync {
    /// Launch check, run synchronously before a run is accepted.
    ///
    /// Anything that would make the run fail immediately belongs here so that
    /// async callers get the error in the reply rather than in the job record.
    fn prepare(&self, spec: &RunSpec) -> Result<(), EngineError>;

    /// Execute the run until its bound is reached or `cancel` fires.
    ///
    /// A cancelled run still returns the results gathered so far.
    async fn run(&self, spec: Arc<RunSpec>, cancel: CancellationToken) -> Result<RunResults, EngineError>;
}
