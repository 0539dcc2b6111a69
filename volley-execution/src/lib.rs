//! # Volley Execution
//!
//! Run orchestration on top of the [`volley_core::LoadEngine`] contract:
//!
//! - [`JobRegistry`] tracks asynchronous runs under monotonically increasing ids
//! - [`RunOrchestrator`] executes runs inline or as background jobs
//! - [`ResultStore`] saves results to the data directory on request

pub mod error;
pub mod orchestrator;
pub mod registry;
pub mod store;

pub use error::{OrchestratorError, StoreError};
pub use orchestrator::{Outcome, RunOrchestrator};
pub use registry::{JobRecord, JobRegistry, JobStatus};
pub use store::{result_id, ResultStore};
