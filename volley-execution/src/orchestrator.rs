//! Sync and async execution of validated runs

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};
use volley_core::{LoadEngine, ResolveError, RunResults, RunSpec};

use crate::error::OrchestratorError;
use crate::registry::{JobRecord, JobRegistry, JobStatus};
use crate::store::ResultStore;

/// What [`RunOrchestrator::execute`] produced
#[derive(Debug, Clone)]
pub enum Outcome {
    /// A synchronous run finished with these results
    Completed(RunResults),
    /// An asynchronous run was registered and continues in the background
    Accepted(JobRecord),
}

/// Drives runs through the engine and the job registry.
///
/// Synchronous runs are awaited and never registered. Asynchronous runs are
/// registered as `started` and handed to a background task that owns the
/// engine call and reports progress through registry updates.
pub struct RunOrchestrator {
    engine: Arc<dyn LoadEngine>,
    registry: Arc<JobRegistry>,
    store: ResultStore,
    tasks: TaskTracker,
    shutdown: CancellationToken,
}

impl RunOrchestrator {
    pub fn new(engine: Arc<dyn LoadEngine>, registry: Arc<JobRegistry>, store: ResultStore) -> Self {
        Self {
            engine,
            registry,
            store,
            tasks: TaskTracker::new(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    /// Execute `spec` inline or in the background depending on its async flag
    pub async fn execute(&self, spec: RunSpec) -> Result<Outcome, OrchestratorError> {
        if !spec.run_async && spec.runs_until_stopped() {
            return Err(ResolveError::validation(
                "duration 'on' requires async mode",
                "a run that only ends when stopped must be started with async=on",
            )
            .into());
        }

        // Launch failures are reported to the caller in both modes
        self.engine.prepare(&spec).inspect_err(|e| warn!("Run rejected by engine: {}", e))?;

        let spec = Arc::new(spec);
        if spec.run_async {
            Ok(Outcome::Accepted(self.start_background(spec)))
        } else {
            self.run_inline(spec).await.map(Outcome::Completed)
        }
    }

    async fn run_inline(&self, spec: Arc<RunSpec>) -> Result<RunResults, OrchestratorError> {
        info!("Running {} synchronously", spec.url);
        let mut results = self
            .engine
            .run(spec.clone(), self.shutdown.child_token())
            .await
            .inspect_err(|e| error!("Run against {} failed: {}", spec.url, e))?;

        if spec.save {
            self.store.save(&mut results).await?;
        }
        Ok(results)
    }

    fn start_background(&self, spec: Arc<RunSpec>) -> JobRecord {
        let record = self.registry.register(spec.clone());
        info!("Starting run {} against {} in the background", record.run_id, spec.url);

        self.tasks.spawn(run_job(
            self.engine.clone(),
            self.registry.clone(),
            self.store.clone(),
            record.run_id,
            spec,
            record.cancel_token(),
        ));
        record
    }

    /// Stop every background run and wait for them to record their outcome
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let stopped = self.registry.stop_all();
        info!("Shutting down orchestrator, {} run(s) stopped", stopped);
        self.tasks.close();
        self.tasks.wait().await;
    }
}

async fn run_job(
    engine: Arc<dyn LoadEngine>,
    registry: Arc<JobRegistry>,
    store: ResultStore,
    run_id: u64,
    spec: Arc<RunSpec>,
    cancel: CancellationToken,
) {
    registry.update(run_id, JobStatus::Running, None);

    let mut results = match engine.run(spec.clone(), cancel).await {
        Ok(results) => results,
        Err(e) => {
            error!("Run {} failed: {}", run_id, e);
            registry.fail(run_id, e.to_string());
            return;
        }
    };

    let status = if results.stopped_early {
        JobStatus::Stopped
    } else {
        JobStatus::Completed
    };

    let saved = if spec.save {
        store.save(&mut results).await.map(Some)
    } else {
        Ok(None)
    };
    registry.update(run_id, status, Some(results));

    match saved {
        Ok(_) => info!("Run {} {}", run_id, status),
        Err(e) => {
            error!("Run {} finished but its result was not saved: {}", run_id, e);
            registry.fail(run_id, e.to_string());
        }
    }
}
