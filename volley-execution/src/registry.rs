//! In-memory registry of asynchronous runs

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use volley_core::{RunResults, RunSpec};

/// Lifecycle of an asynchronous run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Started,
    Running,
    Completed,
    Failed,
    Stopped,
}

impl JobStatus {
    /// True until the run has ended one way or another
    pub fn is_active(&self) -> bool {
        matches!(self, JobStatus::Started | JobStatus::Running)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Started => "started",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

fn serialize_spec<S>(spec: &Arc<RunSpec>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    spec.as_ref().serialize(serializer)
}

/// Snapshot of one asynchronous run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct JobRecord {
    #[serde(rename = "RunID")]
    pub run_id: u64,
    pub created: DateTime<Utc>,
    #[serde(serialize_with = "serialize_spec")]
    pub spec: Arc<RunSpec>,
    pub status: JobStatus,
    pub result: Option<RunResults>,
    pub error: Option<String>,
    /// Id of the saved result file, when saving was requested
    #[serde(rename = "ResultID", skip_serializing_if = "Option::is_none")]
    pub result_id: Option<String>,
    #[serde(skip)]
    cancel: CancellationToken,
}

impl JobRecord {
    /// Token that stops this run when cancelled
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

#[derive(Debug, Default)]
struct RegistryState {
    next_id: u64,
    jobs: BTreeMap<u64, JobRecord>,
}

/// Concurrency-safe store of job records keyed by run id.
///
/// Ids start at 1, strictly increase and are never reused. Every operation
/// takes the lock once, so id allocation and insertion are a single step.
#[derive(Debug)]
pub struct JobRegistry {
    state: Mutex<RegistryState>,
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl JobRegistry {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RegistryState {
                next_id: 1,
                jobs: BTreeMap::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        // Poisoning is ignored, writes are single field assignments
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Allocate the next id and record the run as `started`
    pub fn register(&self, spec: Arc<RunSpec>) -> JobRecord {
        let mut state = self.lock();
        let run_id = state.next_id;
        state.next_id += 1;

        let record = JobRecord {
            run_id,
            created: Utc::now(),
            spec,
            status: JobStatus::Started,
            result: None,
            error: None,
            result_id: None,
            cancel: CancellationToken::new(),
        };
        state.jobs.insert(run_id, record.clone());
        debug!("Registered run {}", run_id);
        record
    }

    /// Set the status of a run, attaching a result when one is given
    pub fn update(&self, run_id: u64, status: JobStatus, result: Option<RunResults>) -> Option<JobRecord> {
        let mut state = self.lock();
        let record = state.jobs.get_mut(&run_id)?;
        record.status = status;
        if let Some(result) = result {
            if result.id.is_some() {
                record.result_id = result.id.clone();
            }
            record.result = Some(result);
        }
        debug!("Run {} is now {}", run_id, status);
        Some(record.clone())
    }

    /// Mark a run as failed with the error detail
    pub fn fail(&self, run_id: u64, detail: impl Into<String>) -> Option<JobRecord> {
        let mut state = self.lock();
        let record = state.jobs.get_mut(&run_id)?;
        record.status = JobStatus::Failed;
        record.error = Some(detail.into());
        Some(record.clone())
    }

    pub fn get(&self, run_id: u64) -> Option<JobRecord> {
        self.lock().jobs.get(&run_id).cloned()
    }

    /// Every record, ordered by run id
    pub fn list(&self) -> Vec<JobRecord> {
        self.lock().jobs.values().cloned().collect()
    }

    /// Number of runs that have not ended yet
    pub fn active_count(&self) -> usize {
        self.lock().jobs.values().filter(|r| r.status.is_active()).count()
    }

    /// Signal one run to stop.
    ///
    /// Returns `None` for an unknown id, otherwise whether a still active run
    /// was signalled.
    pub fn stop(&self, run_id: u64) -> Option<bool> {
        let state = self.lock();
        let record = state.jobs.get(&run_id)?;
        let signalled = record.status.is_active() && !record.cancel.is_cancelled();
        if signalled {
            record.cancel.cancel();
            info!("Stop requested for run {}", run_id);
        }
        Some(signalled)
    }

    /// Signal every active run to stop, returning how many were signalled
    pub fn stop_all(&self) -> usize {
        let state = self.lock();
        let mut stopped = 0;
        for record in state.jobs.values() {
            if record.status.is_active() && !record.cancel.is_cancelled() {
                record.cancel.cancel();
                stopped += 1;
            }
        }
        if stopped > 0 {
            info!("Stop requested for {} run(s)", stopped);
        }
        stopped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn spec() -> Arc<RunSpec> {
        Arc::new(RunSpec::for_url("http://localhost/"))
    }

    #[test]
    fn test_ids_start_at_one_and_increase() {
        let registry = JobRegistry::new();
        let a = registry.register(spec());
        let b = registry.register(spec());
        assert_eq!(a.run_id, 1);
        assert_eq!(b.run_id, 2);
        assert_eq!(a.status, JobStatus::Started);
        assert_eq!(registry.list().iter().map(|r| r.run_id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_update_and_fail() {
        let registry = JobRegistry::new();
        let id = registry.register(spec()).run_id;

        registry.update(id, JobStatus::Running, None).unwrap();
        assert_eq!(registry.get(id).unwrap().status, JobStatus::Running);

        let result = RunResults {
            id: Some("2026-10-17-101500_smoke".to_string()),
            ..Default::default()
        };
        let record = registry.update(id, JobStatus::Completed, Some(result)).unwrap();
        assert_eq!(record.result_id.as_deref(), Some("2026-10-17-101500_smoke"));
        assert!(record.result.is_some());

        let record = registry.fail(id, "boom").unwrap();
        assert_eq!(record.status, JobStatus::Failed);
        assert_eq!(record.error.as_deref(), Some("boom"));

        assert!(registry.update(99, JobStatus::Running, None).is_none());
        assert!(registry.get(99).is_none());
    }

    #[test]
    fn test_stop_signals_token_once() {
        let registry = JobRegistry::new();
        let record = registry.register(spec());
        let token = record.cancel_token();

        assert_eq!(registry.stop(record.run_id), Some(true));
        assert!(token.is_cancelled());
        assert_eq!(registry.stop(record.run_id), Some(false));
        assert_eq!(registry.stop(42), None);
    }

    #[test]
    fn test_stop_all_skips_finished_runs() {
        let registry = JobRegistry::new();
        let done = registry.register(spec()).run_id;
        registry.update(done, JobStatus::Completed, None);
        let running = registry.register(spec());
        let started = registry.register(spec());

        assert_eq!(registry.active_count(), 2);
        assert_eq!(registry.stop_all(), 2);
        assert!(running.cancel_token().is_cancelled());
        assert!(started.cancel_token().is_cancelled());
        assert!(!registry.get(done).unwrap().cancel_token().is_cancelled());
        assert_eq!(registry.stop_all(), 0);
    }

    #[test]
    fn test_concurrent_registration_yields_distinct_contiguous_ids() {
        let registry = Arc::new(JobRegistry::new());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    (0..25)
                        .map(|_| registry.register(spec()).run_id)
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let ids: BTreeSet<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        assert_eq!(ids.len(), 400);
        assert_eq!(ids.iter().copied().collect::<Vec<_>>(), (1..=400).collect::<Vec<_>>());
    }

    #[test]
    fn test_record_serialization() {
        let registry = JobRegistry::new();
        let record = registry.register(spec());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["RunID"], 1);
        assert_eq!(json["Status"], "started");
        assert_eq!(json["Spec"]["URL"], "http://localhost/");
        assert!(json["Result"].is_null());
        assert!(json.get("ResultID").is_none());
    }
}
