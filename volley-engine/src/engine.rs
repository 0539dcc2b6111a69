//! HTTP load engine.
//!
//! [`HttpLoadEngine::run`] spawns one worker per connection on a
//! [`TaskTracker`], aggregates their samples through a bounded mpsc channel and
//! stops them through a child [`CancellationToken`] when the run's bound is hit.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info};
use volley_core::{format_duration, EngineError, LoadEngine, RunDuration, RunResults, RunSpec};

use crate::config::EngineSettings;
use crate::histogram::Recorder;
use crate::worker::{worker_loop, RequestPlan, Sample, SocketCounter, WorkerBudget};

/// Run type reported in results
pub const RUN_TYPE: &str = "HTTP";

/// Content type sent with a payload when the run does not name one
pub const DEFAULT_PAYLOAD_CONTENT_TYPE: &str = "application/octet-stream";

/// Latency is recorded in microseconds and reported in seconds
const MICROS_PER_SECOND: f64 = 1_000_000.0;

/// Slowest pacing honoured, lower rates are rounded up to it
const MAX_PACING_PERIOD: Duration = Duration::from_secs(3600);

/// Samples buffered per worker before workers wait on the aggregator
const SAMPLES_PER_WORKER: usize = 100;

/// How a run ends on its own
#[derive(Debug, Clone, Copy, PartialEq)]
enum Bound {
    Calls(u64),
    Time(Duration),
    UntilStopped,
}

/// Sample aggregation, owned by a single task
struct Tally {
    latency: Recorder,
    sizes: Recorder,
    ret_codes: BTreeMap<i32, u64>,
}

impl Tally {
    fn new() -> Result<Self, EngineError> {
        Ok(Self {
            latency: Recorder::new()?,
            sizes: Recorder::new()?,
            ret_codes: BTreeMap::new(),
        })
    }

    fn record(&mut self, sample: &Sample) {
        let micros = u64::try_from(sample.latency.as_micros()).unwrap_or(u64::MAX);
        self.latency.record(micros);
        if let Some(size) = sample.size {
            self.sizes.record(size);
        }
        *self.ret_codes.entry(sample.code).or_insert(0) += 1;
    }
}

async fn aggregate(mut sample_rx: mpsc::Receiver<Sample>) -> Result<Tally, EngineError> {
    let mut tally = Tally::new()?;
    while let Some(sample) = sample_rx.recv().await {
        tally.record(&sample);
    }
    Ok(tally)
}

/// Load engine issuing HTTP/1.1 requests with reqwest
#[derive(Debug, Clone, Default)]
pub struct HttpLoadEngine {
    settings: EngineSettings,
}

impl HttpLoadEngine {
    pub fn new(settings: impl Into<EngineSettings>) -> Self {
        Self {
            settings: settings.into(),
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    fn build_plan(&self, spec: &RunSpec) -> Result<RequestPlan, EngineError> {
        let invalid_url = |reason: String| EngineError::InvalidUrl {
            url: spec.url.clone(),
            reason,
        };
        let url = reqwest::Url::parse(&spec.url).map_err(|e| invalid_url(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid_url(format!("unsupported scheme '{}'", url.scheme())));
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(invalid_url("missing host".to_string()));
        }

        let mut headers = HeaderMap::new();
        for (name, value) in spec.header_pairs() {
            let invalid_header = |reason: String| EngineError::InvalidHeader {
                header: format!("{}: {}", name, value),
                reason,
            };
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid_header(e.to_string()))?;
            let value = HeaderValue::from_str(value).map_err(|e| invalid_header(e.to_string()))?;
            headers.append(name, value);
        }

        let content_type = match (&spec.content_type, &spec.payload) {
            (Some(content_type), _) => Some(content_type.as_str()),
            (None, Some(_)) => Some(DEFAULT_PAYLOAD_CONTENT_TYPE),
            (None, None) => None,
        };
        if let Some(content_type) = content_type {
            let value = HeaderValue::from_str(content_type).map_err(|e| EngineError::InvalidHeader {
                header: format!("Content-Type: {}", content_type),
                reason: e.to_string(),
            })?;
            headers.insert(CONTENT_TYPE, value);
        }

        let method = if spec.payload.is_some() { Method::POST } else { Method::GET };

        Ok(RequestPlan {
            url,
            method,
            headers,
            body: spec.payload.clone(),
        })
    }

    fn build_client(&self, spec: &RunSpec) -> Result<Client, EngineError> {
        // One idle connection per worker, so each worker keeps a single socket
        Client::builder()
            .user_agent(&self.settings.user_agent)
            .timeout(spec.timeout.unwrap_or(self.settings.request_timeout))
            .pool_max_idle_per_host(1)
            .http1_only()
            .tcp_nodelay(true)
            .build()
            .map_err(|e| EngineError::Client(e.to_string()))
    }

    fn connections(&self, spec: &RunSpec) -> Result<u32, EngineError> {
        let connections = spec.connections.unwrap_or(self.settings.default_connections).max(1);
        if connections > self.settings.max_connections {
            return Err(EngineError::Run(format!(
                "{} connections exceeds the configured maximum of {}",
                connections, self.settings.max_connections
            )));
        }
        Ok(connections)
    }

    fn bound(&self, spec: &RunSpec) -> Bound {
        match (spec.requests, spec.duration) {
            (Some(calls), _) if calls > 0 => Bound::Calls(calls),
            (_, RunDuration::Default) => Bound::Time(self.settings.default_duration),
            (_, RunDuration::For(duration)) => Bound::Time(duration),
            (_, RunDuration::UntilStopped) => Bound::UntilStopped,
        }
    }
}

/// Interval between calls of one worker when `workers` share `qps`
fn pacing_period(qps: f64, workers: u32) -> Duration {
    Duration::try_from_secs_f64(f64::from(workers) / qps)
        .unwrap_or(MAX_PACING_PERIOD)
        .clamp(Duration::from_nanos(1), MAX_PACING_PERIOD)
}

/// Calls a run makes before ending on its own, if it has a fixed count.
///
/// A time bound at a fixed rate becomes `qps * duration` calls, so the count
/// does not depend on how ticks land against a wall-clock deadline.
fn call_budget(bound: Bound, qps: f64) -> Option<u64> {
    match bound {
        Bound::Calls(calls) => Some(calls),
        Bound::Time(duration) if qps > 0.0 => Some((qps * duration.as_secs_f64()).round() as u64),
        Bound::Time(_) | Bound::UntilStopped => None,
    }
}

/// Split `calls` as evenly as possible over `workers`
fn split_calls(calls: u64, workers: u32, worker: u32) -> u64 {
    let workers = u64::from(workers);
    let worker = u64::from(worker);
    calls / workers + u64::from(worker < calls % workers)
}

#[async_trait]
impl LoadEngine for HttpLoadEngine {
    fn prepare(&self, spec: &RunSpec) -> Result<(), EngineError> {
        self.build_plan(spec)?;
        self.connections(spec)?;
        Ok(())
    }

    async fn run(&self, spec: Arc<RunSpec>, cancel: CancellationToken) -> Result<RunResults, EngineError> {
        let plan = Arc::new(self.build_plan(&spec)?);
        let bound = self.bound(&spec);
        let qps = spec.qps.unwrap_or(self.settings.default_qps);
        let budget = call_budget(bound, qps);

        let mut workers = self.connections(&spec)?;
        if let Some(calls) = budget {
            workers = workers.min(u32::try_from(calls).unwrap_or(u32::MAX)).max(1);
        }
        let period = (qps > 0.0).then(|| pacing_period(qps, workers));

        let clients = (0..workers)
            .map(|_| self.build_client(&spec))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            "Starting {} run against {}: {} worker(s), qps {}, bound {:?}, calls {:?}",
            RUN_TYPE, spec.url, workers, qps, bound, budget
        );

        let run_cancel = cancel.child_token();
        let tracker = TaskTracker::new();
        let sockets = SocketCounter::new();
        let (sample_tx, sample_rx) = mpsc::channel::<Sample>(workers as usize * SAMPLES_PER_WORKER);
        let aggregator = tokio::spawn(aggregate(sample_rx));

        let start_time = Utc::now();
        let started = Instant::now();
        for (worker_id, client) in (0..workers).zip(clients) {
            let worker_budget = WorkerBudget {
                calls: budget.map(|calls| split_calls(calls, workers, worker_id)),
                period,
            };
            tracker.spawn(worker_loop(
                worker_id,
                client,
                plan.clone(),
                worker_budget,
                sample_tx.clone(),
                run_cancel.clone(),
                sockets.clone(),
            ));
        }
        // Workers hold their own clones
        drop(sample_tx);
        tracker.close();

        // Only unpaced time-bounded runs end on a deadline
        let interrupted = match (bound, budget) {
            (Bound::Time(duration), None) => {
                tokio::select! {
                    _ = tokio::time::sleep(duration) => {
                        run_cancel.cancel();
                        false
                    }
                    _ = run_cancel.cancelled() => true,
                    _ = tracker.wait() => false,
                }
            }
            _ => {
                tokio::select! {
                    _ = run_cancel.cancelled() => true,
                    _ = tracker.wait() => false,
                }
            }
        };
        tracker.wait().await;
        let elapsed = started.elapsed();

        let tally = aggregator
            .await
            .map_err(|e| EngineError::Run(format!("sample aggregation failed: {}", e)))??;

        let total = tally.latency.count();
        let actual_qps = if elapsed.is_zero() {
            0.0
        } else {
            total as f64 / elapsed.as_secs_f64()
        };
        let stopped_early = interrupted && budget.is_none_or(|calls| total < calls);
        info!(
            "Finished run against {}: {} call(s) in {} ({:.1} qps){}",
            spec.url,
            total,
            format_duration(elapsed),
            actual_qps,
            if stopped_early { ", stopped" } else { "" }
        );
        debug!("Status codes: {:?}", tally.ret_codes);

        Ok(RunResults {
            run_type: RUN_TYPE.to_string(),
            labels: spec.labels.clone().unwrap_or_default(),
            start_time,
            requested_qps: if qps > 0.0 { qps.to_string() } else { "max".to_string() },
            requested_duration: match bound {
                Bound::Calls(calls) => format!("exactly {} calls", calls),
                Bound::Time(duration) => format_duration(duration),
                Bound::UntilStopped => "until stop".to_string(),
            },
            actual_qps,
            actual_duration: u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX),
            num_threads: workers,
            version: env!("CARGO_PKG_VERSION").to_string(),
            duration_histogram: tally.latency.export(MICROS_PER_SECOND, 100, &spec.percentiles),
            exactly: budget.unwrap_or(0),
            ret_codes: tally.ret_codes,
            sizes: tally.sizes.export(1.0, 64, &[]),
            url: spec.url.clone(),
            socket_count: sockets.get(),
            id: None,
            stopped_early,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> HttpLoadEngine {
        HttpLoadEngine::default()
    }

    #[test]
    fn test_split_calls() {
        let split: Vec<u64> = (0..4).map(|w| split_calls(10, 4, w)).collect();
        assert_eq!(split, vec![3, 3, 2, 2]);
        assert_eq!(split.iter().sum::<u64>(), 10);
        assert_eq!(split_calls(3, 1, 0), 3);
    }

    #[test]
    fn test_pacing_period() {
        assert_eq!(pacing_period(8.0, 4), Duration::from_millis(500));
        assert_eq!(pacing_period(1e-300, 1), MAX_PACING_PERIOD);
        assert_eq!(pacing_period(1e300, 1), Duration::from_nanos(1));
    }

    #[test]
    fn test_prepare_rejects_bad_urls() {
        let engine = engine();
        for url in ["not a url", "ftp://example.com/file", "http://"] {
            let err = engine.prepare(&RunSpec::for_url(url)).unwrap_err();
            assert!(matches!(err, EngineError::InvalidUrl { .. }), "{} gave {:?}", url, err);
        }
        assert!(engine.prepare(&RunSpec::for_url("https://example.com/echo")).is_ok());
    }

    #[test]
    fn test_prepare_rejects_bad_header_value() {
        let mut spec = RunSpec::for_url("http://localhost/");
        spec.headers.push("X-Bad: line\nbreak".to_string());
        let err = engine().prepare(&spec).unwrap_err();
        assert!(matches!(err, EngineError::InvalidHeader { .. }));
    }

    #[test]
    fn test_prepare_rejects_too_many_connections() {
        let mut spec = RunSpec::for_url("http://localhost/");
        spec.connections = Some(100_000);
        assert!(matches!(engine().prepare(&spec), Err(EngineError::Run(_))));
    }

    #[test]
    fn test_plan_method_and_headers() {
        let mut spec = RunSpec::for_url("http://localhost/");
        spec.headers = vec!["X-One: 1".to_string(), "X-One: 2".to_string()];
        let plan = engine().build_plan(&spec).unwrap();
        assert_eq!(plan.method, Method::GET);
        assert_eq!(plan.headers.get_all("x-one").iter().count(), 2);
        assert!(plan.headers.get(CONTENT_TYPE).is_none());

        spec.payload = Some(b"hello".to_vec());
        let plan = engine().build_plan(&spec).unwrap();
        assert_eq!(plan.method, Method::POST);
        assert_eq!(plan.headers[CONTENT_TYPE], DEFAULT_PAYLOAD_CONTENT_TYPE);

        spec.content_type = Some("application/json".to_string());
        let plan = engine().build_plan(&spec).unwrap();
        assert_eq!(plan.headers[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn test_bound_resolution() {
        let engine = engine();
        let mut spec = RunSpec::for_url("http://localhost/");
        assert_eq!(engine.bound(&spec), Bound::Time(Duration::from_secs(5)));

        spec.duration = RunDuration::UntilStopped;
        assert_eq!(engine.bound(&spec), Bound::UntilStopped);

        spec.requests = Some(0);
        assert_eq!(engine.bound(&spec), Bound::UntilStopped);

        spec.requests = Some(12);
        assert_eq!(engine.bound(&spec), Bound::Calls(12));
    }

    #[test]
    fn test_call_budget() {
        assert_eq!(call_budget(Bound::Calls(12), 0.0), Some(12));
        assert_eq!(call_budget(Bound::Calls(12), 50.0), Some(12));
        assert_eq!(call_budget(Bound::Time(Duration::from_secs(2)), 100.0), Some(200));
        assert_eq!(call_budget(Bound::Time(Duration::from_millis(1500)), 3.0), Some(5));
        assert_eq!(call_budget(Bound::Time(Duration::from_secs(2)), 0.0), None);
        assert_eq!(call_budget(Bound::Time(Duration::from_secs(2)), -1.0), None);
        assert_eq!(call_budget(Bound::UntilStopped, 100.0), None);
    }

    #[tokio::test]
    async fn test_zero_length_paced_run_makes_no_calls() {
        let mut spec = RunSpec::for_url("http://127.0.0.1:9/");
        spec.duration = RunDuration::For(Duration::ZERO);
        spec.qps = Some(10.0);
        spec.connections = Some(4);

        let results = engine()
            .run(Arc::new(spec), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(results.total_calls(), 0);
        assert_eq!(results.exactly, 0);
        assert_eq!(results.num_threads, 1);
        assert!(!results.stopped_early);
    }

    #[tokio::test]
    async fn test_unreachable_target_counts_transport_errors() {
        let mut spec = RunSpec::for_url("http://127.0.0.1:9/");
        spec.requests = Some(4);
        spec.connections = Some(2);
        spec.qps = Some(0.0);
        spec.timeout = Some(Duration::from_millis(500));

        let results = engine()
            .run(Arc::new(spec), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(results.ret_code_count(volley_core::TRANSPORT_ERROR_CODE), 4);
        assert_eq!(results.socket_count, 0);
        assert_eq!(results.num_threads, 2);
        assert_eq!(results.exactly, 4);
        assert_eq!(results.requested_qps, "max");
        assert!(!results.stopped_early);
    }

    #[tokio::test]
    async fn test_cancelled_unbounded_run_returns() {
        let mut spec = RunSpec::for_url("http://127.0.0.1:9/");
        spec.duration = RunDuration::UntilStopped;
        spec.qps = Some(20.0);
        let cancel = CancellationToken::new();
        let stopper = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            stopper.cancel();
        });

        let results = engine().run(Arc::new(spec), cancel).await.unwrap();
        assert_eq!(results.requested_duration, "until stop");
        assert!(results.stopped_early);
    }
}
