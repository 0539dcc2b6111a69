//! Worker task loop.
//!
//! Each worker owns its own HTTP client so connection reuse stays per worker,
//! issues requests on its own schedule and reports one [`Sample`] per call
//! through a bounded mpsc channel.

use reqwest::header::HeaderMap;
use reqwest::{Client, Method};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use volley_core::TRANSPORT_ERROR_CODE;

/// Outcome of a single call
#[derive(Debug, Clone, Copy)]
pub struct Sample {
    /// HTTP status, or the transport error pseudo code
    pub code: i32,
    pub latency: Duration,
    /// Response body size, when a response was received
    pub size: Option<u64>,
}

/// Everything needed to issue the run's request, shared by all workers
#[derive(Debug)]
pub struct RequestPlan {
    pub url: reqwest::Url,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

/// Per-worker limits
#[derive(Debug, Clone, Copy)]
pub struct WorkerBudget {
    /// Exact number of calls, unlimited when `None`
    pub calls: Option<u64>,
    /// Interval between calls, back-to-back when `None`
    pub period: Option<Duration>,
}

/// Count of workers that received at least one response
#[derive(Clone, Default)]
pub struct SocketCounter(Arc<AtomicU64>);

impl SocketCounter {
    pub fn new() -> Self {
        Self::default()
    }

    fn connected(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

async fn issue(client: &Client, plan: &RequestPlan) -> Sample {
    let mut request = client
        .request(plan.method.clone(), plan.url.clone())
        .headers(plan.headers.clone());
    if let Some(body) = &plan.body {
        request = request.body(body.clone());
    }

    let start = Instant::now();
    let outcome = match request.send().await {
        Ok(response) => {
            let code = i32::from(response.status().as_u16());
            match response.bytes().await {
                Ok(body) => Ok((code, body.len() as u64)),
                Err(e) => Err(e),
            }
        }
        Err(e) => Err(e),
    };
    let latency = start.elapsed();

    match outcome {
        Ok((code, size)) => Sample {
            code,
            latency,
            size: Some(size),
        },
        Err(e) => {
            trace!("Request to {} failed: {}", plan.url, e);
            Sample {
                code: TRANSPORT_ERROR_CODE,
                latency,
                size: None,
            }
        }
    }
}

/// Main worker loop.
///
/// Runs until the budget is spent, the cancellation token fires or the sample
/// receiver goes away. A call still in flight when the token fires is dropped
/// and not reported.
pub async fn worker_loop(
    worker_id: u32,
    client: Client,
    plan: Arc<RequestPlan>,
    budget: WorkerBudget,
    sample_tx: mpsc::Sender<Sample>,
    cancel: CancellationToken,
    sockets: SocketCounter,
) {
    let mut ticker = budget.period.map(|period| {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    });
    let mut issued: u64 = 0;
    let mut connected = false;

    loop {
        if budget.calls.is_some_and(|limit| issued >= limit) {
            break;
        }

        if let Some(interval) = ticker.as_mut() {
            tokio::select! {
                _ = interval.tick() => {}
                _ = cancel.cancelled() => break,
            }
        } else if cancel.is_cancelled() {
            break;
        }

        let sample = tokio::select! {
            sample = issue(&client, &plan) => sample,
            _ = cancel.cancelled() => break,
        };
        issued += 1;

        if !connected && sample.size.is_some() {
            connected = true;
            sockets.connected();
        }

        if sample_tx.send(sample).await.is_err() {
            // Aggregator is gone
            break;
        }
    }

    debug!("Worker {} finished after {} call(s)", worker_id, issued);
}
