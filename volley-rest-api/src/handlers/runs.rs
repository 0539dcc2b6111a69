//! Run, status and stop endpoints

use axum::{
    body::Bytes,
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, info};
use volley_execution::Outcome;
use volley_web::{RunIdQuery, RunQuery};

use crate::{
    context::AppContext,
    errors::{RestError, RestResult},
    models::{AsyncReply, StatusReply, StopReply},
};

/// Resolve the request into a run spec and execute it.
///
/// Sync runs reply with the full results once the engine returns; async runs
/// reply at once with the allocated run id.
pub async fn run(State(ctx): State<AppContext>, RunQuery(query): RunQuery, body: Bytes) -> RestResult<Response> {
    debug!("Run request with {} body bytes", body.len());
    let spec = volley_core::resolve(&body, &query)?;

    match ctx.orchestrator.execute(spec).await? {
        Outcome::Completed(results) => {
            info!(
                "Run against {} finished: {} calls at {:.1} qps",
                results.url,
                results.total_calls(),
                results.actual_qps
            );
            Ok(Json(results).into_response())
        }
        Outcome::Accepted(record) => Ok(Json(AsyncReply::started(record.run_id)).into_response()),
    }
}

/// One job record, or every record when no run id is given
pub async fn status(State(ctx): State<AppContext>, RunIdQuery(run_id): RunIdQuery) -> RestResult<Response> {
    match run_id {
        Some(id) => {
            let record = ctx.registry().get(id).ok_or_else(|| RestError::run_not_found(id))?;
            Ok(Json(record).into_response())
        }
        None => Ok(Json(ctx.registry().list().into_iter().collect::<StatusReply>()).into_response()),
    }
}

/// Stop one run, or every active run when no run id is given
pub async fn stop(State(ctx): State<AppContext>, RunIdQuery(run_id): RunIdQuery) -> RestResult<Json<StopReply>> {
    let stopped = match run_id {
        Some(id) => {
            let signalled = ctx.registry().stop(id).ok_or_else(|| RestError::run_not_found(id))?;
            usize::from(signalled)
        }
        None => ctx.registry().stop_all(),
    };
    info!("Stop request signalled {} run(s)", stopped);
    Ok(Json(StopReply::stopped(stopped)))
}
