//! Health check endpoint

use axum::{extract::State, Json};
use tracing::debug;

use crate::{context::AppContext, models::HealthResponse};

pub async fn health_check(State(ctx): State<AppContext>) -> Json<HealthResponse> {
    debug!("Health check requested");
    Json(HealthResponse::healthy(ctx.registry().active_count()))
}
