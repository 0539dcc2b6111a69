//! REST error type and its mapping onto `{"Error", "Exception"}` replies

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::{error, warn};
use volley_core::{ErrorPayload, ResolveError};
use volley_execution::OrchestratorError;
use volley_web::WebError;

#[derive(Error, Debug)]
pub enum RestError {
    /// The request could not be turned into a run spec
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),

    #[error("{message}: {detail}")]
    NotFound { message: String, detail: String },

    #[error(transparent)]
    Web(#[from] WebError),
}

pub type RestResult<T> = Result<T, RestError>;

impl RestError {
    pub fn run_not_found(run_id: u64) -> Self {
        RestError::NotFound {
            message: "run id not found".to_string(),
            detail: format!("no run with id {}", run_id),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            RestError::Resolve(_) => StatusCode::BAD_REQUEST,
            RestError::Orchestrator(OrchestratorError::Rejected(_)) => StatusCode::BAD_REQUEST,
            RestError::Orchestrator(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RestError::NotFound { .. } => StatusCode::NOT_FOUND,
            RestError::Web(err) => err.status_code(),
        }
    }

    pub fn payload(&self) -> ErrorPayload {
        match self {
            RestError::Resolve(err) => err.payload(),
            RestError::Orchestrator(err) => err.payload(),
            RestError::NotFound { message, detail } => ErrorPayload::new(message.clone(), detail.clone()),
            RestError::Web(err) => err.payload(),
        }
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let payload = self.payload();
        if status.is_server_error() {
            error!("{}: {}", payload.error, payload.exception);
        } else {
            warn!("Rejected request with {}: {}: {}", status, payload.error, payload.exception);
        }
        (status, Json(payload)).into_response()
    }
}
