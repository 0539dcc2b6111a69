//! Errors raised by extractors before a handler runs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use volley_core::ErrorPayload;

#[derive(Debug, Error)]
pub enum WebError {
    #[error("{message}: {detail}")]
    BadRequest { message: String, detail: String },
}

pub type WebResult<T> = Result<T, WebError>;

impl WebError {
    pub fn bad_request(message: impl Into<String>, detail: impl Into<String>) -> Self {
        WebError::BadRequest {
            message: message.into(),
            detail: detail.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            WebError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        }
    }

    pub fn payload(&self) -> ErrorPayload {
        match self {
            WebError::BadRequest { message, detail } => ErrorPayload::new(message.clone(), detail.clone()),
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        tracing::warn!("Rejected request: {}", self);
        (self.status_code(), Json(self.payload())).into_response()
    }
}
