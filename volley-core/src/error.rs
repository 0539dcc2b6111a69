//! Error taxonomy for run request resolution

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::duration::DurationParseError;
use crate::json_path::PathError;

/// Structured error reply: a stable classification plus the underlying detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    #[serde(rename = "Error")]
    pub error: String,
    #[serde(rename = "Exception")]
    pub exception: String,
}

impl ErrorPayload {
    pub fn new(error: impl Into<String>, exception: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            exception: exception.into(),
        }
    }
}

/// Errors raised while turning a request into a [`crate::RunSpec`]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    #[error("error parsing json body: {detail}")]
    MalformedJson { detail: String },

    #[error(transparent)]
    Path(#[from] PathError),

    #[error("{message}: {detail}")]
    Validation { message: String, detail: String },

    #[error("parsing duration '{raw}': {source}")]
    Duration {
        raw: String,
        #[source]
        source: DurationParseError,
    },
}

pub type ResolveResult<T> = Result<T, ResolveError>;

impl ResolveError {
    pub fn malformed_json(err: &serde_json::Error) -> Self {
        ResolveError::MalformedJson {
            detail: json_error_detail(err),
        }
    }

    pub fn validation(message: impl Into<String>, detail: impl Into<String>) -> Self {
        ResolveError::Validation {
            message: message.into(),
            detail: detail.into(),
        }
    }

    pub fn duration(raw: impl Into<String>, source: DurationParseError) -> Self {
        ResolveError::Duration {
            raw: raw.into(),
            source,
        }
    }

    /// Short stable classification used as the `Error` field
    pub fn classification(&self) -> String {
        match self {
            ResolveError::MalformedJson { .. } => "error parsing json body".to_string(),
            ResolveError::Path(PathError::NotFound { segment }) => {
                format!("json path lookup failed for {:?}", segment)
            }
            ResolveError::Path(PathError::NotAMap { segment }) => {
                format!("json path {:?} is not a map", segment)
            }
            ResolveError::Validation { message, .. } => message.clone(),
            ResolveError::Duration { raw, .. } => format!("parsing duration '{}'", raw),
        }
    }

    /// Underlying cause used as the `Exception` field
    pub fn detail(&self) -> String {
        match self {
            ResolveError::MalformedJson { detail } => detail.clone(),
            ResolveError::Path(path) => path.to_string(),
            ResolveError::Validation { detail, .. } => detail.clone(),
            ResolveError::Duration { source, .. } => source.to_string(),
        }
    }

    pub fn payload(&self) -> ErrorPayload {
        ErrorPayload::new(self.classification(), self.detail())
    }
}

/// Describe a JSON syntax error the way clients of the run API expect.
///
/// Truncated input is reported as `unexpected end of JSON input`; other errors keep
/// the parser's own wording.
pub fn json_error_detail(err: &serde_json::Error) -> String {
    if err.is_eof() {
        "unexpected end of JSON input".to_string()
    } else {
        err.to_string()
    }
}
