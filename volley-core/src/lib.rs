//! # Volley Core
//!
//! Turns a run request into a validated [`RunSpec`] and defines the contracts the
//! rest of Volley is built on.
//!
//! ## Resolution pipeline
//!
//! 1. [`json_path`] walks a dotted path through the JSON request body.
//! 2. [`merge()`] layers query parameters over the selected JSON mapping. Every
//!    field is overridden by the query string except headers, which accumulate.
//! 3. [`validate()`] type-checks the merged fields and stops at the first error.
//!
//! Every failure is a [`ResolveError`] that renders into a stable
//! [`ErrorPayload`].
//!
//! ## Engine contract
//!
//! [`LoadEngine`] is implemented by the HTTP engine and by test doubles.

pub mod duration;
pub mod engine;
pub mod error;
pub mod json_path;
pub mod merge;
pub mod results;
pub mod spec;

pub use duration::{format_duration, parse_duration, DurationParseError};
pub use engine::{EngineError, LoadEngine};
pub use error::{json_error_detail, ErrorPayload, ResolveError, ResolveResult};
pub use json_path::{navigate, select_map, PathError};
pub use merge::{merge, MergedConfig, QueryParams};
pub use results::{Bucket, HistogramData, Percentile, RunResults, TRANSPORT_ERROR_CODE};
pub use spec::{validate, RunDuration, RunSpec, DEFAULT_PERCENTILES};

/// Merge then validate, the full resolution of a run request
pub fn resolve(body: &[u8], query: &QueryParams) -> ResolveResult<RunSpec> {
    let merged = merge(body, query.json_path(), query)?;
    validate(&merged)
}
