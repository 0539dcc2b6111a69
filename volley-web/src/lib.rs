//! # Volley Web Utilities
//!
//! Middleware and extractors shared by the Volley HTTP surface.
//!
//! - **Middleware**: CORS built from [`volley_config::CorsConfig`], request ids
//! - **Extractors**: raw query parameters for run requests, the optional `runid`
//!
//! ## Example
//!
//! ```rust,no_run
//! use axum::{middleware, routing::get, Router};
//! use volley_config::CorsConfig;
//! use volley_web::{cors_layer, request_id_middleware, RunQuery};
//!
//! async fn echo(RunQuery(query): RunQuery) -> String {
//!     query.first("url").unwrap_or_default().to_string()
//! }
//!
//! let app: Router = Router::new()
//!     .route("/echo", get(echo))
//!     .layer(middleware::from_fn(request_id_middleware))
//!     .layer(cors_layer(&CorsConfig::default()));
//! ```

pub mod errors;
pub mod extractors;
pub mod middleware;

pub use errors::{WebError, WebResult};
pub use extractors::{RunIdQuery, RunQuery, RUN_ID_PARAM};
pub use middleware::{cors_layer, request_id_middleware, RequestId, REQUEST_ID_HEADER};
