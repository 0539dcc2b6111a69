//! # Volley REST API
//!
//! HTTP surface of the Volley load-generation control plane.
//!
//! ## Endpoints
//!
//! All run endpoints live under the configurable UI prefix (default `/volley/`):
//!
//! - `GET|POST {prefix}rest/run` resolves the request into a run spec and
//!   executes it, replying with the results or, for async runs, the run id
//! - `GET {prefix}rest/status[?runid=N]` returns one or every job record
//! - `GET|POST {prefix}rest/stop[?runid=N]` stops one or every active run
//! - `GET /health` reports liveness
//!
//! Every failure is answered with an `{"Error": ..., "Exception": ...}` body.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use volley_execution::{JobRegistry, ResultStore, RunOrchestrator};
//! use volley_rest_api::{create_rest_app, AppConfig, AppContext};
//!
//! # async fn example(engine: Arc<dyn volley_core::LoadEngine>) -> Result<(), Box<dyn std::error::Error>> {
//! let orchestrator = RunOrchestrator::new(engine, Arc::new(JobRegistry::new()), ResultStore::new("./data"));
//! let app = create_rest_app(AppContext::new(Arc::new(orchestrator)), AppConfig::default());
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod context;
pub mod errors;
pub mod handlers;
pub mod models;

pub use app::{create_rest_app, AppConfig};
pub use context::AppContext;
pub use errors::{RestError, RestResult};
pub use models::*;
