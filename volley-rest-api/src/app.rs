//! Router setup

use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;
use volley_config::{CorsConfig, ServerConfig};
use volley_web::{cors_layer, request_id_middleware};

use crate::{context::AppContext, handlers};

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Prefix of the run endpoints, always starting and ending with `/`
    pub ui_path: String,
    pub enable_cors: bool,
    pub enable_request_id: bool,
    pub enable_tracing: bool,
    pub cors: CorsConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from(&ServerConfig::default())
    }
}

impl From<&ServerConfig> for AppConfig {
    fn from(server: &ServerConfig) -> Self {
        Self {
            ui_path: server.ui_path.clone(),
            enable_cors: true,
            enable_request_id: true,
            enable_tracing: true,
            cors: server.cors.clone(),
        }
    }
}

impl AppConfig {
    /// Full route of a REST endpoint, e.g. `/volley/rest/run`
    pub fn rest_route(&self, endpoint: &str) -> String {
        let prefix = self.ui_path.trim_matches('/');
        if prefix.is_empty() {
            format!("/rest/{}", endpoint)
        } else {
            format!("/{}/rest/{}", prefix, endpoint)
        }
    }
}

/// Create the complete REST application
pub fn create_rest_app(context: AppContext, config: AppConfig) -> Router {
    let mut app = Router::new()
        .route("/health", get(handlers::health_check))
        .route(&config.rest_route("run"), get(handlers::run).post(handlers::run))
        .route(&config.rest_route("status"), get(handlers::status))
        .route(&config.rest_route("stop"), get(handlers::stop).post(handlers::stop))
        .with_state(context);

    // Layers wrap in reverse order of addition
    if config.enable_request_id {
        app = app.layer(middleware::from_fn(request_id_middleware));
    }

    if config.enable_tracing {
        app = app.layer(TraceLayer::new_for_http());
    }

    if config.enable_cors {
        app = app.layer(cors_layer(&config.cors));
    }

    app
}
