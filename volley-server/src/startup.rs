//! Server startup and shutdown logic

use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tracing::{error, info};

use volley_config::VolleyConfig;
use volley_engine::HttpLoadEngine;
use volley_execution::{JobRegistry, ResultStore, RunOrchestrator};
use volley_rest_api::{create_rest_app, AppConfig, AppContext};

pub struct Server {
    config: VolleyConfig,
    orchestrator: Arc<RunOrchestrator>,
}

impl Server {
    /// Assemble the engine, registry and result store from configuration
    pub fn new(config: VolleyConfig) -> Result<Self> {
        config.validate_all()?;

        let engine = Arc::new(HttpLoadEngine::new(config.engine.clone()));
        let orchestrator = RunOrchestrator::new(
            engine,
            Arc::new(JobRegistry::new()),
            ResultStore::new(config.server.data_dir.clone()),
        );

        Ok(Self {
            config,
            orchestrator: Arc::new(orchestrator),
        })
    }

    pub fn orchestrator(&self) -> &Arc<RunOrchestrator> {
        &self.orchestrator
    }

    pub fn build_app(&self) -> Router {
        create_rest_app(
            AppContext::new(self.orchestrator.clone()),
            AppConfig::from(&self.config.server),
        )
    }

    /// Serve until a shutdown signal arrives, then stop every run
    pub async fn start(self) -> Result<()> {
        let addr = self.config.server.socket_addr()?;
        let app = self.build_app();
        self.log_config_summary();

        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        let orchestrator = self.orchestrator.clone();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                // In-flight sync runs end early so open connections can drain
                orchestrator.shutdown().await;
            })
            .await?;

        info!("Server shutdown complete");
        Ok(())
    }

    fn log_config_summary(&self) {
        let server = &self.config.server;
        let engine = &self.config.engine;
        info!("=== Volley Server Configuration ===");
        info!("Bind Address: {}:{}", server.bind_address, server.port);
        info!("Run API: {}rest/run", server.ui_path);
        info!("Data Dir: {}", server.data_dir.display());
        info!(
            "Engine defaults: qps={} connections={} duration={:?} timeout={:?}",
            engine.default_qps, engine.default_connections, engine.default_duration, engine.request_timeout
        );
        info!("===================================");
    }
}

/// Resolve on Ctrl-C, or SIGTERM on unix
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, stopping runs");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_app_serves_configured_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = VolleyConfig::default();
        config.server.ui_path = "/load/".to_string();
        config.server.data_dir = dir.path().to_path_buf();

        let server = Server::new(config).unwrap();
        let request = Request::builder()
            .uri("/load/rest/status")
            .body(Body::empty())
            .unwrap();
        let response = server.build_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], br#"{"Statuses":{}}"#);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = VolleyConfig::default();
        config.server.ui_path = "no-slashes".to_string();
        assert!(Server::new(config).is_err());
    }
}
