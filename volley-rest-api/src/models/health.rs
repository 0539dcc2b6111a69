use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Liveness reply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    /// Async runs that have not ended yet
    pub active_runs: usize,
}

impl HealthResponse {
    pub fn healthy(active_runs: usize) -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            active_runs,
        }
    }
}
