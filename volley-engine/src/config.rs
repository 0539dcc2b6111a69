//! Engine settings

use std::time::Duration;
use volley_config::EngineConfig;

/// Defaults the engine applies to fields a run spec leaves unset
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub default_qps: f64,
    pub default_connections: u32,
    pub max_connections: u32,
    pub default_duration: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineConfig::default().into()
    }
}

impl From<EngineConfig> for EngineSettings {
    fn from(config: EngineConfig) -> Self {
        Self {
            default_qps: config.default_qps,
            default_connections: config.default_connections,
            max_connections: config.max_connections,
            default_duration: config.default_duration,
            request_timeout: config.request_timeout,
            user_agent: config.user_agent,
        }
    }
}
