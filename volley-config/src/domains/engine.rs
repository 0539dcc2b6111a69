//! Load engine defaults applied when a run request leaves a field unset

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Target rate when a run does not set `qps`; `<= 0` means max speed
    #[serde(default = "default_qps")]
    pub default_qps: f64,

    /// Worker count when a run does not set `c`
    #[serde(default = "default_connections")]
    pub default_connections: u32,

    /// Upper bound for `c`
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Run length when a run sets neither `t` nor `n`
    #[serde(with = "crate::domains::utils::serde_duration", default = "default_duration")]
    pub default_duration: Duration,

    /// Per-request timeout when a run does not set `timeout`
    #[serde(with = "crate::domains::utils::serde_duration", default = "default_request_timeout")]
    pub request_timeout: Duration,

    /// User agent sent with every generated request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_qps: default_qps(),
            default_connections: default_connections(),
            max_connections: default_max_connections(),
            default_duration: default_duration(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Validatable for EngineConfig {
    fn validate(&self) -> ConfigResult<()> {
        if !self.default_qps.is_finite() {
            return Err(self.validation_error("default_qps must be a finite number"));
        }
        validate_positive(self.default_connections, "default_connections", self.domain_name())?;
        validate_positive(self.max_connections, "max_connections", self.domain_name())?;
        if self.default_connections > self.max_connections {
            return Err(self.validation_error(format!(
                "default_connections ({}) exceeds max_connections ({})",
                self.default_connections, self.max_connections
            )));
        }
        validate_positive(self.default_duration.as_secs(), "default_duration", self.domain_name())?;
        validate_positive(self.request_timeout.as_secs(), "request_timeout", self.domain_name())?;
        validate_required_string(&self.user_agent, "user_agent", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "engine"
    }
}

fn default_qps() -> f64 {
    8.0
}

fn default_connections() -> u32 {
    4
}

fn default_max_connections() -> u32 {
    1024
}

fn default_duration() -> Duration {
    Duration::from_secs(5)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(3)
}

fn default_user_agent() -> String {
    format!("volley/{}", env!("CARGO_PKG_VERSION"))
}
