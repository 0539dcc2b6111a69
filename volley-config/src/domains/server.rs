//! Server configuration for the run API

use crate::error::ConfigResult;
use crate::validation::{
    validate_enum_choice, validate_path_prefix, validate_port_range, validate_required_string, Validatable,
};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Methods the run API answers to
const CORS_METHODS: &[&str] = &["GET", "POST", "OPTIONS", "HEAD"];

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Prefix every run API route is mounted under
    #[serde(default = "default_ui_path")]
    pub ui_path: String,

    /// Directory saved run results are written to
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// CORS configuration
    #[serde(default)]
    pub cors: CorsConfig,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins
    #[serde(default = "default_cors_origins")]
    pub allowed_origins: Vec<String>,

    /// Allowed methods
    #[serde(default = "default_cors_methods")]
    pub allowed_methods: Vec<String>,

    /// Allowed headers
    #[serde(default = "default_cors_headers")]
    pub allowed_headers: Vec<String>,

    /// Max age for preflight requests
    #[serde(with = "crate::domains::utils::serde_duration", default = "default_cors_max_age")]
    pub max_age: Duration,
}

impl ServerConfig {
    /// Socket address built from `bind_address` and `port`
    pub fn socket_addr(&self) -> ConfigResult<SocketAddr> {
        let ip: IpAddr = self
            .bind_address
            .parse()
            .map_err(|e| self.validation_error(format!("invalid bind_address '{}': {}", self.bind_address, e)))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            ui_path: default_ui_path(),
            data_dir: default_data_dir(),
            cors: CorsConfig::default(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_cors_origins(),
            allowed_methods: default_cors_methods(),
            allowed_headers: default_cors_headers(),
            max_age: default_cors_max_age(),
        }
    }
}

impl Validatable for ServerConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.bind_address, "bind_address", self.domain_name())?;
        validate_port_range(self.port, "port", self.domain_name())?;
        self.socket_addr()?;
        validate_path_prefix(&self.ui_path, "ui_path", self.domain_name())?;

        if self.data_dir.as_os_str().is_empty() {
            return Err(self.validation_error("data_dir cannot be empty"));
        }

        self.cors.validate()?;

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "server"
    }
}

impl Validatable for CorsConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.allowed_origins.is_empty() {
            return Err(self.validation_error("At least one allowed origin must be specified"));
        }

        for method in &self.allowed_methods {
            validate_enum_choice(method, CORS_METHODS, "allowed_methods", self.domain_name())?;
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "server.cors"
    }
}

// Default value functions
fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_ui_path() -> String {
    "/volley/".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_cors_methods() -> Vec<String> {
    vec!["GET".to_string(), "POST".to_string(), "OPTIONS".to_string()]
}

fn default_cors_headers() -> Vec<String> {
    vec!["Content-Type".to_string(), "X-Request-ID".to_string()]
}

fn default_cors_max_age() -> Duration {
    Duration::from_secs(3600)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_defaults() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:8080");
        assert_eq!(config.ui_path, "/volley/");
    }

    #[test]
    fn test_invalid_bind_address() {
        let config = ServerConfig {
            bind_address: "not-an-ip".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cors_rejects_unknown_method() {
        let mut config = ServerConfig::default();
        config.cors.allowed_methods.push("BREW".to_string());
        assert!(config.validate().is_err());
    }
}
