//! Domain-driven configuration management for Volley
//!
//! Configuration is split into server, engine and logging domains. Each domain
//! carries serde defaults, can be overridden from `VOLLEY_*` environment
//! variables and validates itself through [`validation::Validatable`].

pub mod error;
pub mod loader;
pub mod validation;

// Domain-specific configuration modules
pub mod domains;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

// Re-export domain configurations
pub use domains::{
    engine::EngineConfig,
    logging::{LogFormat, LogLevel, LoggingConfig},
    server::{CorsConfig, ServerConfig},
    VolleyConfig,
};

// Re-export utilities
pub use domains::utils::serde_duration;
