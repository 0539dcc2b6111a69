//! Tracing subscriber setup for Volley binaries and tests

pub mod init;

pub use init::{init_logging_from_config, init_simple_tracing};
