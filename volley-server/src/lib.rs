//! Volley server
//!
//! Wires configuration, logging, the HTTP load engine, the run orchestrator
//! and the REST application into one process.

pub mod cli;
pub mod startup;

pub use cli::{apply_cli_overrides, Cli};
pub use startup::{shutdown_signal, Server};
