//! Command line flags and how they override the loaded configuration

use anyhow::{anyhow, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use volley_config::{validation::Validatable, LogLevel, VolleyConfig};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path (YAML)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Server bind address, e.g. 0.0.0.0:8080
    #[arg(short, long, value_name = "ADDR")]
    pub bind: Option<String>,

    /// Prefix of the run endpoints
    #[arg(long, value_name = "PREFIX")]
    pub ui_path: Option<String>,

    /// Directory saved results are written to
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Print a sample configuration and exit
    #[arg(long)]
    pub print_config: bool,
}

/// Apply command line overrides on top of file and environment settings
pub fn apply_cli_overrides(config: &mut VolleyConfig, cli: &Cli) -> Result<()> {
    if let Some(bind) = &cli.bind {
        let addr: SocketAddr = bind
            .parse()
            .map_err(|e| anyhow!("Invalid bind address '{}': {}", bind, e))?;
        config.server.bind_address = addr.ip().to_string();
        config.server.port = addr.port();
    }

    if let Some(ui_path) = &cli.ui_path {
        config.server.ui_path = ui_path.clone();
    }

    if let Some(data_dir) = &cli.data_dir {
        config.server.data_dir = data_dir.clone();
    }

    if let Some(level) = &cli.log_level {
        config.logging.level = level.parse::<LogLevel>().map_err(|e| anyhow!(e))?;
    }

    config.server.validate()?;
    Ok(())
}
