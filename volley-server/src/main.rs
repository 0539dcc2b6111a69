//! Volley Server Binary

use anyhow::Result;
use clap::Parser;
use volley_config::{ConfigLoader, VolleyConfig};

use volley_server::{apply_cli_overrides, Cli, Server};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.print_config {
        println!("{}", VolleyConfig::generate_sample());
        return Ok(());
    }

    let mut config = ConfigLoader::new().load(cli.config.as_ref())?;
    apply_cli_overrides(&mut config, &cli)?;

    volley_logging::init_logging_from_config(&config.logging)?;

    let server = Server::new(config)?;
    server.start().await
}
