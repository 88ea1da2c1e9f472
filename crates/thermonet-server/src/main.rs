//! Thermonet server binary.
//!
//! # Usage
//!
//! ```bash
//! # Generate a key for the configuration file
//! thermonet-server --generate-key
//!
//! # Run every endpoint in the configuration
//! thermonet-server --config thermonet.toml
//!
//! # Faster polling, verbose logs
//! thermonet-server --config thermonet.toml --poll-period-ms 10 --log-level debug
//! ```

use std::{io::Write, path::PathBuf};

use clap::Parser;
use thermonet_server::{Server, ServerRuntimeConfig, generate_key};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Thermonet sensor server
#[derive(Parser, Debug)]
#[command(name = "thermonet-server")]
#[command(about = "Encrypted, token-gated sensor endpoints over UDP")]
#[command(version)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "thermonet.toml")]
    config: PathBuf,

    /// Override the poll period from the configuration file
    #[arg(long)]
    poll_period_ms: Option<u64>,

    /// Print a fresh hex-encoded key and exit
    #[arg(long)]
    generate_key: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.generate_key {
        writeln!(std::io::stdout(), "{}", generate_key()?.to_hex())?;
        return Ok(());
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("Thermonet server starting");
    tracing::info!("Loading configuration from {}", args.config.display());

    let mut config = ServerRuntimeConfig::load(&args.config)?;
    if let Some(period) = args.poll_period_ms {
        config.poll_period_ms = period;
        config.validate()?;
    }

    let server = Server::bind(&config).await?;

    tracing::info!("{} endpoint(s) running, press Ctrl-C to stop", server.endpoints().len());

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");

    server.shutdown().await?;

    Ok(())
}
