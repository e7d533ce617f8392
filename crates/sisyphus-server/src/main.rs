// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Sisyphus server binary

use clap::Parser;
use sisyphus_logging::CliLoggingArgs;
use sisyphus_server::{Server, ServerConfig};
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Local address to listen on
    #[arg(long, default_value = "0.0.0.0:8080")]
    local: SocketAddr,

    /// Path to the SQLite database file, or `:memory:`
    #[arg(long, default_value = "sisyphus.db")]
    db: String,

    /// Seconds between probe cycles
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    period: u64,

    /// Seconds to wait for a single probe notification
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
    probe_timeout: u64,

    #[command(flatten)]
    logging: CliLoggingArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    args.logging.init("sisyphus-server")?;

    tracing::info!("Starting sisyphus server");

    let config = ServerConfig {
        bind_addr: args.local,
        database_path: args.db,
        probe_period: Duration::from_secs(args.period),
        probe_timeout: Duration::from_secs(args.probe_timeout),
        ..Default::default()
    };

    let server = Server::new(config)?;
    server.run().await?;

    Ok(())
}
