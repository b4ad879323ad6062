// Copyright (c) 2026 Flynn Controller gRPC Contributors
// SPDX-License-Identifier: BSD-3-Clause

//! # Controller gRPC Gateway
//!
//! The `controller-grpc` binary serves the controller API as gRPC-Web.
//!
//! ## Commands
//!
//! - `controller-grpc` - Start the gateway (default)
//! - `controller-grpc config show|validate` - Configuration management
//!
//! Configuration comes from `--config`, `CONTROLLER_GRPC_CONFIG_PATH` or
//! `./controller-grpc.yaml`, then `CONTROLLER_DOMAIN`, `CONTROLLER_AUTH_KEY`
//! and `PORT` from the environment (a `.env` file is honoured).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod config;
mod server;

use config::ConfigCommand;

/// Controller gRPC gateway - gRPC-Web front end for the controller API
#[derive(Parser)]
#[command(name = "controller-grpc")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "CONTROLLER_GRPC_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Listen address (overrides server.host)
    #[arg(long, global = true)]
    host: Option<String>,

    /// Listen port (overrides server.port and PORT)
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        long,
        global = true,
        env = "CONTROLLER_GRPC_LOG_LEVEL",
        default_value = "info"
    )]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Missing .env is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    match cli.command {
        Some(Commands::Config { command }) => config::handle_command(command, cli.config),
        None => server::start(cli.config, cli.host, cli.port).await,
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}
