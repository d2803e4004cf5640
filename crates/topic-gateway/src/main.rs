// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Topic Gateway CLI
//!
//! # Usage
//!
//! ```bash
//! # Serve with a configuration file
//! topic-gateway --config gateway.toml
//!
//! # Override listener and turn peeking on
//! topic-gateway --config gateway.toml --port 9000 --enable-peek
//!
//! # Write an example configuration
//! topic-gateway gen-config --output gateway.toml
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use topic_gateway::{build_router, AppState, Gateway, GatewayConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Read-only REST gateway for broker topic catalogs and subscription peeks
#[derive(Parser, Debug)]
#[command(name = "topic-gateway")]
#[command(about = "Read-only REST gateway for broker topic catalogs and subscription peeks")]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// HTTP server port
    #[arg(short, long)]
    port: Option<u16>,

    /// Bind address
    #[arg(short, long)]
    bind: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Enable message peek regardless of the configuration file
    #[arg(long)]
    enable_peek: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate example configuration file
    GenConfig {
        /// Output file path
        #[arg(short, long, default_value = "gateway.toml")]
        output: PathBuf,
    },

    /// Validate a configuration file
    Validate {
        /// Configuration file path
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if let Some(cmd) = args.command {
        return match cmd {
            Commands::GenConfig { output } => cmd_gen_config(output),
            Commands::Validate { config } => cmd_validate(config),
        };
    }

    let mut config = match &args.config {
        Some(path) => GatewayConfig::from_file(path)?,
        None => GatewayConfig::example(),
    };
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(level) = args.log_level {
        config.log_level = level;
    }
    if args.enable_peek {
        config.peek.enabled = true;
    }

    // Setup logging
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if args.config.is_none() {
        info!("No configuration file given, using the standalone example");
    }

    let state = Arc::new(AppState::new(
        Gateway::from_config(&config),
        config.server.base_path.clone(),
    ));
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.bind, config.server.port);
    info!("Topic Gateway v{}", env!("CARGO_PKG_VERSION"));
    info!("HTTP server: http://{}{}", addr, config.server.base_path);
    for env in &config.environments {
        info!("Environment {}: {}", env.name, env.service_url);
    }
    info!(
        "Message peek: {}",
        if config.peek.enabled { "enabled" } else { "disabled" }
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Topic Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

fn cmd_gen_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let text = toml::to_string_pretty(&GatewayConfig::example())?;
    std::fs::write(&output, text)?;
    println!("Wrote example configuration to {}", output.display());
    Ok(())
}

fn cmd_validate(path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = GatewayConfig::from_file(&path)?;
    println!("Configuration {} is valid", path.display());
    println!("  Environments: {}", config.environments.len());
    for env in &config.environments {
        println!("    {} -> {}", env.name, env.service_url);
    }
    println!(
        "  Peek: {}",
        if config.peek.enabled { "enabled" } else { "disabled" }
    );
    println!("  TLS: {}", if config.tls.enabled { "enabled" } else { "disabled" });
    Ok(())
}
