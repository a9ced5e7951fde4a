//! Embedding forward proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────────┐
//!                    │                    EMBED PROXY                        │
//!   GET ?u=<target>  │  ┌─────────┐   ┌──────────┐   ┌──────────┐           │
//!  ──────────────────┼─▶│  http   │──▶│ security │──▶│ upstream │───────────┼──▶ Target
//!                    │  │ server  │   │  target  │   │  fetch   │           │    site
//!                    │  └─────────┘   └──────────┘   └────┬─────┘           │
//!                    │                                    │                 │
//!                    │                      text/html? ───┤                 │
//!                    │                     yes │          │ no              │
//!                    │                         ▼          ▼                 │
//!   Response         │  ┌─────────┐   ┌──────────┐   passthrough           │
//!  ◀─────────────────┼──│response │◀──│ rewrite  │◀── (bytes unchanged)    │
//!                    │  │ headers │   │ pipeline │                         │
//!                    │  └─────────┘   └──────────┘                         │
//!                    │                                                      │
//!                    │  config · observability · lifecycle                  │
//!                    └──────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use embed_proxy::config::{load_config, ProxyConfig};
use embed_proxy::observability::{logging, metrics};
use embed_proxy::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "embed-proxy")]
#[command(about = "Forward proxy that rewrites pages for cross-origin embedding", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);

    tracing::info!("embed-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        endpoint = %config.endpoint.path,
        upstream_timeout_secs = ?config.upstream.timeout_secs,
        allow_private_targets = config.security.allow_private_targets,
        "Configuration loaded"
    );
    if config.security.allow_private_targets {
        tracing::warn!("Private and loopback targets are allowed");
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
