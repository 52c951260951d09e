//! whisper-gateway
//!
//! An authenticated proxy in front of a Whisper ASR service.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────┐
//!                      │                  WHISPER GATEWAY                 │
//!                      │                                                  │
//!   POST /asr          │  ┌──────────┐    ┌──────────────┐               │
//!   ───────────────────┼─▶│ x-api-key│───▶│ passthrough  │══ stream ═════┼──▶ Whisper
//!                      │  └──────────┘    └──────────────┘               │    /asr
//!                      │                                                  │
//!   POST /audio/       │  ┌──────────┐    ┌──────────────┐  ┌─────────┐  │
//!   transcriptions     │  │  Bearer  │───▶│ multipart    │─▶│normalize│  │
//!   ───────────────────┼─▶│          │    │ re-encode    │  │ {text}  │  │
//!                      │  └──────────┘    └──────────────┘  └─────────┘  │
//!                      │                                                  │
//!   GET /health        │  ┌──────────────┐                               │
//!   ───────────────────┼─▶│ probe (5s)   │───────────────────────────────┼──▶ Whisper /
//!                      │  └──────────────┘                               │
//!                      └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio::net::TcpListener;

use whisper_gateway::config::loader::{ENV_BIND_ADDRESS, ENV_WHISPER_ENDPOINT};
use whisper_gateway::config::{load_config, ConfigError, GatewayConfig};
use whisper_gateway::observability::{logging, metrics};
use whisper_gateway::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "whisper-gateway", version, about = "Authenticated proxy for a Whisper ASR service")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on, e.g. 0.0.0.0:8000.
    #[arg(short, long)]
    bind: Option<String>,

    /// Backend base address, e.g. http://whisper:9000.
    #[arg(long)]
    endpoint: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Flags shadow the environment variables they stand in for.
    let lookup = |name: &str| match name {
        ENV_BIND_ADDRESS if args.bind.is_some() => args.bind.clone(),
        ENV_WHISPER_ENDPOINT if args.endpoint.is_some() => args.endpoint.clone(),
        _ => std::env::var(name).ok(),
    };

    let config = match load_config(args.config.as_deref(), lookup) {
        Ok(config) => config,
        Err(ConfigError::Validation(errors)) => {
            for error in &errors {
                eprintln!("Invalid configuration: {}", error);
            }
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    logging::init_logging(&config.observability);
    tracing::info!("whisper-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        backend = %config.backend.endpoint,
        request_timeout_secs = config.backend.request_timeout_secs,
        health_timeout_secs = config.backend.health_timeout_secs,
        "Configuration loaded"
    );

    match run(config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Gateway failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: GatewayConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let _signals = shutdown.trigger_on_signal();

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;
    Ok(())
}
