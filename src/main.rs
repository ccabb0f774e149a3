use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use oxo_engine::GameRegistry;
use oxo_server::ServerConfig;
use oxo_telemetry::TelemetryConfig;

/// Real-time multiplayer tic-tac-toe coordination server.
#[derive(Debug, Parser)]
#[command(name = "oxo", version)]
struct Cli {
    /// Address to bind.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on (0 picks a free port).
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// Allowed CORS origin ("*" for any).
    #[arg(long, env = "CORS_ORIGIN", default_value = "*")]
    cors_origin: String,

    /// Emit JSON log lines instead of the human-readable format.
    #[arg(long, env = "JSON_LOGS")]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    oxo_telemetry::init_telemetry(&TelemetryConfig {
        json: cli.json_logs,
        ..TelemetryConfig::default()
    });

    tracing::info!("starting oxo server");

    let registry = Arc::new(GameRegistry::new());
    let config = ServerConfig {
        host: cli.host,
        port: cli.port,
        cors_origin: cli.cors_origin,
        ..ServerConfig::default()
    };

    let handle = oxo_server::start(config, registry)
        .await
        .context("failed to start server")?;
    tracing::info!(port = handle.port, "oxo server ready");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl+c")?;
    tracing::info!("shutting down");
    Ok(())
}
