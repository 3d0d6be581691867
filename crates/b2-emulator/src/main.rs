//! B2 Emulator - in-memory Backblaze B2 API server

use b2_emulator::{run_server_with_shutdown, EmulatorConfig};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "b2-emulator")]
#[command(about = "In-memory server for the Backblaze B2 API")]
#[command(version)]
struct Args {
    /// Host to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1", env = "B2_EMULATOR_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8180", env = "B2_EMULATOR_PORT")]
    port: u16,

    /// Account id accepted by b2_authorize_account
    #[arg(long, default_value = "emulator-account", env = "B2_EMULATOR_ACCOUNT_ID")]
    account_id: String,

    /// Application key accepted by b2_authorize_account
    #[arg(long, default_value = "emulator-key", env = "B2_EMULATOR_APPLICATION_KEY")]
    application_key: String,

    /// Base URL handed to clients (e.g. when running behind a proxy)
    #[arg(long, env = "B2_EMULATOR_PUBLIC_URL")]
    public_url: Option<String>,

    /// Enable debug logging
    #[arg(short, long, env = "B2_EMULATOR_DEBUG")]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| format!("b2_emulator={},tower_http=debug", log_level).into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting B2 emulator on {}:{}", args.host, args.port);
    tracing::info!("Account: {}", args.account_id);
    tracing::warn!("⚠️  In-memory storage - data will NOT persist!");

    let config = EmulatorConfig {
        host: args.host,
        port: args.port,
        account_id: args.account_id,
        application_key: args.application_key,
        public_url: args.public_url,
        ..Default::default()
    };

    run_server_with_shutdown(config, shutdown_signal()).await
}

/// Resolves on Ctrl+C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
