//! # Secret Runtime
//!
//! Process wiring for the secret derivation service.
//!
//! ## Startup Sequence
//!
//! 1. Load `.env` (if present)
//! 2. Initialise logging (`RUST_LOG`, default `info`)
//! 3. Load and validate configuration; any error is fatal
//! 4. Build the deriver and the HTTP gateway
//! 5. Serve until Ctrl+C

pub mod config;

use std::future::Future;

use anyhow::{Context, Result};
use secret_gateway::SecretGatewayService;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

pub use config::{load_dotenv, RuntimeConfig, RuntimeConfigError};

/// Install the global fmt subscriber.
pub fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Run the gateway until `shutdown` resolves.
pub async fn run<F>(config: RuntimeConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (gateway_config, deriver) = config.into_parts();

    info!("===========================================");
    info!("  Secret Runtime v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");
    info!(
        rounds = deriver.rounds().get(),
        min_phrase_length = deriver.policy().min_length,
        origins = ?gateway_config.cors.allowed_origins,
        "Derivation configured"
    );

    let service = SecretGatewayService::new(gateway_config, deriver)
        .context("Failed to build HTTP gateway")?;
    service
        .start(shutdown)
        .await
        .context("HTTP gateway terminated")?;

    info!("Shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C.
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            // Without a signal handler the server runs until killed.
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
