//! Secret derivation service entry point.

use anyhow::{Context, Result};
use secret_runtime::{init_logging, load_dotenv, run, shutdown_signal, RuntimeConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // .env first so RUST_LOG from the file applies
    let dotenv = load_dotenv();
    init_logging()?;
    if let Some(path) = dotenv {
        info!(path = %path.display(), "Loaded .env file");
    }

    let config = RuntimeConfig::from_env().context("Invalid configuration, refusing to start")?;

    info!("Secret runtime is starting. Press Ctrl+C to stop.");
    run(config, shutdown_signal()).await
}
