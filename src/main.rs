//! Orion Chat server binary.
//!
//! Configuration comes from the environment (see [`ServerConfig`]); log
//! verbosity from `RUST_LOG`.

use orion_chat::{ChatServer, Result, ServerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "orion_chat=info";

/// Initialize tracing/logging.
fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let config = ServerConfig::from_env()?;
    let server = ChatServer::bind(config).await?;
    info!(url = %server.ws_url(), "Orion chat listening");

    tokio::signal::ctrl_c().await?;
    server.shutdown().await;

    Ok(())
}
