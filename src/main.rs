//! INN check server
//!
//! Entry point for the INN check page and its live result stream.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::sync::Arc;

use dotenvy::dotenv;
use inn_check::{config::AppConfig, server, telemetry};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present) before anything reads the environment
    let _ = dotenv();

    telemetry::init();

    let config = AppConfig::load_from_args(std::env::args())?;
    info!(
        name: "config.loaded",
        host = %config.server.host,
        port = config.server.port,
        token_required = config.security.token_required,
        "Configuration loaded"
    );

    server::start_server(Arc::new(config)).await
}
