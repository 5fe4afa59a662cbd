//! Correlating reverse proxy (v1)
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────┐
//!                 │                   CALLBACK PROXY                     │
//!   Client POST   │  ┌────────┐    ┌───────────┐   final   ┌──────────┐  │
//!   ──────────────┼─▶│  http  │───▶│ forwarder │──────────▶│ response │──┼──▶ Client
//!                 │  │ server │    └─────┬─────┘           └────▲─────┘  │
//!                 │  └───┬────┘          │ deferred             │        │
//!                 │      │               ▼                      │        │
//!                 │      │         ┌───────────┐   deliver      │        │
//!   Completion    │      └────────▶│ registry  │────────────────┘        │
//!   POST + id ────┼───────────────▶│   loop    │◀──── expiry timer       │
//!                 │                └───────────┘                         │
//!                 └──────────────────────────────────────────────────────┘
//! ```
//!
//! Environment:
//! - `C4PROXY_TO`: downstream base URL (proxy) or proxy URL (simulator)
//! - `C4PROXY_TEST_MODE`: non-empty runs the downstream simulator
//! - `C4PROXY_CONFIG`: optional TOML file

use callback_proxy::config::{load_from_env, ObservabilityConfig};
use callback_proxy::lifecycle;
use callback_proxy::observability::logging::init_tracing;

#[tokio::main]
async fn main() {
    let config = match load_from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(&ObservabilityConfig::default().log_filter);
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    init_tracing(&config.observability.log_filter);
    tracing::info!("callback-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    if let Err(e) = lifecycle::run(config).await {
        tracing::error!(error = %e, "Fatal error");
        std::process::exit(1);
    }

    tracing::info!("Shutdown complete");
}
