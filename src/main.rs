//! hot-router
//!
//! A config-driven HTTP router whose routing table can be rebuilt and
//! swapped while it serves traffic.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server (axum + tower-http layers)
//!                         │
//!                         ▼  capture current generation
//!                     routing::Router ──▶ Generation (radix tree)
//!                         │                    ▲
//!                         ▼                    │ rebuild + atomic swap
//!                     handler chain        config / admin / SIGHUP
//!                         │
//!     ◀───────────────────┘  Context → Response
//! ```

use std::path::PathBuf;

use clap::Parser;
use hot_router::config::{load_config, RouterConfig};
use hot_router::handler::registry::HandlerRegistry;
use hot_router::handler::HandlerChain;
use hot_router::lifecycle::startup;
use hot_router::observability::logging;
use hot_router::{Context, HandlerError};

/// Environment variable consulted when no config path is given.
const CONFIG_ENV: &str = "HOT_ROUTER_CONFIG";

#[derive(Parser)]
#[command(name = "hot-router")]
#[command(about = "HTTP router with hot-swappable routing tables", long_about = None)]
struct Cli {
    /// Path to the TOML config. Falls back to $HOT_ROUTER_CONFIG, then defaults.
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config_path = cli.config.or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

    let config = match &config_path {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                logging::init_logging(&RouterConfig::default().observability);
                tracing::error!(path = %path.display(), error = %e, "Failed to load configuration");
                return Err(e.into());
            }
        },
        None => RouterConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?config_path,
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        "hot-router starting"
    );

    let mut registry = HandlerRegistry::new();
    registry.register(
        "health",
        HandlerChain::from_handler(|ctx: &mut Context| -> Result<(), HandlerError> {
            ctx.string(axum::http::StatusCode::OK, "ok");
            Ok(())
        }),
    );

    startup::run(config, config_path, registry).await?;
    Ok(())
}
