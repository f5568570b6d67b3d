//! route-gateway: dynamic path-prefix HTTP gateway.
//!
//! ```text
//!                       ┌──────────────────────────────────────────┐
//!     Client Request    │  ┌──────────┐    ┌──────────┐            │
//!     ──────────────────┼─▶│ listener │───▶│ dispatch │──┐         │
//!                       │  │ :port    │    └──────────┘  │ longest │
//!                       │  └──────────┘                  │ prefix  │
//!                       │                          ┌─────▼──────┐  │      ┌─────────┐
//!                       │                          │ RouteTable │──┼─────▶│ backend │
//!                       │                          └─────▲──────┘  │      └─────────┘
//!     Operator / CLI    │  ┌────────────┐    ┌───────────┴──┐      │
//!     ──────────────────┼─▶│ management │───▶│  RouteStore  │──▶ routes.json
//!                       │  │ 127.0.0.1  │    └──────────────┘      │
//!                       │  └────────────┘                          │
//!                       └──────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use route_gateway::config::loader::{load_config, locate_config, search_dirs};
use route_gateway::config::{GatewayConfig, RuntimeState};
use route_gateway::lifecycle::signals::spawn_signal_handler;
use route_gateway::lifecycle::startup::{check_prerequisites, PidFile};
use route_gateway::lifecycle::{Gateway, Shutdown};
use route_gateway::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "route-gateway", version)]
#[command(about = "Dynamic path-prefix HTTP gateway", long_about = None)]
struct Args {
    /// Configuration file; searched for in the usual locations when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config_path = args.config.or_else(|| locate_config(&search_dirs()));
    let config = match &config_path {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    let _log_guard = logging::init_logging(&config.logging)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "route-gateway starting");

    match &config_path {
        Some(path) => tracing::info!(file = %path.display(), "Configuration loaded"),
        None => tracing::warn!("No configuration file found, using defaults"),
    }

    let metrics_handle = metrics::install_recorder();
    let runtime = Arc::new(RuntimeState::new(config, config_path));

    check_prerequisites(runtime.runtime_path())?;
    let pid_file = PidFile::create(runtime.runtime_path())?;

    if let Err(e) = runtime.pin_gateway_port() {
        tracing::warn!(error = %e, "Cannot write fallback gateway port to config file");
    }

    let shutdown = Shutdown::new();
    let signals = spawn_signal_handler(shutdown.clone());

    let result = Gateway::new(runtime)
        .with_metrics(metrics_handle)
        .run(shutdown)
        .await;

    signals.abort();
    drop(pid_file);

    match &result {
        Ok(()) => tracing::info!("Shutdown complete"),
        Err(e) => tracing::error!(error = %e, "Gateway exited with error"),
    }
    result.map_err(Into::into)
}
