//! Saga Orchestrator Service
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────┐
//!                    │              SAGA ORCHESTRATOR               │
//!                    │                                              │
//!   SIGTERM/SIGINT ──┼─▶ signals ──▶ shutdown channel               │
//!                    │                     │                        │
//!                    │                     ▼                        │
//!                    │   ┌──────────────────────────────────┐       │
//!                    │   │       lifecycle controller       │       │
//!                    │   │ telemetry → cache → db → listen  │       │
//!                    │   └────────────────┬─────────────────┘       │
//!                    │                    │                         │
//!   Client ──────────┼─▶ http router ─────┼──▶ /health  (aggregator) │
//!                    │                    ├──▶ /metrics (registry)  │
//!                    │                    └──▶ /api/*   (domain)    │
//!                    └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::Instrument;

use saga_orchestrator::config::load_config;
use saga_orchestrator::deps::{PostgresDatabase, RedisCache};
use saga_orchestrator::domain::SagaRouter;
use saga_orchestrator::lifecycle::spawn_signal_listener;
use saga_orchestrator::observability::{init_logging, PrometheusRegistry};
use saga_orchestrator::{Components, LifecycleController, ServiceIdentity};

#[derive(Parser)]
#[command(name = "saga-orchestrator")]
#[command(about = "Saga orchestrator service", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "SAGA_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config.observability) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    let identity = ServiceIdentity::new(config.service.name.as_str());
    let span = tracing::info_span!("service", name = %identity);

    tracing::info!(
        service = %identity,
        port = config.listener.port,
        "saga-orchestrator v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let metrics = match PrometheusRegistry::install(&identity) {
        Ok(registry) => Arc::new(registry),
        Err(e) => {
            tracing::error!(error = %e, "Failed to install metrics recorder");
            return ExitCode::FAILURE;
        }
    };

    let cache = match RedisCache::new(&config.cache) {
        Ok(cache) => Arc::new(cache),
        Err(e) => {
            tracing::error!(error = %e, "Invalid cache configuration");
            return ExitCode::FAILURE;
        }
    };

    let components = Components {
        database: Arc::new(PostgresDatabase::new(&config.database)),
        cache,
        metrics,
        domain: Arc::new(SagaRouter),
    };
    let controller = LifecycleController::new(config, components);

    if let Err(e) = spawn_signal_listener(controller.shutdown_handle()) {
        tracing::error!(error = %e, "Failed to install signal handlers");
        return ExitCode::FAILURE;
    }

    match controller.run().instrument(span).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start server");
            ExitCode::FAILURE
        }
    }
}
