//! Blackhole notification sink.
//!
//! Serves a cached XML acknowledgement for every webhook callout and,
//! when a MySQL backend is configured, records the organization behind
//! each POST. Startup provisions the schema before the first request.

#![forbid(unsafe_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use blackhole_api::{AppState, Config, ResponseCache};
use blackhole_core::{
    ConnectionProvider, DbConfig, MysqlVisitStorage, ProvisioningService, RealClock, VisitLogger,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    info!("Starting Blackhole notification sink");

    let config = Config::load()?;
    let addr = config.parse_server_addr()?;

    let cache = ResponseCache::load(&config.response_file)?;

    let visits = if blackhole_core::has_backend() {
        Some(bring_up_backend().await?)
    } else {
        info!("no database configured, visit logging disabled");
        None
    };

    let state = AppState { cache, visits };

    info!(%addr, "Blackhole is ready to receive notifications");
    blackhole_api::start_server(state, addr, config.request_timeout())
        .await
        .context("HTTP server failed")?;

    info!("Blackhole shutdown complete");
    Ok(())
}

/// Validates the database configuration and provisions the schema.
///
/// A backend was expected, so a malformed configuration or a failed
/// provisioning run is fatal: serving without the schema would silently
/// drop every visit.
async fn bring_up_backend() -> Result<VisitLogger> {
    let db_config = DbConfig::resolve().context("database backend configured but unusable")?;
    info!(database_url = %db_config.masked_url(), "database backend configured");

    let provider = Arc::new(ConnectionProvider::new(Arc::new(RealClock::new())));
    let storage = Arc::new(MysqlVisitStorage::new(provider));

    ProvisioningService::with_default_registry(storage.clone())
        .ensure_schema()
        .await
        .context("schema provisioning failed")?;
    info!("schema provisioning complete");

    Ok(VisitLogger::new(storage))
}

/// Initializes tracing with environment-based configuration.
fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info,blackhole=debug,tower_http=debug"))
        .expect("Invalid RUST_LOG environment variable");

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
}
