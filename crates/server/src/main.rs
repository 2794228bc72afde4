//! Card Ledger server - JSON API for tracking owned trading cards.
//!
//! # Architecture
//!
//! - Axum JSON routes, identity taken from the `x-owner-id` header
//! - Card catalog fetched from the indexed endpoint and cached for 24 hours
//! - `PostgreSQL` for ownership records and friend links

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use card_ledger_server::catalog::{CatalogError, build_catalog_cache};
use card_ledger_server::config::{ConfigError, LedgerConfig};
use card_ledger_server::db::{self, PgOwnershipStore};
use card_ledger_server::state::AppState;
use sentry::integrations::tracing as sentry_tracing;
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Reasons the server fails to start.
#[derive(Debug, Error)]
enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("catalog setup error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &LedgerConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        tracing::error!(error = %e, "card-ledger-server failed");
        #[allow(clippy::print_stderr)]
        {
            eprintln!("card-ledger-server: {e}");
        }
        std::process::exit(1);
    }
}

async fn run() -> Result<(), StartupError> {
    let config = LedgerConfig::from_env()?;

    // Must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "card_ledger_server=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    // NOTE: Migrations are NOT run automatically on startup.
    // Run them explicitly via: cargo run -p card-ledger-cli -- migrate

    let catalog = build_catalog_cache(&config.catalog)?;
    tracing::info!(
        url = %config.catalog.url,
        cache_dir = %config.catalog.cache_dir.display(),
        max_age_secs = config.catalog.max_age.as_secs(),
        "Catalog cache configured"
    );

    let store = Arc::new(PgOwnershipStore::new(pool.clone()));
    let state = AppState::new(catalog, store, config.catalog.image_cdn_url.clone()).with_pool(pool);
    let app = card_ledger_server::app(state);

    let addr = config.socket_addr();
    tracing::info!("card-ledger-server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
