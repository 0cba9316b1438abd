//! # MovieSpace server
//!
//! Assembles the application: settings, tracing, the configured store,
//! auth adapters, services and the axum router.

use std::sync::Arc;

use anyhow::Context;
use api_adapters::AppState;
use auth_adapters::{Argon2Hasher, JwtTokenService};
use configs::{LogFormat, LogSettings, Settings, StorageBackend};
use secrecy::ExposeSecret;
use services::{AppServices, Repositories};
use storage_adapters::MemoryStore;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(log: &LogSettings) {
    // RUST_LOG wins over the configured filter
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match log.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}

async fn repositories(settings: &Settings) -> anyhow::Result<Repositories> {
    match settings.storage.backend {
        StorageBackend::Memory => {
            warn!("using the in-memory store; data is lost on restart");
            Ok(Repositories::from_store(Arc::new(MemoryStore::new())))
        }
        #[cfg(feature = "db-postgres")]
        StorageBackend::Postgres => {
            let store = storage_adapters::PgStore::connect(
                settings.database.url.expose_secret(),
                settings.database.max_connections,
            )
            .await
            .context("connecting to postgres")?;
            store.migrate().await.context("running migrations")?;
            Ok(Repositories::from_store(Arc::new(store)))
        }
        #[cfg(not(feature = "db-postgres"))]
        StorageBackend::Postgres => {
            anyhow::bail!("this build was compiled without the db-postgres feature")
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to listen for SIGTERM"),
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading configuration")?;
    init_tracing(&settings.log);

    let repos = repositories(&settings).await?;
    let tokens = JwtTokenService::new(
        settings.auth.jwt_secret.expose_secret().as_bytes(),
        chrono::Duration::try_hours(settings.auth.token_ttl_hours)
            .context("auth.token_ttl_hours is out of range")?,
    );
    let services = AppServices::new(repos, Arc::new(Argon2Hasher::new()), Arc::new(tokens));
    let app = api_adapters::router(AppState::new(services), &settings.server.cors_origins);

    let listener = TcpListener::bind(settings.server.addr())
        .await
        .with_context(|| format!("binding {}", settings.server.addr()))?;
    info!(addr = %listener.local_addr()?, backend = ?settings.storage.backend, "moviespace listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    info!("moviespace stopped");
    Ok(())
}
