//! Pitchlane server entry point.
//!
//! Boots the interaction engine: configuration, logging, database and
//! migrations, service wiring and the realtime registry. Transports attach to
//! the wired [`Services`] and [`RealtimeHub`].

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use pitchlane_common::{Config, SystemTimeSource};
use pitchlane_core::{PolicySettings, RealtimeHub, ServiceContext, Services};
use pitchlane_db::SeaOrmStore;
use tokio::signal;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "pitchlane=debug,sea_orm=info".into());
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Periodically drop realtime channels nobody listens to.
async fn sweep_realtime(hub: RealtimeHub, every: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(every);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = hub.cleanup().await;
                if removed > 0 {
                    let connected = hub.connected_users().await;
                    tracing::debug!(removed, connected, "Swept idle realtime channels");
                }
            }
            _ = shutdown.changed() => break,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    info!("Starting pitchlane...");

    // Load configuration
    let config = Config::load().context("loading configuration")?;
    let settings = PolicySettings::try_from(&config.policy).context("validating policy tables")?;
    info!(timezone = %settings.timezone, "Policy settings loaded");

    // Connect to database
    let db = pitchlane_db::init(&config)
        .await
        .context("connecting to database")?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    pitchlane_db::migrate(&db).await.context("running migrations")?;
    info!("Migrations completed");

    // Wire services
    let store = Arc::new(SeaOrmStore::new(Arc::new(db)));
    let hub = Arc::new(RealtimeHub::new(&config.realtime));
    let ctx = ServiceContext::new(store, Arc::new(settings), Arc::new(SystemTimeSource))
        .with_emitter(hub.clone());
    let services = Services::new(&ctx);
    info!("Services initialized");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = tokio::spawn(sweep_realtime(
        hub.as_ref().clone(),
        Duration::from_secs(config.realtime.sweep_interval_secs.max(1)),
        shutdown_rx,
    ));

    shutdown_signal().await;

    shutdown_tx.send(true).ok();
    sweeper.await.context("joining realtime sweeper")?;
    drop(services);

    info!("Server shutdown complete");
    Ok(())
}
