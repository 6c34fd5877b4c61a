// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

use std::net::SocketAddr;
use std::sync::Arc;

use firmware_notifier::cache::{CacheStore, SqliteCacheStore, start_cache_purge_task};
use firmware_notifier::captcha::{CaptchaVerifier, HCaptchaVerifier};
use firmware_notifier::clock::{Clock, SystemClock};
use firmware_notifier::db::Database;
use firmware_notifier::devices::{DeviceCatalog, FirmwareCache};
use firmware_notifier::notify::{EmailNotifier, Notifier, TemplateStore, UnsubscribeLinks};
use firmware_notifier::subscriptions::{
    SqliteSubscriptionStore, SubscriptionService, SubscriptionStore,
};
use firmware_notifier::upstream::IpswClient;
use firmware_notifier::{
    AppError, AppState, Config, Dispatcher, MetricsRegistry, Result, create_router,
    start_dispatch_loop,
};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // .env first so RUST_LOG from it reaches the filter
    dotenvy::dotenv().ok();
    setup_tracing();

    let config = Config::from_env();
    config.validate().map_err(|e| {
        tracing::error!("Invalid configuration: {}", e);
        AppError::Config(e)
    })?;

    tracing::info!(
        "Dispatch every {}s, catalog TTL {}s, firmware TTL {}s",
        config.dispatch_interval.as_secs(),
        config.catalog_ttl.as_secs(),
        config.firmware_ttl.as_secs()
    );

    let db = Database::open(&config.database_path).await?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let metrics = MetricsRegistry::new();

    let cache: Arc<dyn CacheStore> = Arc::new(SqliteCacheStore::new(db.clone(), clock.clone()));
    let upstream = Arc::new(IpswClient::new(
        &config.upstream_base_url,
        config.upstream_timeout,
    )?);
    let catalog = Arc::new(DeviceCatalog::new(
        cache.clone(),
        upstream.clone(),
        clock.clone(),
        config.catalog_ttl,
        metrics.clone(),
    ));
    let firmware = Arc::new(FirmwareCache::new(
        cache.clone(),
        upstream,
        clock.clone(),
        config.firmware_ttl,
        config.firmware_retention,
        metrics.clone(),
    ));

    let templates = TemplateStore::load_dir(&config.template_dir).map_err(|e| {
        tracing::error!(
            "Failed to load templates from {}: {}",
            config.template_dir.display(),
            e
        );
        e
    })?;
    tracing::info!("Loaded {} notification template(s)", templates.len());
    let notifier: Arc<dyn Notifier> = Arc::new(EmailNotifier::new(
        config.mail_relay.clone(),
        templates,
        config.upstream_timeout,
    )?);
    let links = UnsubscribeLinks::new(&config.public_base_url);

    let store: Arc<dyn SubscriptionStore> = Arc::new(SqliteSubscriptionStore::new(db));
    let subscriptions = Arc::new(SubscriptionService::new(
        store.clone(),
        catalog.clone(),
        firmware.clone(),
        notifier.clone(),
        links.clone(),
        clock.clone(),
        metrics.clone(),
    ));
    let dispatcher = Arc::new(Dispatcher::new(
        store.clone(),
        catalog.clone(),
        firmware,
        notifier,
        links,
        clock,
        metrics.clone(),
        config.dispatch_concurrency,
    ));

    let captcha = match &config.captcha {
        Some(captcha) => Some(Arc::new(HCaptchaVerifier::new(
            captcha.clone(),
            config.upstream_timeout,
        )?) as Arc<dyn CaptchaVerifier>),
        None => None,
    };

    let state = Arc::new(AppState {
        metrics,
        catalog,
        store,
        subscriptions,
        captcha,
    });

    // Graceful shutdown channel shared by every background loop
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn({
        let shutdown_tx = shutdown_tx.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown signal received");
                let _ = shutdown_tx.send(true);
            }
        }
    });

    let dispatch_handle =
        start_dispatch_loop(shutdown_rx.clone(), dispatcher, config.dispatch_interval);
    let purge_handle =
        start_cache_purge_task(cache, config.cache_purge_interval, shutdown_rx.clone());

    let app = create_router(state);

    let addr: SocketAddr = config.server_addr.parse().map_err(|e| {
        tracing::error!("Invalid server address: {}", e);
        e
    })?;

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        tracing::error!("Failed to bind address: {}", e);
        e
    })?;

    tracing::info!("Firmware notifier starting on {}", addr);
    tracing::info!("Endpoints:");
    tracing::info!("  - GET  /health      - Health check");
    tracing::info!("  - GET  /metrics     - Prometheus metrics");
    tracing::info!("  - GET  /stats       - Subscription counts");
    tracing::info!("  - GET  /devices     - Device catalog by family");
    tracing::info!("  - POST /subscribe   - Subscribe to a device");
    tracing::info!("  - GET  /unsubscribe - Unsubscribe confirmation");
    tracing::info!("  - POST /unsubscribe - Unsubscribe");

    let mut server_shutdown = shutdown_rx;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = server_shutdown.changed().await;
            tracing::info!("HTTP server shutting down");
        })
        .await
        .map_err(|e| {
            tracing::error!("Server error: {}", e);
            e
        })?;

    let _ = dispatch_handle.await;
    let _ = purge_handle.await;
    tracing::info!("Shutdown complete");

    Ok(())
}

fn setup_tracing() {
    // RUST_LOG when set, "info" otherwise
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
