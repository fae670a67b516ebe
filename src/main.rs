//! Sales Facts - periodic sales fact resolution service

use anyhow::Result;
use sales_facts::api::{self, AppState};
use sales_facts::notify::NatsNotifier;
use sales_facts::scheduler::RefreshScheduler;
use sales_facts::store::{PgFactSink, PgSnapshotSource};
use sales_facts::{Config, FactStore, RefreshService};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();
    let config = Config::from_env()?;
    let db = PgPoolOptions::new().max_connections(config.max_connections).connect(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&db).await?;

    let mut refresher = RefreshService::new(Arc::new(PgSnapshotSource::new(db.clone())), Arc::new(FactStore::new()));
    if config.persist_facts { refresher = refresher.with_sink(Arc::new(PgFactSink::new(db.clone()))); }
    let refresher = Arc::new(refresher);
    let shutdown = CancellationToken::new();

    if let Some(url) = &config.nats_url {
        match async_nats::connect(url.as_str()).await {
            Ok(client) => { tokio::spawn(NatsNotifier::new(client, config.nats_subject.clone()).forward(refresher.subscribe(), shutdown.clone())); }
            Err(e) => tracing::warn!(error = %e, "NATS unavailable; refresh notifications disabled"),
        }
    }
    match config.refresh_interval() {
        Some(interval) => { tokio::spawn(RefreshScheduler::new(refresher.clone(), interval, shutdown.clone()).run()); }
        None => tracing::info!("scheduled refresh disabled; waiting for on-demand triggers"),
    }

    let app = api::router(AppState { refresher, shutdown: shutdown.clone() });
    tracing::info!("🚀 Sales facts engine listening on 0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    axum::serve(listener, app).with_graceful_shutdown(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("shutdown requested");
        shutdown.cancel();
    }).await?;
    Ok(())
}
