use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use billing_engine::{BillingEngine, PgStore};
use billing_service::{config::AppConfig, metrics_server, observability, routes};
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let cfg = AppConfig::load()?;

    // Start metrics server if configured
    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr);
    }

    let pool = PgPoolOptions::new()
        .max_connections(cfg.database.max_connections)
        .connect(&cfg.database.uri)
        .await?;

    let engine = BillingEngine::new(PgStore::new(pool));
    let state = routes::AppState {
        engine: Arc::new(engine),
    };

    let addr: SocketAddr = cfg
        .http
        .bind_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid http.bind_addr: {e}"))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "billing API listening");

    axum::serve(listener, routes::router(state).into_make_service()).await?;

    Ok(())
}
