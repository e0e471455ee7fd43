use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use jobscrape_client::{ReqwestFetcher, default_registry};
use jobscrape_core::{MemoryCache, ScrapeService, ScraperConfig, Telemetry};
use jobscrape_db::{Database, DatabaseConfig};
use jobscrape_server::routes;
use jobscrape_server::state::{AppState, CacheBackend};

const MAX_BODY_BYTES: usize = 64 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("jobscrape=info".parse()?))
        .with_target(false)
        .init();

    let port = std::env::var("JOBSCRAPE_SERVER_PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("0.0.0.0:{port}");

    let config = ScraperConfig::from_env()?;

    let cache = match DatabaseConfig::from_env_optional()? {
        Some(db_config) => {
            let db = Database::connect(&db_config)
                .await
                .context("Failed to connect to the cache database")?;
            db.migrate().await?;
            tracing::info!("Using PostgreSQL cache");
            CacheBackend::Postgres(db.cache_repo())
        }
        None => {
            tracing::info!("DATABASE_URL not set, using in-memory cache");
            CacheBackend::Memory(MemoryCache::new())
        }
    };

    let fetcher = ReqwestFetcher::with_config(config.fetch.clone())?;
    let service = ScrapeService::from_config(fetcher, Arc::new(default_registry()), &config)
        .with_cache(cache)
        .with_telemetry(Telemetry::new());

    tracing::info!(
        extractors = ?service.registry().names(),
        rpm = config.rate_limit.requests_per_minute,
        per_domain = config.rate_limit.per_domain,
        "Scrape service ready"
    );

    let state = Arc::new(AppState { service });

    let app = routes::router(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    tracing::info!("Starting server on {addr}");
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for CTRL+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
