use std::time::Duration;

use jobscrape_db::Database;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use testcontainers::core::{ContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};

const CONNECT_ATTEMPTS: u32 = 30;

/// Postgres 16 container with the cache schema applied.
///
/// Keep the container alive for the whole test; dropping it stops Postgres.
pub async fn setup_test_db() -> (PgPool, ContainerAsync<GenericImage>) {
    let container = GenericImage::new("postgres", "16")
        .with_exposed_port(ContainerPort::Tcp(5432))
        .with_wait_for(WaitFor::message_on_stderr(
            "database system is ready to accept connections",
        ))
        .with_env_var("POSTGRES_PASSWORD", "postgres")
        .with_env_var("POSTGRES_DB", "jobscrape_cache")
        .start()
        .await
        .expect("postgres container should start");

    let host = container.get_host().await.expect("container host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("mapped postgres port");
    let url = format!("postgresql://postgres:postgres@{host}:{port}/jobscrape_cache");

    let pool = connect_with_retry(&url).await;
    Database::from_pool(pool.clone())
        .migrate()
        .await
        .expect("cache migrations should apply");

    (pool, container)
}

// The readiness log line can appear before the server accepts TCP connections.
async fn connect_with_retry(url: &str) -> PgPool {
    let mut last_error = None;
    for _ in 0..CONNECT_ATTEMPTS {
        match PgPoolOptions::new().max_connections(4).connect(url).await {
            Ok(pool) => return pool,
            Err(e) => last_error = Some(e),
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("postgres never accepted connections: {last_error:?}");
}
