use std::time::Duration;

use chrono::{TimeDelta, Utc};
use jobscrape_core::models::{NewCacheEntry, ScrapedRecord, ValidationHeaders};
use jobscrape_core::traits::CacheStore;
use jobscrape_db::CacheRepository;

use crate::integration::common::setup_test_db;

fn entry(url: &str, title: &str, ttl: Duration) -> NewCacheEntry {
    NewCacheEntry {
        url: url.into(),
        content: ScrapedRecord {
            title: title.into(),
            company: "Acme".into(),
            description: "Build the thing.".into(),
            salary: Some("USD 100000 - 120000 per year".into()),
            skills: vec!["Rust".into()],
            source_url: url.into(),
            extractor_name: "generic".into(),
            ..Default::default()
        },
        extractor_name: "generic".into(),
        ttl,
        http_status: Some(200),
        headers: ValidationHeaders {
            etag: Some("W/\"abc\"".into()),
            last_modified: Some("Mon, 13 Jan 2025 10:00:00 GMT".into()),
        },
    }
}

#[tokio::test]
async fn set_then_get_increments_hit_count() {
    let (pool, _container) = setup_test_db().await;
    let repo = CacheRepository::new(pool);
    assert!(repo.is_ready());

    let new = entry("https://a.example/job/1", "Engineer", Duration::from_secs(86_400));
    let id = repo.set(&new).await.unwrap();
    assert!(!id.is_nil());

    let hit = repo
        .get("https://a.example/job/1")
        .await
        .unwrap()
        .expect("row should exist");

    assert_eq!(hit.id, id);
    assert_eq!(hit.content, new.content);
    assert_eq!(hit.hit_count, 1);
    assert!(!hit.is_expired);
    assert_eq!(hit.http_status, Some(200));
    assert_eq!(hit.validation_headers, new.headers);
    let expected = Utc::now() + TimeDelta::hours(24);
    assert!((hit.expires_at - expected).num_seconds().abs() < 5);

    let again = repo.get("https://a.example/job/1").await.unwrap().unwrap();
    assert_eq!(again.hit_count, 2);
}

#[tokio::test]
async fn get_unknown_url_is_none() {
    let (pool, _container) = setup_test_db().await;
    let repo = CacheRepository::new(pool);
    assert!(repo.get("https://missing.example").await.unwrap().is_none());
}

#[tokio::test]
async fn overwrite_keeps_single_row_and_resets_hits() {
    let (pool, _container) = setup_test_db().await;
    let repo = CacheRepository::new(pool.clone());
    let url = "https://a.example/job/2";

    let first = repo
        .set(&entry(url, "Old title", Duration::from_secs(60)))
        .await
        .unwrap();
    repo.get(url).await.unwrap();
    repo.get(url).await.unwrap();

    let second = repo
        .set(&entry(url, "New title", Duration::from_secs(7200)))
        .await
        .unwrap();
    assert_eq!(first, second);

    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM scrape_cache WHERE url = $1")
        .bind(url)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count.0, 1);

    let row = repo
        .clone()
        .without_hit_counting()
        .get(url)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.hit_count, 0);
    assert_eq!(row.content.title, "New title");
    assert_eq!(row.expires_at - row.updated_at, TimeDelta::hours(2));
    assert!(row.created_at <= row.updated_at);
}

#[tokio::test]
async fn expired_rows_are_flagged_then_purged() {
    let (pool, _container) = setup_test_db().await;
    let repo = CacheRepository::new(pool);

    repo.set(&entry("https://old.example", "Old", Duration::from_millis(50)))
        .await
        .unwrap();
    repo.set(&entry("https://fresh.example", "Fresh", Duration::from_secs(3600)))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let stale = repo.get("https://old.example").await.unwrap().unwrap();
    assert!(stale.is_expired);

    assert_eq!(repo.purge_expired().await.unwrap(), 1);
    assert!(repo.get("https://old.example").await.unwrap().is_none());
    assert!(repo.get("https://fresh.example").await.unwrap().is_some());
}

#[tokio::test]
async fn delete_single_url() {
    let (pool, _container) = setup_test_db().await;
    let repo = CacheRepository::new(pool);

    repo.set(&entry("https://a.example", "E", Duration::from_secs(60)))
        .await
        .unwrap();
    assert!(repo.delete("https://a.example").await.unwrap());
    assert!(!repo.delete("https://a.example").await.unwrap());
}

#[tokio::test]
async fn closed_pool_is_not_ready() {
    let (pool, _container) = setup_test_db().await;
    let repo = CacheRepository::new(pool.clone());
    repo.health_check().await.unwrap();

    pool.close().await;
    assert!(!repo.is_ready());
}
