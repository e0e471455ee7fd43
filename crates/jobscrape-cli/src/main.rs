use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use jobscrape_client::{ReqwestFetcher, default_registry};
use jobscrape_core::models::ScrapeOptions;
use jobscrape_core::traits::CacheStore;
use jobscrape_core::util::parse_http_url;
use jobscrape_core::{NullCache, ScrapeService, ScraperConfig, Telemetry};
use jobscrape_db::{CacheRepository, Database, DatabaseConfig};

#[derive(Parser)]
#[command(name = "jobscrape", version, about = "Job posting scraper")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape a job posting and print it as JSON
    Scrape {
        /// Job posting URL
        #[arg(short, long)]
        url: String,

        /// Fetch fresh content and skip the cache write
        #[arg(long, default_value_t = false)]
        bypass_cache: bool,

        /// Run without the PostgreSQL cache even when DATABASE_URL is set
        #[arg(long, default_value_t = false)]
        no_cache: bool,

        /// Print the telemetry report to stderr after scraping
        #[arg(long, default_value_t = false)]
        stats: bool,
    },

    /// Inspect or maintain the scrape cache (requires DATABASE_URL)
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// List registered extractors, or show which one handles a URL
    Extractors {
        #[arg(short, long)]
        url: Option<String>,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Show the cached entry for a URL without counting a hit
    Get {
        #[arg(short, long)]
        url: String,
    },
    /// Remove the cached entry for a URL
    Delete {
        #[arg(short, long)]
        url: String,
    },
    /// Delete every expired entry
    Purge,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("jobscrape=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scrape {
            url,
            bypass_cache,
            no_cache,
            stats,
        } => {
            let config = ScraperConfig::from_env()?;
            let options = ScrapeOptions { bypass_cache };
            let db_config = if no_cache {
                None
            } else {
                DatabaseConfig::from_env_optional()?
            };

            match db_config {
                Some(db_config) => {
                    let repo = connect_cache(&db_config).await?;
                    cmd_scrape(&url, options, stats, &config, repo).await?;
                }
                None => {
                    tracing::info!("Running without cache");
                    cmd_scrape(&url, options, stats, &config, NullCache).await?;
                }
            }
        }
        Commands::Cache { action } => {
            let db_config = DatabaseConfig::from_env()
                .context("DATABASE_URL not set. Required for cache commands.")?;
            let repo = connect_cache(&db_config).await?;
            cmd_cache(action, repo).await?;
        }
        Commands::Extractors { url } => cmd_extractors(url.as_deref()),
    }

    Ok(())
}

async fn connect_cache(config: &DatabaseConfig) -> Result<CacheRepository> {
    let db = Database::connect(config)
        .await
        .context("Failed to connect to database")?;
    db.migrate().await?;
    Ok(db.cache_repo())
}

async fn cmd_scrape<S: CacheStore>(
    url: &str,
    options: ScrapeOptions,
    stats: bool,
    config: &ScraperConfig,
    cache: S,
) -> Result<()> {
    let fetcher = ReqwestFetcher::with_config(config.fetch.clone())
        .context("Failed to create HTTP client")?;
    let service = ScrapeService::from_config(fetcher, Arc::new(default_registry()), config)
        .with_cache(cache)
        .with_telemetry(Telemetry::new());

    let result = service.scrape(url, options).await;

    if stats && let Some(telemetry) = service.telemetry() {
        eprintln!("{}", serde_json::to_string_pretty(&telemetry.report())?);
    }

    match result {
        Ok(record) => {
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        Err(e) => {
            if let Some(details) = e.technical_details() {
                tracing::debug!(%details, "Scrape failure details");
            }
            eprintln!("hint: {}", e.suggestion());
            Err(anyhow::anyhow!(e))
        }
    }
}

/// Cache rows are keyed by the normalized URL, e.g. with a trailing `/` on bare hosts.
fn cache_key(url: &str) -> Result<String> {
    parse_http_url(url)
        .map(String::from)
        .with_context(|| format!("'{url}' is not an absolute http(s) URL"))
}

async fn cmd_cache(action: CacheAction, repo: CacheRepository) -> Result<()> {
    match action {
        CacheAction::Get { url } => {
            let repo = repo.without_hit_counting();
            match repo.get(&cache_key(&url)?).await? {
                Some(entry) => println!("{}", serde_json::to_string_pretty(&entry)?),
                None => println!("No cache entry for {url}"),
            }
        }
        CacheAction::Delete { url } => {
            if repo.delete(&cache_key(&url)?).await? {
                println!("Deleted cache entry for {url}");
            } else {
                println!("No cache entry for {url}");
            }
        }
        CacheAction::Purge => {
            let purged = repo.purge_expired().await?;
            println!("Purged {purged} expired entries");
        }
    }
    Ok(())
}

fn cmd_extractors(url: Option<&str>) {
    let registry = default_registry();
    match url {
        Some(url) => println!("{}", registry.resolve(url).name()),
        None => {
            for name in registry.names() {
                println!("{name}");
            }
        }
    }
}
