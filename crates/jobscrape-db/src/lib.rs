pub mod cache_repository;
pub mod config;
pub mod database;

pub use cache_repository::CacheRepository;
pub use config::DatabaseConfig;
pub use database::Database;
