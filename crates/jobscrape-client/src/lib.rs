pub mod document;
pub mod extractors;
pub mod fetcher;

pub use document::JobDocument;
pub use extractors::{GenericExtractor, SiteExtractor, SiteProfile, default_registry};
pub use fetcher::ReqwestFetcher;
