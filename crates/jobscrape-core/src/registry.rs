use std::sync::Arc;

use crate::traits::Extractor;

/// Ordered set of site extractors plus one catch-all fallback.
///
/// Resolution walks the registrations in insertion order and returns the
/// first one that can handle the URL, so narrower patterns must be
/// registered before broader ones. Build it at startup, then share it
/// behind an `Arc`.
pub struct ExtractorRegistry {
    extractors: Vec<Arc<dyn Extractor>>,
    fallback: Arc<dyn Extractor>,
}

impl ExtractorRegistry {
    pub fn new(fallback: Arc<dyn Extractor>) -> Self {
        Self {
            extractors: Vec::new(),
            fallback,
        }
    }

    /// Append a strategy at the lowest priority so far.
    pub fn register(&mut self, extractor: Arc<dyn Extractor>) {
        tracing::debug!(extractor = extractor.name(), "Registered extractor");
        self.extractors.push(extractor);
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.register(extractor);
        self
    }

    /// The first matching strategy, or the fallback.
    pub fn resolve(&self, url: &str) -> Arc<dyn Extractor> {
        self.extractors
            .iter()
            .find(|e| e.can_handle(url))
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.fallback))
    }

    pub fn fallback(&self) -> Arc<dyn Extractor> {
        Arc::clone(&self.fallback)
    }

    /// Strategy names in priority order, fallback last.
    pub fn names(&self) -> Vec<&str> {
        self.extractors
            .iter()
            .map(|e| e.name())
            .chain(std::iter::once(self.fallback.name()))
            .collect()
    }
}
