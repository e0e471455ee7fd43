//! Site-specific extraction strategies.
//!
//! Every site strategy is a [`SiteExtractor`] driven by a static
//! [`SiteProfile`] selector table and an optional hook for page structures
//! a selector list cannot express. Missing required fields are backfilled
//! from [`generic::extract_from`] on the same parsed document.

pub mod generic;
pub mod greenhouse;
pub mod indeed;
pub mod lever;
pub mod linkedin;
pub mod workday;
pub mod ziprecruiter;

use std::sync::Arc;

use jobscrape_core::models::ScrapedRecord;
use jobscrape_core::registry::ExtractorRegistry;
use jobscrape_core::traits::Extractor;
use jobscrape_core::util::parse_http_url;
use regex::{Regex, RegexBuilder};

use crate::document::JobDocument;

pub use generic::GenericExtractor;

/// Post-processing step run after the selector table, before backfill.
pub type SiteHook = fn(&JobDocument, &str, &mut ScrapedRecord);

/// Selector table for one job site.
///
/// Each field lists selectors tried in order; the first non-empty value
/// wins. A trailing `@attr` reads an attribute instead of text.
pub struct SiteProfile {
    pub name: &'static str,
    /// Case-insensitive regexes matched against the full URL.
    pub url_patterns: &'static [&'static str],
    pub title: &'static [&'static str],
    pub company: &'static [&'static str],
    pub description: &'static [&'static str],
    pub location: &'static [&'static str],
    pub salary: &'static [&'static str],
    pub job_type: &'static [&'static str],
    pub date_posted: &'static [&'static str],
    /// List-item selectors; every match becomes one entry.
    pub requirements: &'static [&'static str],
    pub benefits: &'static [&'static str],
}

impl SiteProfile {
    /// A profile with only a name and URL patterns.
    pub const fn empty(name: &'static str, url_patterns: &'static [&'static str]) -> Self {
        Self {
            name,
            url_patterns,
            title: &[],
            company: &[],
            description: &[],
            location: &[],
            salary: &[],
            job_type: &[],
            date_posted: &[],
            requirements: &[],
            benefits: &[],
        }
    }
}

pub struct SiteExtractor {
    profile: &'static SiteProfile,
    patterns: Vec<Regex>,
    hook: Option<SiteHook>,
}

impl SiteExtractor {
    pub fn new(profile: &'static SiteProfile) -> Self {
        let patterns = profile
            .url_patterns
            .iter()
            .filter_map(|p| match RegexBuilder::new(p).case_insensitive(true).build() {
                Ok(re) => Some(re),
                Err(e) => {
                    tracing::warn!(extractor = profile.name, pattern = *p, error = %e, "Invalid URL pattern");
                    None
                }
            })
            .collect();

        Self {
            profile,
            patterns,
            hook: None,
        }
    }

    pub fn with_hook(mut self, hook: SiteHook) -> Self {
        self.hook = Some(hook);
        self
    }

    fn from_selectors(&self, doc: &JobDocument) -> ScrapedRecord {
        let p = self.profile;
        ScrapedRecord {
            title: doc.first(p.title).unwrap_or_default(),
            company: doc.first(p.company).unwrap_or_default(),
            description: doc.first(p.description).unwrap_or_default(),
            location: doc.first(p.location),
            salary: doc.first(p.salary),
            job_type: doc.first(p.job_type),
            date_posted: doc.first(p.date_posted),
            requirements: doc.all(p.requirements),
            benefits: doc.all(p.benefits),
            ..Default::default()
        }
    }
}

impl Extractor for SiteExtractor {
    fn name(&self) -> &str {
        self.profile.name
    }

    fn can_handle(&self, url: &str) -> bool {
        parse_http_url(url).is_some() && self.patterns.iter().any(|re| re.is_match(url))
    }

    fn extract(&self, html: &str, url: &str) -> ScrapedRecord {
        let doc = JobDocument::parse(html);
        let mut record = self.from_selectors(&doc);

        if let Some(hook) = self.hook {
            hook(&doc, url, &mut record);
        }

        let missing = record.missing_required_fields();
        if !missing.is_empty() {
            tracing::debug!(
                extractor = self.profile.name,
                missing = ?missing,
                "Backfilling from generic extraction"
            );
            record.fill_missing_required_from(&generic::extract_from(&doc));
        }
        record
    }
}

/// The production registry, most specific strategies first.
pub fn default_registry() -> ExtractorRegistry {
    ExtractorRegistry::new(Arc::new(GenericExtractor))
        .with(Arc::new(linkedin::extractor()))
        .with(Arc::new(indeed::extractor()))
        .with(Arc::new(greenhouse::extractor()))
        .with(Arc::new(lever::extractor()))
        .with(Arc::new(workday::extractor()))
        .with(Arc::new(ziprecruiter::extractor()))
}

/// Title-case a URL slug: `acme-corp` → `Acme Corp`.
pub(crate) fn company_from_slug(slug: &str) -> String {
    slug.split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// The `index`-th non-empty path segment of `url`.
pub(crate) fn path_segment(url: &str, index: usize) -> Option<String> {
    parse_http_url(url)?
        .path_segments()?
        .filter(|s| !s.is_empty())
        .nth(index)
        .map(str::to_string)
}
