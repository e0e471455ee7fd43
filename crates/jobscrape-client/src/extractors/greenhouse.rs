use jobscrape_core::models::ScrapedRecord;

use super::{SiteExtractor, SiteProfile, company_from_slug, path_segment};
use crate::document::JobDocument;

pub static PROFILE: SiteProfile = SiteProfile {
    title: &["h1.app-title", ".job__title h1", "h1.section-header", ".job-title"],
    company: &[".company-name", r#"meta[property="og:site_name"]@content"#],
    description: &["#content", ".job__description", "#app_body .content"],
    location: &[".location", ".job__location"],
    requirements: &[".job__description ul li"],
    ..SiteProfile::empty(
        "greenhouse",
        &[
            r"(boards|job-boards)(\.eu)?\.greenhouse\.io/",
            r"greenhouse\.io/embed/job_app",
            r"[?&]gh_jid=\d+",
        ],
    )
};

pub fn extractor() -> SiteExtractor {
    SiteExtractor::new(&PROFILE).with_hook(company_cleanup)
}

/// Greenhouse renders "at Acme" and keys boards by the company slug.
fn company_cleanup(_doc: &JobDocument, url: &str, record: &mut ScrapedRecord) {
    if let Some(rest) = record.company.strip_prefix("at ") {
        record.company = rest.trim().to_string();
    }
    if record.company.is_empty() && url.contains("greenhouse.io/") && !url.contains("/embed/") {
        if let Some(slug) = path_segment(url, 0) {
            record.company = company_from_slug(&slug);
        }
    }
}
