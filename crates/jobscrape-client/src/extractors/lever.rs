use jobscrape_core::models::ScrapedRecord;

use super::{SiteExtractor, SiteProfile, company_from_slug, path_segment};
use crate::document::JobDocument;

pub static PROFILE: SiteProfile = SiteProfile {
    title: &[".posting-headline h2", ".posting-header h2"],
    company: &[".main-header-logo img@alt", r#"meta[property="og:site_name"]@content"#],
    description: &[r#"[data-qa="job-description"]"#, ".posting-page .section-wrapper"],
    location: &[".posting-categories .location", ".posting-category.location"],
    job_type: &[".posting-categories .commitment", ".posting-category.commitment"],
    salary: &[r#"[data-qa="salary-range"]"#, ".posting-salary"],
    requirements: &[".posting-requirements li", r#"[data-qa="job-requirements"] li"#],
    ..SiteProfile::empty("lever", &[r"jobs(\.eu)?\.lever\.co/[^/]+/[0-9a-f-]{8,}"])
};

pub fn extractor() -> SiteExtractor {
    SiteExtractor::new(&PROFILE).with_hook(company_cleanup)
}

/// Logo alt text reads "Acme logo"; the board slug is the fallback.
fn company_cleanup(_doc: &JobDocument, url: &str, record: &mut ScrapedRecord) {
    if let Some(name) = record.company.strip_suffix(" logo") {
        record.company = name.trim().to_string();
    }
    if record.company.is_empty() {
        if let Some(slug) = path_segment(url, 0) {
            record.company = company_from_slug(&slug);
        }
    }
}
