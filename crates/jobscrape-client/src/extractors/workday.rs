use jobscrape_core::models::ScrapedRecord;
use jobscrape_core::util::host_of;

use super::{SiteExtractor, SiteProfile, company_from_slug};
use crate::document::JobDocument;

pub static PROFILE: SiteProfile = SiteProfile {
    title: &[r#"[data-automation-id="jobPostingHeader"]"#, "h2.css-1j9bnzb"],
    company: &[r#"meta[property="og:site_name"]@content"#],
    description: &[r#"[data-automation-id="jobPostingDescription"]"#],
    location: &[r#"[data-automation-id="locations"] dd"#],
    job_type: &[r#"[data-automation-id="time"] dd"#],
    date_posted: &[r#"[data-automation-id="postedOn"] dd"#],
    ..SiteProfile::empty(
        "workday",
        &[
            r"\.myworkdayjobs\.com/",
            r"\.myworkdaysite\.com/",
            r"\.workday\.com/.+/job/",
        ],
    )
};

pub fn extractor() -> SiteExtractor {
    SiteExtractor::new(&PROFILE).with_hook(tenant_company)
}

/// Tenants live at `{tenant}.wd5.myworkdayjobs.com`.
fn tenant_company(_doc: &JobDocument, url: &str, record: &mut ScrapedRecord) {
    if !record.company.is_empty() || !url.to_ascii_lowercase().contains("myworkdayjobs.com") {
        return;
    }
    if let Some(tenant) = host_of(url).and_then(|h| h.split('.').next().map(str::to_string)) {
        record.company = company_from_slug(&tenant);
    }
}
