use jobscrape_core::models::ScrapedRecord;

use super::{SiteExtractor, SiteProfile};
use crate::document::{JobDocument, element_text};

pub static PROFILE: SiteProfile = SiteProfile {
    title: &[
        "h1.top-card-layout__title",
        "h1.topcard__title",
        ".job-details-jobs-unified-top-card__job-title h1",
        ".jobs-unified-top-card__job-title",
    ],
    company: &[
        "a.topcard__org-name-link",
        ".topcard__org-name-link",
        ".job-details-jobs-unified-top-card__company-name a",
        ".jobs-unified-top-card__company-name",
    ],
    description: &[
        ".show-more-less-html__markup",
        ".description__text",
        "#job-details",
        ".jobs-description__content",
    ],
    location: &[
        ".topcard__flavor--bullet",
        ".job-details-jobs-unified-top-card__bullet",
        ".jobs-unified-top-card__bullet",
    ],
    salary: &[".salary.compensation__salary", ".compensation__salary"],
    date_posted: &["span.posted-time-ago__text", ".posted-time-ago__text"],
    ..SiteProfile::empty(
        "linkedin",
        &[r"linkedin\.com/jobs/", r"linkedin\.com/comm/jobs/"],
    )
};

pub fn extractor() -> SiteExtractor {
    SiteExtractor::new(&PROFILE).with_hook(job_criteria)
}

/// Reads the "Seniority level / Employment type / Industries" criteria list.
fn job_criteria(doc: &JobDocument, _url: &str, record: &mut ScrapedRecord) {
    for item in doc.select("li.description__job-criteria-item") {
        let mut label = String::new();
        let mut value = String::new();
        for child in item.child_elements() {
            match child.value().name() {
                "h3" => label = element_text(child),
                "span" => value = element_text(child),
                _ => {}
            }
        }
        if value.is_empty() {
            continue;
        }

        match label.to_ascii_lowercase().as_str() {
            "employment type" if record.job_type.is_none() => record.job_type = Some(value),
            "industries" if record.industry.is_none() => record.industry = Some(value),
            "seniority level" | "job function" => record.keywords.push(value),
            _ => {}
        }
    }
}
