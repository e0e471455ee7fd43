use jobscrape_core::models::ScrapedRecord;

use super::{SiteExtractor, SiteProfile};
use crate::document::{JobDocument, element_text};

pub static PROFILE: SiteProfile = SiteProfile {
    title: &[
        r#"[data-testid="jobsearch-JobInfoHeader-title"]"#,
        "h1.jobsearch-JobInfoHeader-title",
        ".jobsearch-JobInfoHeader-title-container h1",
    ],
    company: &[
        r#"[data-testid="inlineHeader-companyName"] a"#,
        r#"[data-testid="inlineHeader-companyName"]"#,
        r#"[data-company-name="true"]"#,
        ".jobsearch-InlineCompanyRating div:first-child",
    ],
    description: &["#jobDescriptionText", ".jobsearch-jobDescriptionText"],
    location: &[
        r#"[data-testid="inlineHeader-companyLocation"]"#,
        r#"[data-testid="job-location"]"#,
        ".jobsearch-JobInfoHeader-subtitle > div:last-child",
    ],
    salary: &[
        "#salaryInfoAndJobType .css-19j1a75",
        r#"[data-testid="jobsearch-OtherJobDetailsContainer"] [aria-label="Pay"]"#,
    ],
    benefits: &["#benefits li", r#"[data-testid="benefits-test"] li"#],
    ..SiteProfile::empty(
        "indeed",
        &[
            r"indeed\.[a-z.]+/(m/)?viewjob",
            r"indeed\.[a-z.]+/rc/clk",
            r"indeed\.[a-z.]+/.*[?&]vjk=",
            r"indeed\.[a-z.]+/.*[?&]jk=",
        ],
    )
};

pub fn extractor() -> SiteExtractor {
    SiteExtractor::new(&PROFILE).with_hook(salary_and_type)
}

/// The "Pay" and "Job type" blocks share one container with a heading each.
fn salary_and_type(doc: &JobDocument, _url: &str, record: &mut ScrapedRecord) {
    for block in doc.select(r#"#jobDetailsSection [role="group"]"#) {
        let label = block
            .value()
            .attr("aria-label")
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let values: Vec<String> = block
            .child_elements()
            .skip(1)
            .map(element_text)
            .filter(|v| !v.is_empty())
            .collect();
        if values.is_empty() {
            continue;
        }

        match label.as_str() {
            "pay" if record.salary.is_none() => record.salary = Some(values.join(", ")),
            "job type" if record.job_type.is_none() => record.job_type = Some(values.join(", ")),
            _ => {}
        }
    }
}
