use super::{SiteExtractor, SiteProfile};

pub static PROFILE: SiteProfile = SiteProfile {
    title: &["h1.job_title", r#"h1[class*="job_title"]"#, ".job_header h1"],
    company: &[
        "a.hiring_company_text",
        ".hiring_company_text",
        r#"[data-testid="job-details-company"]"#,
    ],
    description: &[".job_description", ".jobDescriptionSection", r#"[data-testid="job-description"]"#],
    location: &[".location_text", r#"[data-testid="job-details-location"]"#, ".hiring_location"],
    salary: &[".job_salary", r#"[data-testid="job-details-salary"]"#],
    job_type: &[".job_characteristics_data .employment_type", r#"[data-testid="job-details-type"]"#],
    benefits: &[".benefits_list li"],
    ..SiteProfile::empty(
        "ziprecruiter",
        &[r"ziprecruiter\.[a-z.]+/(c|jobs|job|k)/"],
    )
};

pub fn extractor() -> SiteExtractor {
    SiteExtractor::new(&PROFILE)
}
