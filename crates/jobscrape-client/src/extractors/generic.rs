//! Catch-all extractor: JSON-LD `JobPosting` first, then common selectors,
//! then the visible page text.

use jobscrape_core::models::ScrapedRecord;
use jobscrape_core::traits::Extractor;
use jobscrape_core::util::parse_http_url;
use serde_json::Value;

use crate::document::{JobDocument, fragment_items, html_to_text};

/// Characters of body text used when nothing better describes the job.
pub const BODY_TEXT_LIMIT: usize = 5000;

const TITLE: &[&str] = &[
    r#"[itemprop="title"]"#,
    "h1",
    r#"meta[property="og:title"]@content"#,
    r#"meta[name="twitter:title"]@content"#,
    "title",
];

const COMPANY: &[&str] = &[
    r#"[itemprop="hiringOrganization"] [itemprop="name"]"#,
    r#"[itemprop="hiringOrganization"]"#,
    "[data-company]@data-company",
    ".company-name",
    ".company",
    r#"meta[property="og:site_name"]@content"#,
    r#"meta[name="author"]@content"#,
];

const DESCRIPTION: &[&str] = &[
    r#"[itemprop="description"]"#,
    "#job-description",
    ".job-description",
    ".jobDescription",
    ".description",
    "article",
    "main",
];

const LOCATION: &[&str] = &[
    r#"[itemprop="jobLocation"]"#,
    ".job-location",
    ".location",
];

const KEYWORDS: &[&str] = &[r#"meta[name="keywords"]@content"#];

pub struct GenericExtractor;

impl GenericExtractor {
    pub const NAME: &'static str = "generic";
}

impl Extractor for GenericExtractor {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn can_handle(&self, url: &str) -> bool {
        parse_http_url(url).is_some()
    }

    fn is_fallback(&self) -> bool {
        true
    }

    fn extract(&self, html: &str, _url: &str) -> ScrapedRecord {
        extract_from(&JobDocument::parse(html))
    }
}

/// Run the generic logic on an already parsed page.
///
/// Site extractors call this to backfill the required fields they missed.
pub fn extract_from(doc: &JobDocument) -> ScrapedRecord {
    let mut record = doc.job_posting().map(from_job_posting).unwrap_or_default();

    if record.title.is_empty() {
        record.title = doc.first(TITLE).unwrap_or_default();
    }
    if record.company.is_empty() {
        record.company = doc.first(COMPANY).unwrap_or_default();
    }
    if record.description.is_empty() {
        record.description = doc
            .first(DESCRIPTION)
            .unwrap_or_else(|| doc.body_text(BODY_TEXT_LIMIT));
    }
    if record.location.is_none() {
        record.location = doc.first(LOCATION);
    }
    if record.keywords.is_empty() {
        record.keywords = doc
            .first(KEYWORDS)
            .map(|k| split_list(&k))
            .unwrap_or_default();
    }

    record
}

/// Map a schema.org `JobPosting` onto a record.
pub fn from_job_posting(posting: &Value) -> ScrapedRecord {
    let mut record = ScrapedRecord {
        title: string_field(posting, "title")
            .or_else(|| string_field(posting, "name"))
            .unwrap_or_default(),
        company: organization_name(posting.get("hiringOrganization")).unwrap_or_default(),
        description: posting
            .get("description")
            .and_then(Value::as_str)
            .map(html_to_text)
            .unwrap_or_default(),
        location: job_location(posting),
        salary: posting.get("baseSalary").and_then(format_salary),
        job_type: posting.get("employmentType").and_then(format_employment_type),
        date_posted: string_field(posting, "datePosted"),
        industry: posting.get("industry").and_then(joined_text),
        skills: posting.get("skills").map(list_field).unwrap_or_default(),
        requirements: ["qualifications", "experienceRequirements", "educationRequirements"]
            .iter()
            .filter_map(|key| posting.get(*key))
            .flat_map(list_field)
            .collect(),
        benefits: posting.get("jobBenefits").map(list_field).unwrap_or_default(),
        keywords: posting.get("keywords").map(list_field).unwrap_or_default(),
        ..Default::default()
    };
    record
        .raw_metadata
        .insert("jsonLd".to_string(), posting.clone());
    record
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(html_to_text)
        .filter(|s| !s.is_empty())
}

fn organization_name(org: Option<&Value>) -> Option<String> {
    match org? {
        Value::String(name) => Some(name.trim().to_string()).filter(|n| !n.is_empty()),
        Value::Array(orgs) => orgs.iter().find_map(|o| organization_name(Some(o))),
        obj @ Value::Object(_) => string_field(obj, "name"),
        _ => None,
    }
}

fn job_location(posting: &Value) -> Option<String> {
    let places: Vec<&Value> = match posting.get("jobLocation") {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(item) => vec![item],
        None => Vec::new(),
    };

    let formatted: Vec<String> = places.into_iter().filter_map(format_place).collect();
    if !formatted.is_empty() {
        return Some(formatted.join("; "));
    }

    let remote = posting
        .get("jobLocationType")
        .and_then(Value::as_str)
        .is_some_and(|t| t.eq_ignore_ascii_case("TELECOMMUTE"));
    remote.then(|| "Remote".to_string())
}

fn format_place(place: &Value) -> Option<String> {
    if let Some(s) = place.as_str() {
        return Some(s.trim().to_string()).filter(|s| !s.is_empty());
    }
    let address = place.get("address").unwrap_or(place);
    if let Some(s) = address.as_str() {
        return Some(s.trim().to_string()).filter(|s| !s.is_empty());
    }

    let parts: Vec<String> = ["addressLocality", "addressRegion", "addressCountry"]
        .iter()
        .filter_map(|key| match address.get(*key)? {
            Value::String(s) => Some(s.trim().to_string()),
            country @ Value::Object(_) => string_field(country, "name"),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .collect();

    if parts.is_empty() {
        string_field(place, "name")
    } else {
        Some(parts.join(", "))
    }
}

fn format_salary(salary: &Value) -> Option<String> {
    if let Some(s) = salary.as_str() {
        return Some(s.trim().to_string()).filter(|s| !s.is_empty());
    }
    let currency = salary
        .get("currency")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let amount = salary.get("value").unwrap_or(salary);
    let unit = amount
        .get("unitText")
        .or_else(|| salary.get("unitText"))
        .and_then(Value::as_str);

    let range = match amount {
        Value::Number(_) | Value::String(_) => format_amount(amount)?,
        _ => {
            let min = amount.get("minValue").and_then(format_amount);
            let max = amount.get("maxValue").and_then(format_amount);
            let exact = amount.get("value").and_then(format_amount);
            match (min, max, exact) {
                (Some(min), Some(max), _) if min != max => format!("{min} - {max}"),
                (Some(v), _, _) | (None, Some(v), _) | (None, None, Some(v)) => v,
                _ => return None,
            }
        }
    };

    let mut out = if currency.is_empty() {
        range
    } else {
        format!("{currency} {range}")
    };
    if let Some(unit) = unit {
        out.push_str(&format!(" per {}", unit.to_ascii_lowercase()));
    }
    Some(out)
}

fn format_amount(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 => Some(format!("{}", f as i64)),
            Some(f) => Some(format!("{f:.2}")),
            None => None,
        },
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn format_employment_type(value: &Value) -> Option<String> {
    let types: Vec<String> = list_field(value)
        .into_iter()
        .map(|t| humanize_enum(&t))
        .collect();
    (!types.is_empty()).then(|| types.join(", "))
}

/// `FULL_TIME` → `Full-time`.
fn humanize_enum(raw: &str) -> String {
    let lower = raw.trim().replace('_', "-").to_ascii_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

fn joined_text(value: &Value) -> Option<String> {
    let items = list_field(value);
    (!items.is_empty()).then(|| items.join(", "))
}

/// Strings, arrays of strings, or HTML lists, flattened to items.
fn list_field(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) if s.contains('<') => fragment_items(s),
        Value::String(s) => split_list(s),
        Value::Array(items) => items.iter().flat_map(list_field).collect(),
        obj @ Value::Object(_) => string_field(obj, "name")
            .or_else(|| string_field(obj, "description"))
            .into_iter()
            .collect(),
        _ => Vec::new(),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    let separator = if raw.contains('\n') { '\n' } else { ',' };
    raw.split(separator)
        .map(|s| s.trim().trim_start_matches(['-', '*', '•']).trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
