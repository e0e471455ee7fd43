//! Parsed job page with selector helpers.
//!
//! A page is parsed exactly once. JSON-LD blocks are captured first, then
//! non-content nodes (`script`, `style`, `noscript`, `template`, hidden
//! elements) are detached so selector text never picks up code or
//! invisible markup.

use jobscrape_core::util::{collapse_whitespace, truncate_chars};
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

const JSON_LD: &str = r#"script[type="application/ld+json"]"#;
const NON_CONTENT: &str = r#"script, style, noscript, template, [hidden], [aria-hidden="true"]"#;

pub struct JobDocument {
    html: Html,
    json_ld: Vec<Value>,
}

impl JobDocument {
    pub fn parse(raw: &str) -> Self {
        let mut html = Html::parse_document(raw);
        let json_ld = capture_json_ld(&html);

        let ids: Vec<_> = match Selector::parse(NON_CONTENT) {
            Ok(sel) => html.select(&sel).map(|el| el.id()).collect(),
            Err(_) => Vec::new(),
        };
        for id in ids {
            if let Some(mut node) = html.tree.get_mut(id) {
                node.detach();
            }
        }

        Self { html, json_ld }
    }

    /// Every JSON-LD object on the page, in document order.
    pub fn json_ld(&self) -> &[Value] {
        &self.json_ld
    }

    /// The first JSON-LD node typed `JobPosting`, searching arrays and `@graph`.
    pub fn job_posting(&self) -> Option<&Value> {
        self.json_ld.iter().find_map(find_job_posting)
    }

    /// First non-empty value among `selectors`, tried in order.
    ///
    /// A selector may end in `@attr` to read an attribute instead of text,
    /// e.g. `meta[property="og:title"]@content`.
    pub fn first(&self, selectors: &[&str]) -> Option<String> {
        selectors.iter().find_map(|selector| {
            let (css, attr) = split_attr(selector);
            let sel = parse_selector(css)?;
            self.html
                .select(&sel)
                .filter_map(|el| value_of(el, attr))
                .next()
        })
    }

    /// All non-empty values of the first selector that yields any.
    pub fn all(&self, selectors: &[&str]) -> Vec<String> {
        selectors
            .iter()
            .map(|selector| {
                let (css, attr) = split_attr(selector);
                parse_selector(css)
                    .map(|sel| {
                        self.html
                            .select(&sel)
                            .filter_map(|el| value_of(el, attr))
                            .collect::<Vec<_>>()
                    })
                    .unwrap_or_default()
            })
            .find(|values| !values.is_empty())
            .unwrap_or_default()
    }

    /// Elements matching `css`, for site hooks that walk structured blocks.
    pub fn select<'a>(&'a self, css: &str) -> Vec<ElementRef<'a>> {
        match parse_selector(css) {
            Some(sel) => self.html.select(&sel).collect(),
            None => Vec::new(),
        }
    }

    /// Visible body text, whitespace-collapsed and capped at `max_chars`.
    pub fn body_text(&self, max_chars: usize) -> String {
        let text = match parse_selector("body") {
            Some(sel) => self
                .html
                .select(&sel)
                .next()
                .map(element_text)
                .unwrap_or_default(),
            None => String::new(),
        };
        truncate_chars(&text, max_chars).to_string()
    }
}

/// Text content of an element with whitespace collapsed.
pub fn element_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

/// Plain text of an HTML fragment, as found in JSON-LD descriptions.
///
/// Entity-escaped markup (`&lt;p&gt;`) is unwrapped one extra level.
pub fn html_to_text(fragment: &str) -> String {
    let text = fragment_text(fragment);
    if text.contains('<') && text.contains('>') {
        fragment_text(&text)
    } else {
        text
    }
}

/// Text of each `<li>` in an HTML fragment, or the whole fragment when it has none.
pub fn fragment_items(fragment: &str) -> Vec<String> {
    let doc = Html::parse_fragment(fragment);
    let items: Vec<String> = match parse_selector("li") {
        Some(sel) => doc.select(&sel).map(element_text).collect(),
        None => Vec::new(),
    };
    let items: Vec<String> = items.into_iter().filter(|i| !i.is_empty()).collect();
    if items.is_empty() {
        let text = html_to_text(fragment);
        if text.is_empty() { Vec::new() } else { vec![text] }
    } else {
        items
    }
}

fn fragment_text(fragment: &str) -> String {
    let doc = Html::parse_fragment(fragment);
    collapse_whitespace(&doc.root_element().text().collect::<Vec<_>>().join(" "))
}

fn capture_json_ld(html: &Html) -> Vec<Value> {
    let Some(sel) = parse_selector(JSON_LD) else {
        return Vec::new();
    };
    html.select(&sel)
        .filter_map(|el| {
            let raw = el.text().collect::<String>();
            match serde_json::from_str::<Value>(raw.trim()) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping malformed JSON-LD block");
                    None
                }
            }
        })
        .collect()
}

fn find_job_posting(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.iter().find_map(find_job_posting),
        Value::Object(map) => {
            if is_job_posting(value) {
                return Some(value);
            }
            map.get("@graph").and_then(find_job_posting)
        }
        _ => None,
    }
}

fn is_job_posting(value: &Value) -> bool {
    match value.get("@type") {
        Some(Value::String(t)) => t == "JobPosting",
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some("JobPosting")),
        _ => false,
    }
}

fn split_attr(selector: &str) -> (&str, Option<&str>) {
    match selector.rsplit_once('@') {
        Some((css, attr))
            if !attr.is_empty()
                && attr
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') =>
        {
            (css, Some(attr))
        }
        _ => (selector, None),
    }
}

fn parse_selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(sel) => Some(sel),
        Err(e) => {
            tracing::debug!(selector = css, error = %e, "Invalid selector");
            None
        }
    }
}

fn value_of(el: ElementRef<'_>, attr: Option<&str>) -> Option<String> {
    let value = match attr {
        Some(name) => collapse_whitespace(el.value().attr(name)?),
        None => element_text(el),
    };
    (!value.is_empty()).then_some(value)
}
