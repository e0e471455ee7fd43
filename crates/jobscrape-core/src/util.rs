use url::Url;

/// Collapse every run of whitespace (including newlines) into a single space and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to at most `max_chars` characters without splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Parse an absolute http(s) URL.
pub fn parse_http_url(raw: &str) -> Option<Url> {
    let url = Url::parse(raw.trim()).ok()?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Some(url),
        _ => None,
    }
}

/// Lowercased host of a URL, if it has one.
pub fn host_of(raw: &str) -> Option<String> {
    parse_http_url(raw).and_then(|u| u.host_str().map(str::to_ascii_lowercase))
}

/// True when `host` equals `domain` or is a subdomain of it.
pub fn host_matches_domain(host: &str, domain: &str) -> bool {
    let domain = domain.trim().trim_start_matches('.').to_ascii_lowercase();
    host == domain || host.ends_with(&format!(".{domain}"))
}

/// Cheap structural check used in extraction diagnostics.
pub fn looks_like_html(payload: &str) -> bool {
    let head = truncate_chars(payload.trim_start(), 2048).to_ascii_lowercase();
    head.starts_with("<!doctype html") || head.contains("<html") || head.contains("<body")
}
