use std::net::IpAddr;

use jobscrape_core::config::FetchConfig;
use jobscrape_core::error::AppError;
use jobscrape_core::models::{FetchedPage, ValidationHeaders};
use jobscrape_core::traits::Fetcher;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Response, redirect};
use url::Url;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";
const REFERER: &str = "https://www.google.com/";
const MAX_REDIRECTS: usize = 10;

/// HTTP fetcher using reqwest.
///
/// Sends browser-like headers and retries network failures and non-2xx
/// responses with linear backoff. By default, SSRF protection is **enabled**:
/// requests to private/reserved IP ranges are rejected as invalid URLs.
/// Redirects are followed by hand so every hop passes the same check.
/// Use [`allow_private_urls`](Self::allow_private_urls) to disable this
/// (e.g., for CLI usage where the user controls the machine).
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: Client,
    config: FetchConfig,
    ssrf_protection: bool,
}

impl ReqwestFetcher {
    pub fn new() -> Result<Self, AppError> {
        Self::with_config(FetchConfig::default())
    }

    pub fn with_config(config: FetchConfig) -> Result<Self, AppError> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT));
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static(ACCEPT_LANGUAGE),
        );
        headers.insert(header::REFERER, HeaderValue::from_static(REFERER));
        headers.insert(header::DNT, HeaderValue::from_static("1"));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .redirect(redirect::Policy::none())
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            ssrf_protection: true,
        })
    }

    /// Disable SSRF protection, allowing requests to private/reserved IPs.
    ///
    /// Only use this for CLI usage where the user controls the machine.
    pub fn allow_private_urls(mut self) -> Self {
        self.ssrf_protection = false;
        self
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// One GET, following up to [`MAX_REDIRECTS`] hops.
    async fn attempt(&self, url: &str) -> Result<FetchedPage, AttemptError> {
        let mut current = Url::parse(url)
            .map_err(|e| AttemptError::Fatal(AppError::InvalidUrl(format!("{url}: {e}"))))?;

        for _ in 0..=MAX_REDIRECTS {
            let response = self.send(&current).await?;
            let status = response.status();

            if status.is_redirection()
                && let Some(location) = response.headers().get(header::LOCATION)
            {
                let next = location
                    .to_str()
                    .ok()
                    .and_then(|loc| current.join(loc).ok())
                    .ok_or_else(|| {
                        AttemptError::Retryable(
                            format!("HTTP {} with unusable Location", status.as_u16()),
                            format!("status={} location={location:?}", status.as_u16()),
                        )
                    })?;
                if self.ssrf_protection {
                    validate_url(next.as_str()).await.map_err(AttemptError::Fatal)?;
                }
                tracing::debug!(
                    from = %current,
                    to = %next,
                    status = status.as_u16(),
                    "Following redirect"
                );
                current = next;
                continue;
            }

            if !status.is_success() {
                return Err(AttemptError::Retryable(
                    format!("HTTP {}", status.as_u16()),
                    format!("status={} final_url={current}", status.as_u16()),
                ));
            }

            let headers = validation_headers(&response);
            let html = response.text().await.map_err(|e| {
                AttemptError::Retryable("Failed to read response body".to_string(), e.to_string())
            })?;

            return Ok(FetchedPage {
                url: url.to_string(),
                final_url: current.to_string(),
                status: status.as_u16(),
                html,
                headers,
            });
        }

        Err(AttemptError::Retryable(
            format!("Too many redirects (limit {MAX_REDIRECTS})"),
            format!("last_url={current}"),
        ))
    }

    async fn send(&self, url: &Url) -> Result<Response, AttemptError> {
        self.client.get(url.clone()).send().await.map_err(|e| {
            let message = if e.is_timeout() {
                format!("Timed out after {}s", self.config.timeout.as_secs())
            } else if e.is_connect() {
                "Connection failed".to_string()
            } else {
                "Request failed".to_string()
            };
            AttemptError::Retryable(message, e.to_string())
        })
    }
}

/// Outcome of a failed attempt: retry it, or give up immediately.
enum AttemptError {
    /// `(message, technical_details)`
    Retryable(String, String),
    Fatal(AppError),
}

impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, AppError> {
        if self.ssrf_protection {
            validate_url(url).await?;
        }

        let attempts = self.config.retries.max(1);
        let mut last_failure = (String::new(), String::new());

        for attempt in 1..=attempts {
            if attempt > 1 {
                let delay = self.config.retry_delay * (attempt - 1);
                tracing::warn!(
                    %url,
                    attempt,
                    delay_ms = %delay.as_millis(),
                    error = %last_failure.0,
                    "Fetch failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }

            match self.attempt(url).await {
                Ok(page) => return Ok(page),
                Err(AttemptError::Fatal(e)) => return Err(e),
                Err(AttemptError::Retryable(message, details)) => {
                    last_failure = (message, details)
                }
            }
        }

        let (message, technical_details) = last_failure;
        Err(AppError::FetchFailed {
            url: url.to_string(),
            message,
            technical_details,
            attempts,
        })
    }
}

fn validation_headers(response: &Response) -> ValidationHeaders {
    let get = |name: header::HeaderName| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    ValidationHeaders {
        etag: get(header::ETAG),
        last_modified: get(header::LAST_MODIFIED),
    }
}

// ---------------------------------------------------------------------------
// SSRF protection
// ---------------------------------------------------------------------------

/// Validate a URL to prevent server-side request forgery (SSRF).
///
/// 1. Only allow `http` and `https` schemes.
/// 2. Resolve the hostname via DNS.
/// 3. Reject if any resolved IP is private/reserved.
async fn validate_url(url: &str) -> Result<(), AppError> {
    let parsed = Url::parse(url).map_err(|e| AppError::InvalidUrl(format!("{url}: {e}")))?;

    // 1. Scheme check
    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(AppError::InvalidUrl(format!(
                "URL scheme '{scheme}' is not allowed (only http/https)"
            )));
        }
    }

    // 2. Extract host
    let host = parsed
        .host_str()
        .ok_or_else(|| AppError::InvalidUrl(format!("{url} has no host")))?;
    let host = host.trim_start_matches('[').trim_end_matches(']');

    // 3. If the host is already an IP literal, check it directly
    if let Ok(ip) = host.parse::<IpAddr>() {
        if is_private_ip(ip) {
            return Err(AppError::InvalidUrl(format!(
                "SSRF blocked: {host} resolves to private/reserved IP"
            )));
        }
        return Ok(());
    }

    // 4. DNS resolve and check all addresses
    let port = parsed.port_or_known_default().unwrap_or(80);
    let addrs: Vec<_> = tokio::net::lookup_host((host, port))
        .await
        .map_err(|e| AppError::FetchFailed {
            url: url.to_string(),
            message: format!("DNS resolution failed for {host}"),
            technical_details: e.to_string(),
            attempts: 1,
        })?
        .collect();

    if addrs.is_empty() {
        return Err(AppError::FetchFailed {
            url: url.to_string(),
            message: format!("DNS resolution returned no addresses for {host}"),
            technical_details: format!("host={host} port={port}"),
            attempts: 1,
        });
    }

    if let Some(addr) = addrs.iter().find(|a| is_private_ip(a.ip())) {
        return Err(AppError::InvalidUrl(format!(
            "SSRF blocked: {host} resolves to private/reserved IP {}",
            addr.ip()
        )));
    }

    Ok(())
}

/// Check if an IP address is in a private/reserved/link-local range.
fn is_private_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()           // 127.0.0.0/8
                || v4.is_private()     // 10/8, 172.16/12, 192.168/16
                || v4.is_link_local()  // 169.254.0.0/16 (cloud metadata!)
                || v4.is_unspecified() // 0.0.0.0
                || v4.is_broadcast()   // 255.255.255.255
                || v4.is_documentation()
                || v4.octets()[0] == 100 && (v4.octets()[1] & 0xC0) == 64 // 100.64.0.0/10 (CGN)
        }
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || v6.is_unspecified()
                || (v6.segments()[0] & 0xFFC0) == 0xFE80 // fe80::/10
                || (v6.segments()[0] & 0xFE00) == 0xFC00 // fc00::/7
                || v6
                    .to_ipv4_mapped()
                    .is_some_and(|v4| is_private_ip(IpAddr::V4(v4)))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use jobscrape_core::error::ErrorCode;
    use wiremock::matchers::{header, header_exists, headers, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn fast_config(retries: u32) -> FetchConfig {
        FetchConfig {
            retries,
            retry_delay: Duration::from_millis(10),
            timeout: Duration::from_secs(5),
        }
    }

    fn local_fetcher(retries: u32) -> ReqwestFetcher {
        ReqwestFetcher::with_config(fast_config(retries))
            .unwrap()
            .allow_private_urls()
    }

    #[test]
    fn test_private_ipv4() {
        assert!(is_private_ip("127.0.0.1".parse().unwrap()));
        assert!(is_private_ip("10.0.0.1".parse().unwrap()));
        assert!(is_private_ip("172.16.0.1".parse().unwrap()));
        assert!(is_private_ip("192.168.1.1".parse().unwrap()));
        assert!(is_private_ip("169.254.169.254".parse().unwrap()));
        assert!(is_private_ip("100.64.0.1".parse().unwrap()));
        assert!(!is_private_ip("8.8.8.8".parse().unwrap()));
    }

    #[test]
    fn test_private_ipv6() {
        assert!(is_private_ip("::1".parse().unwrap()));
        assert!(is_private_ip("fe80::1".parse().unwrap()));
        assert!(is_private_ip("fc00::1".parse().unwrap()));
        assert!(is_private_ip("::ffff:169.254.169.254".parse().unwrap()));
        assert!(!is_private_ip("2001:4860:4860::8888".parse().unwrap()));
    }

    #[tokio::test]
    async fn test_ssrf_rejection_is_invalid_url_and_not_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let fetcher = ReqwestFetcher::with_config(fast_config(3)).unwrap();
        let err = fetcher
            .fetch(&format!("{}/job", server.uri()))
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::InvalidUrl);
        assert!(err.to_string().contains("SSRF blocked"));
    }

    #[tokio::test]
    async fn test_rejects_bad_scheme() {
        let err = validate_url("file:///etc/passwd").await.unwrap_err();
        assert!(err.to_string().contains("not allowed"));
    }

    #[tokio::test]
    async fn test_sends_browser_headers_and_captures_validators() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jobs/1"))
            .and(header("referer", REFERER))
            .and(header("dnt", "1"))
            .and(headers("accept-language", vec!["en-US", "en;q=0.9"]))
            .and(header_exists("user-agent"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html><body>ok</body></html>")
                    .insert_header("etag", "\"v1\"")
                    .insert_header("last-modified", "Wed, 21 Oct 2025 07:28:00 GMT"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/jobs/1", server.uri());
        let page = local_fetcher(3).fetch(&url).await.unwrap();

        assert_eq!(page.status, 200);
        assert_eq!(page.html, "<html><body>ok</body></html>");
        assert_eq!(page.headers.etag.as_deref(), Some("\"v1\""));
        assert_eq!(
            page.headers.last_modified.as_deref(),
            Some("Wed, 21 Oct 2025 07:28:00 GMT")
        );
    }

    #[tokio::test]
    async fn test_follows_redirects_and_reports_final_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jobs/old"))
            .respond_with(ResponseTemplate::new(301).insert_header("location", "/jobs/new"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/jobs/new"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>moved</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/jobs/old", server.uri());
        let page = local_fetcher(1).fetch(&url).await.unwrap();

        assert_eq!(page.url, url);
        assert_eq!(page.final_url, format!("{}/jobs/new", server.uri()));
        assert_eq!(page.html, "<html>moved</html>");
    }

    #[tokio::test]
    async fn test_redirect_to_private_address_is_blocked() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jobs/1"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("location", "http://169.254.169.254/latest/meta-data/"),
            )
            .expect(1)
            .mount(&server)
            .await;

        // The entry URL is local, so skip its own check and guard only the hops.
        let fetcher = ReqwestFetcher {
            ssrf_protection: true,
            ..local_fetcher(3)
        };
        let err = match fetcher.attempt(&format!("{}/jobs/1", server.uri())).await {
            Err(AttemptError::Fatal(e)) => e,
            Err(AttemptError::Retryable(message, _)) => {
                panic!("expected a fatal error, got {message}")
            }
            Ok(_) => panic!("redirect to a private address was followed"),
        };

        assert_eq!(err.code(), ErrorCode::InvalidUrl);
        assert!(err.to_string().contains("169.254.169.254"));
    }

    #[tokio::test]
    async fn test_redirect_loop_is_cut_off() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/loop"))
            .respond_with(ResponseTemplate::new(302).insert_header("location", "/loop"))
            .mount(&server)
            .await;

        let err = local_fetcher(1)
            .fetch(&format!("{}/loop", server.uri()))
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::FetchFailed);
        assert!(err.to_string().contains("Too many redirects"));
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let page = local_fetcher(3)
            .fetch(&format!("{}/job", server.uri()))
            .await
            .unwrap();
        assert_eq!(page.html, "<html>ok</html>");
    }

    #[tokio::test]
    async fn test_exhausted_retries_fail_with_details() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let err = local_fetcher(3)
            .fetch(&format!("{}/job", server.uri()))
            .await
            .unwrap_err();

        match &err {
            AppError::FetchFailed {
                message, attempts, ..
            } => {
                assert_eq!(message, "HTTP 500");
                assert_eq!(*attempts, 3);
            }
            other => panic!("expected FetchFailed, got {other:?}"),
        }
        assert!(err.technical_details().unwrap().contains("status=500"));
        assert!(!err.suggestion().is_empty());
    }

    #[tokio::test]
    async fn test_backoff_is_linear() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let fetcher = ReqwestFetcher::with_config(FetchConfig {
            retries: 3,
            retry_delay: Duration::from_millis(50),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
        .allow_private_urls();

        let start = std::time::Instant::now();
        let _ = fetcher.fetch(&format!("{}/job", server.uri())).await;
        // 50ms before attempt 2, 100ms before attempt 3
        assert!(start.elapsed() >= Duration::from_millis(150));
    }
}
