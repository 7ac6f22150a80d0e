//! HTTP access for the analysis pipeline.
//!
//! ### Client seam
//! - `HttpClient` is the only way the pipeline touches the network.
//! - `FetchClient` is the reqwest-backed implementation.
//! - `StaticHttpClient` serves canned responses from memory for tests and offline runs.
//!
//! ### Limits
//! - Request timeout (default: 20s)
//! - Max redirects: 5
//! - Max body bytes: 5MB (configurable)
//!
//! ### Probing
//! - `HEAD` first; servers answering 405/501 are retried with a one-byte ranged `GET`.

pub mod memory;
pub mod url;

use async_trait::async_trait;
use reqwest::Url;
use reqwest::{Client, StatusCode, header};
use std::time::{Duration, Instant};

pub use memory::StaticHttpClient;
pub use self::url::{UrlError, canonicalize, host_of, is_web_scheme, resolve, site_url, with_default_scheme};

use vidscout_core::{AppConfig, Error};

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "vidscout/<version>")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            max_redirects: config.max_redirects,
        }
    }
}

/// A fetched HTML page.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// The original URL requested
    pub url: Url,
    /// The final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status: StatusCode,
    /// Content-Type header
    pub content_type: Option<String>,
    /// Decoded response body
    pub body: String,
    /// Time taken to fetch in milliseconds
    pub fetch_ms: u64,
}

/// Outcome of an accessibility probe. Non-2xx statuses are reported here, not as errors.
#[derive(Debug, Clone)]
pub struct ProbeResponse {
    /// The URL probed
    pub url: Url,
    /// The final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status: StatusCode,
    /// Content-Type header
    pub content_type: Option<String>,
    /// Total resource size, from Content-Length or Content-Range
    pub content_length: Option<u64>,
}

impl ProbeResponse {
    pub fn is_accessible(&self) -> bool {
        self.status.is_success()
    }
}

/// Network access used by the pipeline.
///
/// Implementations must bound every request with a timeout and report
/// transport failures as `Error::HttpError` / `Error::FetchTimeout`.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Fetch an HTML page. Non-2xx responses are errors.
    async fn fetch_html(&self, url: &Url) -> Result<FetchResponse, Error>;

    /// Probe a URL without downloading its body.
    async fn probe(&self, url: &Url) -> Result<ProbeResponse, Error>;

    /// Whether `url` answers with a 2xx status.
    async fn check_accessibility(&self, url: &Url) -> bool {
        match self.probe(url).await {
            Ok(response) => response.is_accessible(),
            Err(e) => {
                tracing::debug!("accessibility check failed for {}: {}", url, e);
                false
            }
        }
    }
}

/// reqwest-backed HTTP client.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::HttpError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn transport_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::FetchTimeout(format!("no response within {}ms", self.config.timeout.as_millis()))
        } else {
            Error::HttpError(format!("network error: {}", e))
        }
    }
}

#[async_trait]
impl HttpClient for FetchClient {
    async fn fetch_html(&self, url: &Url) -> Result<FetchResponse, Error> {
        let start = Instant::now();

        let response = self
            .http
            .get(url.as_str())
            .header(header::ACCEPT, "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();

        if !status.is_success() {
            return Err(Error::HttpError(format!("status {} for {}", status.as_u16(), url)));
        }

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }

        let final_url = response.url().clone();
        let content_type = header_string(response.headers(), header::CONTENT_TYPE);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", bytes.len(), self.config.max_bytes)));
        }

        let body = String::from_utf8_lossy(&bytes).into_owned();
        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!("fetched {} -> {} in {}ms ({} bytes)", url, final_url, fetch_ms, bytes.len());

        Ok(FetchResponse { url: url.clone(), final_url, status, content_type, body, fetch_ms })
    }

    async fn probe(&self, url: &Url) -> Result<ProbeResponse, Error> {
        let mut response = self
            .http
            .head(url.as_str())
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if matches!(response.status(), StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED) {
            tracing::debug!("HEAD rejected by {}, retrying with ranged GET", url);
            response = self
                .http
                .get(url.as_str())
                .header(header::RANGE, "bytes=0-0")
                .send()
                .await
                .map_err(|e| self.transport_error(e))?;
        }

        let headers = response.headers();
        let content_length = content_range_total(headers).or_else(|| {
            header_string(headers, header::CONTENT_LENGTH).and_then(|v| v.trim().parse::<u64>().ok())
        });

        Ok(ProbeResponse {
            url: url.clone(),
            final_url: response.url().clone(),
            status: response.status(),
            content_type: header_string(headers, header::CONTENT_TYPE),
            content_length,
        })
    }
}

fn header_string(headers: &header::HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Total size from a `Content-Range: bytes 0-0/12345` header.
fn content_range_total(headers: &header::HeaderMap) -> Option<u64> {
    header_string(headers, header::CONTENT_RANGE)?
        .rsplit('/')
        .next()
        .and_then(|total| total.trim().parse::<u64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert!(config.user_agent.starts_with("vidscout/"));
        assert_eq!(config.max_bytes, 5 * 1024 * 1024);
        assert_eq!(config.timeout, Duration::from_millis(20000));
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_fetch_config_from_app_config() {
        let app = AppConfig { timeout_ms: 1500, user_agent: "agent/2".into(), ..Default::default() };
        let config = FetchConfig::from(&app);
        assert_eq!(config.timeout, Duration::from_millis(1500));
        assert_eq!(config.user_agent, "agent/2");
    }

    #[test]
    fn test_content_range_total() {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::CONTENT_RANGE, header::HeaderValue::from_static("bytes 0-0/12345"));
        assert_eq!(content_range_total(&headers), Some(12345));

        headers.insert(header::CONTENT_RANGE, header::HeaderValue::from_static("bytes 0-0/*"));
        assert_eq!(content_range_total(&headers), None);
    }

    #[test]
    fn test_probe_response_accessible() {
        let url = Url::parse("https://x.com/a.mp4").unwrap();
        let probe = ProbeResponse {
            url: url.clone(),
            final_url: url,
            status: StatusCode::FORBIDDEN,
            content_type: None,
            content_length: None,
        };
        assert!(!probe.is_accessible());
    }

    #[tokio::test]
    async fn test_fetch_client_new() {
        let client = FetchClient::new(FetchConfig::default());
        assert!(client.is_ok());
    }

    mod http {
        use super::*;
        use httpmock::Method;
        use httpmock::prelude::*;

        fn client(max_bytes: usize) -> FetchClient {
            FetchClient::new(FetchConfig { max_bytes, ..FetchConfig::default() }).unwrap()
        }

        #[tokio::test]
        async fn test_fetch_html() {
            let server = MockServer::start_async().await;
            let page = server
                .mock_async(|when, then| {
                    when.method(GET).path("/post");
                    then.status(200).header("content-type", "text/html").body("<h1>Post</h1>");
                })
                .await;

            let url = Url::parse(&server.url("/post")).unwrap();
            let response = client(1024).fetch_html(&url).await.unwrap();
            page.assert_async().await;
            assert_eq!(response.status, StatusCode::OK);
            assert_eq!(response.body, "<h1>Post</h1>");
            assert_eq!(response.content_type.as_deref(), Some("text/html"));
            assert_eq!(response.final_url, url);
        }

        #[tokio::test]
        async fn test_fetch_html_error_status() {
            let server = MockServer::start_async().await;
            server
                .mock_async(|when, then| {
                    when.method(GET).path("/gone");
                    then.status(404);
                })
                .await;

            let url = Url::parse(&server.url("/gone")).unwrap();
            let result = client(1024).fetch_html(&url).await;
            assert!(matches!(result, Err(Error::HttpError(msg)) if msg.contains("404")));
        }

        #[tokio::test]
        async fn test_fetch_html_too_large() {
            let server = MockServer::start_async().await;
            server
                .mock_async(|when, then| {
                    when.method(GET).path("/big");
                    then.status(200).body("x".repeat(100));
                })
                .await;

            let url = Url::parse(&server.url("/big")).unwrap();
            let result = client(10).fetch_html(&url).await;
            assert!(matches!(result, Err(Error::FetchTooLarge(_))));
        }

        #[tokio::test]
        async fn test_probe_head() {
            let server = MockServer::start_async().await;
            server
                .mock_async(|when, then| {
                    when.method(Method::HEAD).path("/a.mp4");
                    then.status(200).header("content-type", "video/mp4");
                })
                .await;

            let url = Url::parse(&server.url("/a.mp4")).unwrap();
            let probe = client(1024).probe(&url).await.unwrap();
            assert!(probe.is_accessible());
            assert_eq!(probe.content_type.as_deref(), Some("video/mp4"));
            assert_eq!(probe.final_url, url);
        }

        #[tokio::test]
        async fn test_probe_falls_back_to_ranged_get() {
            let server = MockServer::start_async().await;
            let head = server
                .mock_async(|when, then| {
                    when.method(Method::HEAD).path("/b.webm");
                    then.status(405);
                })
                .await;
            let ranged = server
                .mock_async(|when, then| {
                    when.method(GET).path("/b.webm").header("range", "bytes=0-0");
                    then.status(206)
                        .header("content-type", "video/webm")
                        .header("content-range", "bytes 0-0/4096")
                        .body("x");
                })
                .await;

            let url = Url::parse(&server.url("/b.webm")).unwrap();
            let probe = client(1024).probe(&url).await.unwrap();
            head.assert_async().await;
            ranged.assert_async().await;
            assert_eq!(probe.status, StatusCode::PARTIAL_CONTENT);
            assert!(probe.is_accessible());
            assert_eq!(probe.content_length, Some(4096));
        }
    }
}
