//! In-memory `HttpClient` serving canned responses.
//!
//! Routes are keyed by absolute URL. Unknown URLs answer 404. Clones share the
//! route table and request counters, so a factory can hand out one clone per
//! task while a test observes the aggregate.

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{FetchResponse, HttpClient, ProbeResponse};
use vidscout_core::Error;

#[derive(Debug, Clone)]
enum Outcome {
    Respond { status: StatusCode, content_type: Option<String>, body: String, content_length: Option<u64> },
    Redirect { location: String },
    Fail(Error),
}

#[derive(Debug, Clone)]
struct Route {
    outcome: Outcome,
    latency: Option<Duration>,
}

#[derive(Debug, Default)]
struct Counters {
    requests: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

/// Decrements the in-flight counter even when the request future is dropped.
struct InFlight<'a>(&'a Counters);

impl<'a> InFlight<'a> {
    fn enter(counters: &'a Counters) -> Self {
        counters.requests.fetch_add(1, Ordering::SeqCst);
        let now = counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        counters.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        Self(counters)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Maximum redirect hops followed before giving up.
const MAX_HOPS: usize = 5;

/// In-memory HTTP client.
#[derive(Debug, Clone, Default)]
pub struct StaticHttpClient {
    routes: Arc<HashMap<String, Route>>,
    latency: Option<Duration>,
    counters: Arc<Counters>,
}

impl StaticHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_route(mut self, url: &str, outcome: Outcome) -> Self {
        Arc::make_mut(&mut self.routes).insert(route_key(url), Route { outcome, latency: None });
        self
    }

    /// Serve `html` with status 200 at `url`.
    pub fn with_page(self, url: &str, html: &str) -> Self {
        self.with_route(
            url,
            Outcome::Respond {
                status: StatusCode::OK,
                content_type: Some("text/html; charset=utf-8".into()),
                content_length: Some(html.len() as u64),
                body: html.to_string(),
            },
        )
    }

    /// Serve an empty body with `status` at `url`.
    pub fn with_status(self, url: &str, status: u16) -> Self {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        self.with_route(url, Outcome::Respond { status, content_type: None, body: String::new(), content_length: None })
    }

    /// Serve a media resource of `size` bytes at `url`.
    pub fn with_media(self, url: &str, content_type: &str, size: u64) -> Self {
        self.with_route(
            url,
            Outcome::Respond {
                status: StatusCode::OK,
                content_type: Some(content_type.to_string()),
                body: String::new(),
                content_length: Some(size),
            },
        )
    }

    /// Redirect `url` to `location`.
    pub fn with_redirect(self, url: &str, location: &str) -> Self {
        self.with_route(url, Outcome::Redirect { location: location.to_string() })
    }

    /// Fail every request to `url` with `error`.
    pub fn with_failure(self, url: &str, error: Error) -> Self {
        self.with_route(url, Outcome::Fail(error))
    }

    /// Delay responses for `url`.
    pub fn with_route_latency(mut self, url: &str, latency: Duration) -> Self {
        if let Some(route) = Arc::make_mut(&mut self.routes).get_mut(&route_key(url)) {
            route.latency = Some(latency);
        }
        self
    }

    /// Delay every response.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Total requests received across all clones.
    pub fn request_count(&self) -> usize {
        self.counters.requests.load(Ordering::SeqCst)
    }

    /// Requests currently being served across all clones.
    pub fn in_flight(&self) -> usize {
        self.counters.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneous requests observed.
    pub fn peak_in_flight(&self) -> usize {
        self.counters.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Follow redirects and return the final URL and its outcome.
    async fn serve(&self, url: &Url) -> Result<(Url, Outcome), Error> {
        let _guard = InFlight::enter(&self.counters);
        let mut current = url.clone();

        for _ in 0..=MAX_HOPS {
            let route = self.routes.get(&route_key(current.as_str())).cloned();
            let latency = route.as_ref().and_then(|r| r.latency).or(self.latency);
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }

            match route.map(|r| r.outcome) {
                Some(Outcome::Redirect { location }) => {
                    current = current
                        .join(&location)
                        .map_err(|e| Error::HttpError(format!("bad redirect location {location}: {e}")))?;
                }
                Some(Outcome::Fail(error)) => return Err(error),
                Some(outcome) => return Ok((current, outcome)),
                None => {
                    let not_found = Outcome::Respond {
                        status: StatusCode::NOT_FOUND,
                        content_type: None,
                        body: String::new(),
                        content_length: None,
                    };
                    return Ok((current, not_found));
                }
            }
        }

        Err(Error::HttpError(format!("too many redirects for {url}")))
    }
}

/// Normalize a route key the way `Url` serializes it (`https://x.com` -> `https://x.com/`).
fn route_key(url: &str) -> String {
    Url::parse(url.trim()).map(|u| u.to_string()).unwrap_or_else(|_| url.trim().to_string())
}

#[async_trait]
impl HttpClient for StaticHttpClient {
    async fn fetch_html(&self, url: &Url) -> Result<FetchResponse, Error> {
        let (final_url, outcome) = self.serve(url).await?;
        match outcome {
            Outcome::Respond { status, content_type, body, .. } if status.is_success() => Ok(FetchResponse {
                url: url.clone(),
                final_url,
                status,
                content_type,
                body,
                fetch_ms: 0,
            }),
            Outcome::Respond { status, .. } => Err(Error::HttpError(format!("status {} for {}", status.as_u16(), url))),
            Outcome::Redirect { .. } | Outcome::Fail(_) => Err(Error::HttpError(format!("unroutable {url}"))),
        }
    }

    async fn probe(&self, url: &Url) -> Result<ProbeResponse, Error> {
        let (final_url, outcome) = self.serve(url).await?;
        match outcome {
            Outcome::Respond { status, content_type, content_length, .. } => {
                Ok(ProbeResponse { url: url.clone(), final_url, status, content_type, content_length })
            }
            Outcome::Redirect { .. } | Outcome::Fail(_) => Err(Error::HttpError(format!("unroutable {url}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_serves_page() {
        let client = StaticHttpClient::new().with_page("https://x.com", "<p>hi</p>");
        let response = client.fetch_html(&url("https://x.com/")).await.unwrap();
        assert_eq!(response.body, "<p>hi</p>");
        assert_eq!(response.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_url_is_404() {
        let client = StaticHttpClient::new();
        let result = client.fetch_html(&url("https://x.com/missing")).await;
        assert!(matches!(result, Err(Error::HttpError(msg)) if msg.contains("404")));

        let probe = client.probe(&url("https://x.com/missing")).await.unwrap();
        assert_eq!(probe.status, StatusCode::NOT_FOUND);
        assert!(!client.check_accessibility(&url("https://x.com/missing")).await);
    }

    #[tokio::test]
    async fn test_redirect_sets_final_url() {
        let client = StaticHttpClient::new()
            .with_redirect("https://x.com/v", "/media/v.mp4")
            .with_media("https://x.com/media/v.mp4", "video/mp4", 1024);
        let probe = client.probe(&url("https://x.com/v")).await.unwrap();
        assert_eq!(probe.final_url.as_str(), "https://x.com/media/v.mp4");
        assert_eq!(probe.content_length, Some(1024));
    }

    #[tokio::test]
    async fn test_redirect_loop_fails() {
        let client = StaticHttpClient::new().with_redirect("https://x.com/a", "/a");
        assert!(client.probe(&url("https://x.com/a")).await.is_err());
    }

    #[tokio::test]
    async fn test_failure_route() {
        let client = StaticHttpClient::new().with_failure("https://x.com/", Error::FetchTimeout("slow".into()));
        let result = client.fetch_html(&url("https://x.com/")).await;
        assert!(matches!(result, Err(Error::FetchTimeout(_))));
    }

    #[tokio::test]
    async fn test_clones_share_counters() {
        let client = StaticHttpClient::new().with_page("https://x.com/", "ok");
        let clone = client.clone();
        clone.fetch_html(&url("https://x.com/")).await.unwrap();
        client.probe(&url("https://x.com/")).await.unwrap();
        assert_eq!(client.request_count(), 2);
        assert_eq!(client.in_flight(), 0);
        assert_eq!(client.peak_in_flight(), 1);
    }
}
