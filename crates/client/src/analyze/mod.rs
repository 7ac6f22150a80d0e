//! Analysis orchestration.
//!
//! Each target URL moves through a fixed sequence of stages:
//!
//! ```text
//! Validating -> Fetching -> Parsing -> Detecting -> Normalizing
//!            -> CrossReferencing -> Deduplicating -> Done
//! ```
//!
//! Any stage may end in `Failed`. Network and validation failures are recorded
//! in the returned `SiteAnalysis::error_log`; only cancellation surfaces as an
//! error. Every network call is bounded by the configured timeout and races the
//! caller's `CancellationToken`.

mod batch;
mod details;

use chrono::{DateTime, Utc};
use futures_util::{StreamExt, stream};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::detect::{DetectedVideo, VideoDetector};
use crate::extract::{ArticleExtractor, DetectedArticle};
use crate::fetch::{
    FetchClient, FetchConfig, HttpClient, ProbeResponse, StaticHttpClient, canonicalize, host_of, site_url,
};
use crate::html::HtmlDocument;
use crate::normalize::normalize;
use crate::xref::{link_articles, related_articles};
use vidscout_core::{
    AppConfig, Article, Deduplicator, EmbedType, Error, FirstSeenDeduplicator, SiteAnalysis, Video, VideoUrlDetail,
};

use details::build_detail;

/// Settings for the analysis pipeline.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// HTTP settings handed to every client the factory builds
    pub fetch: FetchConfig,

    /// URLs analyzed concurrently per batch chunk (default: 5)
    pub batch_size: usize,

    /// Probe every detected video for accessibility (default: true)
    pub probe_videos: bool,

    /// Concurrent probes within one analysis (default: 4)
    pub probe_concurrency: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for AnalyzerConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            fetch: FetchConfig::from(config),
            batch_size: config.batch_size,
            probe_videos: config.probe_videos,
            probe_concurrency: config.probe_concurrency,
        }
    }
}

/// Builds the HTTP client for one analysis task.
///
/// Each concurrent analysis asks for its own client so no connection state is
/// shared between tasks.
pub trait HttpClientFactory: Send + Sync {
    fn create(&self, config: &FetchConfig) -> Result<Arc<dyn HttpClient>, Error>;
}

impl<F> HttpClientFactory for F
where
    F: Fn(&FetchConfig) -> Result<Arc<dyn HttpClient>, Error> + Send + Sync,
{
    fn create(&self, config: &FetchConfig) -> Result<Arc<dyn HttpClient>, Error> {
        self(config)
    }
}

/// Builds reqwest-backed [`FetchClient`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchClientFactory;

impl HttpClientFactory for FetchClientFactory {
    fn create(&self, config: &FetchConfig) -> Result<Arc<dyn HttpClient>, Error> {
        Ok(Arc::new(FetchClient::new(config.clone())?))
    }
}

/// Hands each task a clone sharing the same routes and counters.
impl HttpClientFactory for StaticHttpClient {
    fn create(&self, _config: &FetchConfig) -> Result<Arc<dyn HttpClient>, Error> {
        Ok(Arc::new(self.clone()))
    }
}

/// Stage of a single-URL analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnalysisStage {
    Validating,
    Fetching,
    Parsing,
    Detecting,
    Normalizing,
    CrossReferencing,
    Deduplicating,
    Done,
    Failed,
}

impl AnalysisStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStage::Validating => "validating",
            AnalysisStage::Fetching => "fetching",
            AnalysisStage::Parsing => "parsing",
            AnalysisStage::Detecting => "detecting",
            AnalysisStage::Normalizing => "normalizing",
            AnalysisStage::CrossReferencing => "crossReferencing",
            AnalysisStage::Deduplicating => "deduplicating",
            AnalysisStage::Done => "done",
            AnalysisStage::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisStage::Done | AnalysisStage::Failed)
    }
}

impl fmt::Display for AnalysisStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of [`Analyzer::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ValidationResult {
    fn valid() -> Self {
        Self { is_valid: true, error_message: None }
    }

    fn invalid(message: impl Into<String>) -> Self {
        Self { is_valid: false, error_message: Some(message.into()) }
    }
}

/// Entry point for analyzing pages.
///
/// Cheap to clone; clones share the client factory and deduplicator.
#[derive(Clone)]
pub struct Analyzer {
    config: AnalyzerConfig,
    factory: Arc<dyn HttpClientFactory>,
    dedup: Arc<dyn Deduplicator>,
}

impl Analyzer {
    /// Analyzer using reqwest for HTTP.
    pub fn new(config: AnalyzerConfig) -> Self {
        Self::with_factory(config, FetchClientFactory)
    }

    /// Analyzer building its HTTP clients from `factory`.
    pub fn with_factory(config: AnalyzerConfig, factory: impl HttpClientFactory + 'static) -> Self {
        Self { config, factory: Arc::new(factory), dedup: Arc::new(FirstSeenDeduplicator) }
    }

    /// Replace the duplicate-elimination strategy.
    pub fn with_deduplicator(mut self, dedup: impl Deduplicator + 'static) -> Self {
        self.dedup = Arc::new(dedup);
        self
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze one page. Never fails: problems are reported in `error_log`.
    pub async fn analyze(&self, target: &str) -> SiteAnalysis {
        let started = Instant::now();
        let analyzed_at = Utc::now();
        match self.analyze_with_cancellation(target, &CancellationToken::new()).await {
            Ok(analysis) => analysis,
            Err(e) => SiteAnalysis::failed(
                target,
                site_of(target),
                analyzed_at,
                started.elapsed().as_secs_f64(),
                e.to_string(),
            ),
        }
    }

    /// Analyze one page, stopping at the next network call once `token` is cancelled.
    ///
    /// # Errors
    ///
    /// Returns `Error::Cancelled` if `token` fires before the analysis completes.
    pub async fn analyze_with_cancellation(
        &self, target: &str, token: &CancellationToken,
    ) -> Result<SiteAnalysis, Error> {
        let started = Instant::now();
        let analyzed_at = Utc::now();

        let client = match self.factory.create(&self.config.fetch) {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!("failed to create HTTP client for {}: {}", target, e);
                let elapsed = started.elapsed().as_secs_f64();
                return Ok(SiteAnalysis::failed(target, site_of(target), analyzed_at, elapsed, e.to_string()));
            }
        };

        let pipeline = Pipeline {
            config: &self.config,
            client,
            dedup: self.dedup.as_ref(),
            token,
            target,
            started,
            analyzed_at,
            stage: AnalysisStage::Validating,
            errors: Vec::new(),
        };
        pipeline.run().await
    }

    /// Check that `target` is a well-formed http(s) URL answering with a 2xx status.
    pub async fn validate(&self, target: &str) -> ValidationResult {
        let url = match canonicalize(target) {
            Ok(url) => url,
            Err(e) => return ValidationResult::invalid(Error::InvalidUrl(e.to_string()).to_string()),
        };

        let client = match self.factory.create(&self.config.fetch) {
            Ok(client) => client,
            Err(e) => return ValidationResult::invalid(e.to_string()),
        };

        let token = CancellationToken::new();
        match bounded(&self.config, &token, client.probe(&url)).await {
            Ok(response) if response.is_accessible() => ValidationResult::valid(),
            Ok(response) => ValidationResult::invalid(format!("{} answered status {}", url, response.status.as_u16())),
            Err(e) => ValidationResult::invalid(e.to_string()),
        }
    }

    /// Probe a single video URL and describe it.
    ///
    /// An unreachable URL yields an inaccessible detail rather than an error.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidUrl` for malformed input, or the client factory's error.
    pub async fn get_video_details(&self, video_url: &str) -> Result<VideoUrlDetail, Error> {
        let url = canonicalize(video_url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let host = host_of(url.as_str()).unwrap_or_else(|| url.to_string());
        let video = Video::new(url.as_str(), EmbedType::Unknown, host)?;

        let client = self.factory.create(&self.config.fetch)?;
        let token = CancellationToken::new();
        let probe = match bounded(&self.config, &token, client.probe(&url)).await {
            Ok(response) => Some(response),
            Err(e) => {
                tracing::warn!("accessibility probe failed for {}: {}", url, e);
                None
            }
        };

        Ok(build_detail(&video, probe.as_ref(), Vec::new()))
    }
}

/// Scheme and host of `target`, or empty when it does not parse.
fn site_of(target: &str) -> String {
    canonicalize(target).map(|url| site_url(&url)).unwrap_or_default()
}

/// Run a network call under the configured timeout, racing `token`.
async fn bounded<T>(
    config: &AnalyzerConfig, token: &CancellationToken, call: impl Future<Output = Result<T, Error>>,
) -> Result<T, Error> {
    match token.run_until_cancelled(tokio::time::timeout(config.fetch.timeout, call)).await {
        None => Err(Error::Cancelled),
        Some(Err(_elapsed)) => {
            Err(Error::FetchTimeout(format!("no response within {}ms", config.fetch.timeout.as_millis())))
        }
        Some(Ok(result)) => result,
    }
}

/// Everything found in one page before normalization.
struct PageScan {
    videos: Vec<DetectedVideo>,
    articles: Vec<DetectedArticle>,
}

/// State of one single-URL analysis.
struct Pipeline<'a> {
    config: &'a AnalyzerConfig,
    client: Arc<dyn HttpClient>,
    dedup: &'a dyn Deduplicator,
    token: &'a CancellationToken,
    target: &'a str,
    started: Instant,
    analyzed_at: DateTime<Utc>,
    stage: AnalysisStage,
    errors: Vec<String>,
}

impl Pipeline<'_> {
    fn enter(&mut self, stage: AnalysisStage) {
        tracing::debug!(target_url = self.target, from = %self.stage, to = %stage, "analysis stage");
        self.stage = stage;
    }

    fn elapsed(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    /// Finish in `Failed` with a single error entry.
    fn fail(mut self, site: String, message: String) -> SiteAnalysis {
        self.enter(AnalysisStage::Failed);
        tracing::warn!("analysis of {} failed: {}", self.target, message);
        SiteAnalysis::failed(self.target, site, self.analyzed_at, self.elapsed(), message)
    }

    async fn run(mut self) -> Result<SiteAnalysis, Error> {
        self.enter(AnalysisStage::Validating);
        let url = match canonicalize(self.target) {
            Ok(url) => url,
            Err(e) => {
                let message = format!("validation failed: {}", Error::InvalidUrl(e.to_string()));
                return Ok(self.fail(String::new(), message));
            }
        };
        let site = site_url(&url);

        match bounded(self.config, self.token, self.client.probe(&url)).await {
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(e) => return Ok(self.fail(site, format!("validation failed: {url} is unreachable: {e}"))),
            Ok(response) if !response.is_accessible() => {
                let status = response.status.as_u16();
                return Ok(self.fail(site, format!("validation failed: {url} answered status {status}")));
            }
            Ok(_) => {}
        }

        self.enter(AnalysisStage::Fetching);
        let page = match bounded(self.config, self.token, self.client.fetch_html(&url)).await {
            Ok(page) => page,
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(e) => return Ok(self.fail(site, format!("fetch failed for {url}: {e}"))),
        };

        let scan = self.scan(&page.body, page.final_url.as_str());

        self.enter(AnalysisStage::Normalizing);
        let videos: Vec<Video> = scan
            .videos
            .iter()
            .filter_map(|detected| match normalize(detected) {
                Ok(video) => Some(video),
                Err(e) => {
                    tracing::warn!("skipping video {:?}: {}", detected.url, e);
                    None
                }
            })
            .collect();

        self.enter(AnalysisStage::CrossReferencing);
        let articles = link_articles(&videos, scan.articles);
        let details = self.describe(&videos, &articles).await?;

        self.enter(AnalysisStage::Deduplicating);
        let videos = self.dedup.videos(&videos);
        let articles = self.dedup.articles(&articles);
        let details = self.dedup.details(&details);

        self.enter(AnalysisStage::Done);
        let processing_time = self.elapsed();
        tracing::info!(
            target_url = self.target,
            videos = videos.len(),
            articles = articles.len(),
            errors = self.errors.len(),
            "analysis finished in {:.3}s",
            processing_time
        );

        Ok(SiteAnalysis::new(
            self.target,
            site,
            videos,
            articles,
            details,
            self.analyzed_at,
            processing_time,
            self.errors,
        ))
    }

    /// Parse and run detection. The parsed document never outlives this call.
    fn scan(&mut self, body: &str, base_url: &str) -> PageScan {
        self.enter(AnalysisStage::Parsing);
        let doc = HtmlDocument::parse(body);

        self.enter(AnalysisStage::Detecting);
        let videos = VideoDetector::default().detect(&doc, base_url);
        let articles = ArticleExtractor::default().extract(&doc, base_url);
        tracing::debug!(videos = videos.len(), articles = articles.len(), "page scanned");

        PageScan { videos, articles }
    }

    /// Probe every video and build its detail record.
    async fn describe(&mut self, videos: &[Video], articles: &[Article]) -> Result<Vec<VideoUrlDetail>, Error> {
        if !self.config.probe_videos {
            return Ok(videos
                .iter()
                .map(|video| build_detail(video, None, related_articles(video, articles)))
                .collect());
        }

        // collected first: a `map` closure over `&Video` here keeps the batch future from being Send
        let this = &*self;
        let pending: Vec<_> = videos.iter().map(|video| this.probe(video)).collect();
        let probes: Vec<Result<ProbeResponse, Error>> =
            stream::iter(pending).buffered(self.config.probe_concurrency.max(1)).collect().await;

        let mut details = Vec::with_capacity(videos.len());
        for (video, probe) in videos.iter().zip(probes) {
            let probe = match probe {
                Ok(response) => Some(response),
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(e) => {
                    self.errors.push(format!("accessibility probe failed for {}: {}", video.url, e));
                    None
                }
            };
            details.push(build_detail(video, probe.as_ref(), related_articles(video, articles)));
        }
        Ok(details)
    }

    async fn probe(&self, video: &Video) -> Result<ProbeResponse, Error> {
        let url = Url::parse(&video.url).map_err(|e| Error::InvalidUrl(format!("{}: {}", video.url, e)))?;
        bounded(self.config, self.token, self.client.probe(&url)).await
    }
}
