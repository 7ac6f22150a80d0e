use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Article, Video, VideoFormat};
use crate::id::analysis_id;

/// Delivery protocol of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamingProtocol {
    Hls,
    Dash,
    Progressive,
}

/// How a video is streamed, when it could be determined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingInfo {
    pub protocol: StreamingProtocol,
    /// True for manifest-driven (HLS/DASH) delivery.
    pub is_adaptive: bool,
    pub content_type: Option<String>,
}

/// Result of probing a video URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessibilityInfo {
    pub is_accessible: bool,
    pub requires_authentication: bool,
    pub blocked_regions: Vec<String>,
    pub supported_formats: Vec<VideoFormat>,
    pub streaming_info: Option<StreamingInfo>,
}

/// Per-video enrichment built from an accessibility probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoUrlDetail {
    /// Same as the id of `video`.
    pub id: String,
    pub video: Video,
    pub original_url: String,
    /// URL after redirects.
    pub resolved_url: String,
    pub file_size: Option<u64>,
    pub accessibility: AccessibilityInfo,
    /// Ids of articles containing this video.
    pub related_articles: Vec<String>,
}

/// Root result of analyzing one target URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteAnalysis {
    pub id: String,
    pub target_url: String,
    /// Scheme and host of the target.
    pub site_url: String,
    pub videos: Vec<Video>,
    pub articles: Vec<Article>,
    pub video_details: Vec<VideoUrlDetail>,
    pub analyzed_at: DateTime<Utc>,
    /// Wall-clock seconds spent on the analysis.
    pub processing_time: f64,
    pub error_log: Vec<String>,
}

impl SiteAnalysis {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        target_url: impl Into<String>, site_url: impl Into<String>, videos: Vec<Video>, articles: Vec<Article>,
        video_details: Vec<VideoUrlDetail>, analyzed_at: DateTime<Utc>, processing_time: f64, error_log: Vec<String>,
    ) -> Self {
        let target_url = target_url.into();
        Self {
            id: analysis_id(&target_url, analyzed_at.timestamp_nanos_opt().unwrap_or_default()),
            target_url,
            site_url: site_url.into(),
            videos,
            articles,
            video_details,
            analyzed_at,
            processing_time,
            error_log,
        }
    }

    /// An analysis that produced nothing but an error entry.
    pub fn failed(
        target_url: impl Into<String>, site_url: impl Into<String>, analyzed_at: DateTime<Utc>, processing_time: f64,
        error: impl Into<String>,
    ) -> Self {
        Self::new(
            target_url,
            site_url,
            Vec::new(),
            Vec::new(),
            Vec::new(),
            analyzed_at,
            processing_time,
            vec![error.into()],
        )
    }

    /// True when the analysis recorded any error and found nothing.
    pub fn is_failure(&self) -> bool {
        !self.error_log.is_empty() && self.videos.is_empty() && self.articles.is_empty()
    }
}
