//! Per-video enrichment from accessibility probes.

use reqwest::StatusCode;

use crate::fetch::ProbeResponse;
use vidscout_core::{AccessibilityInfo, StreamingInfo, StreamingProtocol, Video, VideoFormat, VideoUrlDetail};
use vidscout_core::model::url_extension;

/// Build the detail record for `video`. `probe` is `None` when probing was skipped or failed.
pub(crate) fn build_detail(
    video: &Video, probe: Option<&ProbeResponse>, related_articles: Vec<String>,
) -> VideoUrlDetail {
    let content_type = probe.and_then(|p| p.content_type.as_deref());

    let accessibility = AccessibilityInfo {
        is_accessible: probe.is_some_and(ProbeResponse::is_accessible),
        requires_authentication: probe
            .is_some_and(|p| matches!(p.status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)),
        blocked_regions: Vec::new(),
        supported_formats: supported_formats(video.format(), content_type),
        streaming_info: streaming_info(&video.url, content_type),
    };

    VideoUrlDetail {
        id: video.id.clone(),
        video: video.clone(),
        original_url: video.url.clone(),
        resolved_url: probe.map_or_else(|| video.url.clone(), |p| p.final_url.to_string()),
        file_size: probe.filter(|p| p.is_accessible()).and_then(|p| p.content_length),
        accessibility,
        related_articles,
    }
}

/// Format implied by a `video/*` media type.
fn format_from_content_type(content_type: &str) -> Option<VideoFormat> {
    let essence = content_type.split(';').next()?.trim().to_ascii_lowercase();
    let subtype = essence.strip_prefix("video/")?;
    let format = match subtype {
        "quicktime" => VideoFormat::Mov,
        "x-msvideo" => VideoFormat::Avi,
        "x-flv" => VideoFormat::Flv,
        "x-matroska" => VideoFormat::Mkv,
        other => VideoFormat::from_extension(other),
    };
    (format != VideoFormat::Unknown).then_some(format)
}

fn supported_formats(format: VideoFormat, content_type: Option<&str>) -> Vec<VideoFormat> {
    let mut formats = Vec::new();
    if format != VideoFormat::Unknown {
        formats.push(format);
    }
    if let Some(served) = content_type.and_then(format_from_content_type)
        && !formats.contains(&served)
    {
        formats.push(served);
    }
    formats
}

/// Delivery protocol from the manifest extension or the served media type.
pub(crate) fn streaming_info(url: &str, content_type: Option<&str>) -> Option<StreamingInfo> {
    let extension = url_extension(url).map(str::to_ascii_lowercase);
    let media_type = content_type.map(str::to_ascii_lowercase).unwrap_or_default();

    let protocol = if extension.as_deref() == Some("m3u8") || media_type.contains("mpegurl") {
        StreamingProtocol::Hls
    } else if extension.as_deref() == Some("mpd") || media_type.contains("dash+xml") {
        StreamingProtocol::Dash
    } else if media_type.starts_with("video/") || VideoFormat::from_url(url) != VideoFormat::Unknown {
        StreamingProtocol::Progressive
    } else {
        return None;
    };

    Some(StreamingInfo {
        is_adaptive: protocol != StreamingProtocol::Progressive,
        protocol,
        content_type: content_type.map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Url;
    use vidscout_core::EmbedType;

    fn probe(url: &str, status: u16, content_type: Option<&str>, len: Option<u64>) -> ProbeResponse {
        let url = Url::parse(url).unwrap();
        ProbeResponse {
            final_url: url.clone(),
            url,
            status: StatusCode::from_u16(status).unwrap(),
            content_type: content_type.map(str::to_string),
            content_length: len,
        }
    }

    #[test]
    fn test_accessible_detail() {
        let video = Video::new("https://x.com/a.mp4", EmbedType::Html5, "x.com").unwrap();
        let response = probe("https://x.com/a.mp4", 200, Some("video/webm"), Some(2048));
        let detail = build_detail(&video, Some(&response), vec!["art_1".into()]);
        assert_eq!(detail.id, video.id);
        assert!(detail.accessibility.is_accessible);
        assert!(!detail.accessibility.requires_authentication);
        assert_eq!(detail.file_size, Some(2048));
        assert_eq!(detail.accessibility.supported_formats, vec![VideoFormat::Mp4, VideoFormat::Webm]);
        assert_eq!(detail.accessibility.streaming_info.map(|s| s.protocol), Some(StreamingProtocol::Progressive));
        assert_eq!(detail.related_articles, vec!["art_1".to_string()]);
    }

    #[test]
    fn test_forbidden_requires_authentication() {
        let video = Video::new("https://x.com/a.mp4", EmbedType::Html5, "x.com").unwrap();
        let response = probe("https://x.com/a.mp4", 403, None, Some(10));
        let detail = build_detail(&video, Some(&response), Vec::new());
        assert!(!detail.accessibility.is_accessible);
        assert!(detail.accessibility.requires_authentication);
        assert_eq!(detail.file_size, None);
        assert!(detail.accessibility.blocked_regions.is_empty());
    }

    #[test]
    fn test_unprobed_detail() {
        let video = Video::new("https://www.youtube.com/embed/abc", EmbedType::Iframe, "www.youtube.com").unwrap();
        let detail = build_detail(&video, None, Vec::new());
        assert!(!detail.accessibility.is_accessible);
        assert_eq!(detail.resolved_url, video.url);
        assert!(detail.accessibility.supported_formats.is_empty());
        assert_eq!(detail.accessibility.streaming_info, None);
    }

    #[test]
    fn test_streaming_protocols() {
        let hls = streaming_info("https://x.com/live/master.m3u8", None).unwrap();
        assert_eq!(hls.protocol, StreamingProtocol::Hls);
        assert!(hls.is_adaptive);

        let dash = streaming_info("https://x.com/stream", Some("application/dash+xml")).unwrap();
        assert_eq!(dash.protocol, StreamingProtocol::Dash);
        assert_eq!(dash.content_type.as_deref(), Some("application/dash+xml"));

        assert!(streaming_info("https://x.com/page", Some("text/html")).is_none());
    }

    #[test]
    fn test_format_from_content_type() {
        assert_eq!(format_from_content_type("video/mp4; codecs=avc1"), Some(VideoFormat::Mp4));
        assert_eq!(format_from_content_type("video/quicktime"), Some(VideoFormat::Mov));
        assert_eq!(format_from_content_type("application/octet-stream"), None);
    }
}
