use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;
use crate::id::video_id;

/// Container format, derived from the URL file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoFormat {
    Mp4,
    Webm,
    Ogg,
    Avi,
    Mov,
    Flv,
    Mkv,
    Unknown,
}

impl VideoFormat {
    /// Look up a format by file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "mp4" | "m4v" => VideoFormat::Mp4,
            "webm" => VideoFormat::Webm,
            "ogg" | "ogv" => VideoFormat::Ogg,
            "avi" => VideoFormat::Avi,
            "mov" => VideoFormat::Mov,
            "flv" => VideoFormat::Flv,
            "mkv" => VideoFormat::Mkv,
            _ => VideoFormat::Unknown,
        }
    }

    /// Derive the format from the extension of the URL's last path segment.
    ///
    /// Works on malformed URLs too: query and fragment are stripped textually.
    pub fn from_url(url: &str) -> Self {
        url_extension(url).map_or(VideoFormat::Unknown, VideoFormat::from_extension)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VideoFormat::Mp4 => "mp4",
            VideoFormat::Webm => "webm",
            VideoFormat::Ogg => "ogg",
            VideoFormat::Avi => "avi",
            VideoFormat::Mov => "mov",
            VideoFormat::Flv => "flv",
            VideoFormat::Mkv => "mkv",
            VideoFormat::Unknown => "unknown",
        }
    }
}

impl fmt::Display for VideoFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extension of the last path segment of `url`, if any.
pub fn url_extension(url: &str) -> Option<&str> {
    let without_fragment = url.split('#').next().unwrap_or(url);
    let path = without_fragment.split('?').next().unwrap_or(without_fragment);
    let path = path.split_once("://").map_or(path, |(_, rest)| rest.split_once('/').map_or("", |(_, p)| p));
    let segment = path.rsplit('/').next()?;
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() { None } else { Some(ext) }
}

/// How a video is placed on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedType {
    Html5,
    Iframe,
    Javascript,
    Flash,
    Embed,
    Object,
    Unknown,
}

impl EmbedType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmbedType::Html5 => "html5",
            EmbedType::Iframe => "iframe",
            EmbedType::Javascript => "javascript",
            EmbedType::Flash => "flash",
            EmbedType::Embed => "embed",
            EmbedType::Object => "object",
            EmbedType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for EmbedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A video discovered on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    /// Deterministic id derived from the canonical URL. Not reassigned after construction.
    pub id: String,
    /// Canonical (resolved) locator of the video. `id` and `format` are derived from it.
    pub url: String,
    pub title: Option<String>,
    format: VideoFormat,
    /// `WxH` when known.
    pub resolution: Option<String>,
    /// Duration in seconds.
    pub duration: Option<f64>,
    /// Domain serving the video, or the raw URL when it has no host.
    pub hosting_source: String,
    pub embed_type: EmbedType,
    pub metadata: BTreeMap<String, String>,
    pub thumbnail_url: Option<String>,
    pub discovered_at: DateTime<Utc>,
}

impl Video {
    /// Container format, fixed at construction from the URL extension.
    pub fn format(&self) -> VideoFormat {
        self.format
    }

    /// Create a video for `url`, deriving id and format.
    ///
    /// # Errors
    ///
    /// Returns `Error::NormalizeFailed` if `url` is blank.
    pub fn new(
        url: impl Into<String>, embed_type: EmbedType, hosting_source: impl Into<String>,
    ) -> Result<Self, Error> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(Error::NormalizeFailed("video URL is empty".into()));
        }

        Ok(Self {
            id: video_id(&url),
            format: VideoFormat::from_url(&url),
            url,
            title: None,
            resolution: None,
            duration: None,
            hosting_source: hosting_source.into(),
            embed_type,
            metadata: BTreeMap::new(),
            thumbnail_url: None,
            discovered_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_url() {
        assert_eq!(VideoFormat::from_url("https://x.com/a.mp4"), VideoFormat::Mp4);
        assert_eq!(VideoFormat::from_url("https://x.com/clip.WEBM?t=3"), VideoFormat::Webm);
        assert_eq!(VideoFormat::from_url("https://x.com/v/movie.mkv#t=10"), VideoFormat::Mkv);
        assert_eq!(VideoFormat::from_url("https://x.com/a.ogv"), VideoFormat::Ogg);
    }

    #[test]
    fn test_format_unknown() {
        assert_eq!(VideoFormat::from_url("https://www.youtube.com/embed/abc"), VideoFormat::Unknown);
        assert_eq!(VideoFormat::from_url("https://x.com/file.txt"), VideoFormat::Unknown);
        assert_eq!(VideoFormat::from_url("https://video.mp4"), VideoFormat::Unknown);
        assert_eq!(VideoFormat::from_url(""), VideoFormat::Unknown);
    }

    #[test]
    fn test_format_malformed_url() {
        assert_eq!(VideoFormat::from_url("media/clip.mov"), VideoFormat::Mov);
        assert_eq!(VideoFormat::from_url("clip.flv"), VideoFormat::Flv);
    }

    #[test]
    fn test_hidden_file_has_no_extension() {
        assert_eq!(url_extension("https://x.com/.mp4"), None);
    }

    #[test]
    fn test_video_new_derives_fields() {
        let video = Video::new("https://x.com/a.mp4", EmbedType::Html5, "x.com").unwrap();
        assert_eq!(video.format(), VideoFormat::Mp4);
        assert_eq!(video.id, video_id("https://x.com/a.mp4"));
        assert_eq!(video.hosting_source, "x.com");
        assert!(video.metadata.is_empty());
    }

    #[test]
    fn test_format_survives_serialization() {
        let mut video = Video::new("https://x.com/a.webm?x=1", EmbedType::Html5, "x.com").unwrap();
        video.title = Some("Clip".into());
        video.metadata.insert("position".into(), "0".into());
        assert_eq!(video.format(), VideoFormat::Webm);

        let json = serde_json::to_value(&video).unwrap();
        assert_eq!(json["format"], "webm");
        let decoded: Video = serde_json::from_value(json).unwrap();
        assert_eq!(decoded.format(), VideoFormat::Webm);
        assert_eq!(decoded, video);
    }

    #[test]
    fn test_video_new_rejects_empty_url() {
        let result = Video::new("  ", EmbedType::Html5, "x.com");
        assert!(matches!(result, Err(Error::NormalizeFailed(_))));
    }

    #[test]
    fn test_enum_serialization() {
        assert_eq!(serde_json::to_string(&VideoFormat::Mp4).unwrap(), "\"mp4\"");
        assert_eq!(serde_json::to_string(&EmbedType::Javascript).unwrap(), "\"javascript\"");
        let parsed: EmbedType = serde_json::from_str("\"iframe\"").unwrap();
        assert_eq!(parsed, EmbedType::Iframe);
    }
}
