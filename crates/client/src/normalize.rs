//! Conversion of detected videos into typed `Video` records.

use std::collections::BTreeMap;

use crate::detect::DetectedVideo;
use crate::fetch::{host_of, resolve};
use vidscout_core::{Error, Video};

/// Attributes consumed into typed fields and kept out of the metadata map.
const CAPTURED_ATTRIBUTES: &[&str] = &[
    "src",
    "width",
    "height",
    "resolution",
    "duration",
    "poster",
    "thumbnail",
    "title",
    "aria-label",
    "data-title",
];

/// Attributes read for the title, first non-empty wins.
const TITLE_ATTRIBUTES: &[&str] = &["title", "aria-label", "data-title"];

/// Build a `Video` from a detected element.
///
/// Only an empty URL is an error; every attribute problem degrades to `None`.
pub(crate) fn normalize(detected: &DetectedVideo) -> Result<Video, Error> {
    let attrs = &detected.attributes;
    let hosting_source = host_of(&detected.url).unwrap_or_else(|| detected.url.clone());
    let mut video = Video::new(detected.url.clone(), detected.embed_type, hosting_source)?;

    video.title = first_attr(attrs, TITLE_ATTRIBUTES);
    video.resolution = match (non_empty(attrs, "width"), non_empty(attrs, "height")) {
        (Some(width), Some(height)) => Some(format!("{width}x{height}")),
        _ => first_attr(attrs, &["resolution"]),
    };
    video.duration = non_empty(attrs, "duration").and_then(parse_duration);
    video.thumbnail_url = first_attr(attrs, &["poster", "thumbnail"]).map(|thumb| resolve(&thumb, &detected.base_url));

    let mut metadata: BTreeMap<String, String> = attrs
        .iter()
        .filter(|(name, value)| !CAPTURED_ATTRIBUTES.contains(&name.as_str()) && !value.is_empty())
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();
    metadata.insert("position".into(), detected.position.to_string());
    if let Some(context) = &detected.context {
        metadata.insert("context".into(), context.clone());
    }
    if let Some(platform_id) = platform_video_id(&detected.url) {
        metadata.insert("videoId".into(), platform_id);
    }
    video.metadata = metadata;

    Ok(video)
}

fn non_empty<'a>(attrs: &'a BTreeMap<String, String>, name: &str) -> Option<&'a str> {
    attrs.get(name).map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn first_attr(attrs: &BTreeMap<String, String>, names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| non_empty(attrs, name)).map(str::to_string)
}

/// Seconds from a `duration` attribute; negative or non-finite values are dropped.
fn parse_duration(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|secs| secs.is_finite() && *secs >= 0.0)
}

/// Id of the video on YouTube, Vimeo or Dailymotion, read from its URL.
pub(crate) fn platform_video_id(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    let segments: Vec<&str> = parsed.path_segments()?.filter(|s| !s.is_empty()).collect();

    let id = match host {
        "youtu.be" | "dai.ly" => segments.first().copied(),
        h if h.ends_with("youtube.com") || h.ends_with("youtube-nocookie.com") => match segments.as_slice() {
            ["embed" | "v" | "shorts" | "live", id, ..] => Some(*id),
            ["watch", ..] => {
                return parsed
                    .query_pairs()
                    .find(|(k, _)| k == "v")
                    .map(|(_, v)| v.into_owned())
                    .filter(|v| !v.is_empty());
            }
            _ => None,
        },
        h if h.ends_with("vimeo.com") => segments.iter().rev().find(|s| s.chars().all(|c| c.is_ascii_digit())).copied(),
        h if h.ends_with("dailymotion.com") => match segments.as_slice() {
            [.., "video", id] => id.split('_').next(),
            _ => None,
        },
        _ => None,
    };

    id.filter(|id| !id.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::ElementContext;
    use pretty_assertions::assert_eq;
    use vidscout_core::{EmbedType, VideoFormat};

    fn detected(url: &str, attrs: &[(&str, &str)]) -> DetectedVideo {
        DetectedVideo {
            url: url.to_string(),
            base_url: "https://x.com/blog/post".to_string(),
            embed_type: EmbedType::Html5,
            attributes: attrs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            context: None,
            position: 2,
            location: ElementContext::default(),
        }
    }

    #[test]
    fn test_html5_scenario() {
        let video = normalize(&detected("https://x.com/a.mp4", &[])).unwrap();
        assert_eq!(video.format(), VideoFormat::Mp4);
        assert_eq!(video.embed_type, EmbedType::Html5);
        assert_eq!(video.hosting_source, "x.com");
        assert_eq!(video.metadata.get("position").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_typed_fields() {
        let video = normalize(&detected(
            "https://cdn.x.com/clips/intro.OGV?sig=1",
            &[
                ("width", "640"),
                ("height", "360"),
                ("duration", "12.5"),
                ("poster", "thumb.jpg"),
                ("aria-label", "Intro clip"),
                ("controls", ""),
                ("preload", "metadata"),
            ],
        ))
        .unwrap();
        assert_eq!(video.format(), VideoFormat::Ogg);
        assert_eq!(video.resolution.as_deref(), Some("640x360"));
        assert_eq!(video.duration, Some(12.5));
        assert_eq!(video.thumbnail_url.as_deref(), Some("https://x.com/blog/thumb.jpg"));
        assert_eq!(video.title.as_deref(), Some("Intro clip"));
        assert_eq!(video.metadata.get("preload").map(String::as_str), Some("metadata"));
        assert!(!video.metadata.contains_key("controls"));
        assert!(!video.metadata.contains_key("poster"));
    }

    #[test]
    fn test_resolution_attribute_fallback() {
        let input = detected("https://x.com/a.webm", &[("width", "640"), ("resolution", "1920x1080")]);
        let video = normalize(&input).unwrap();
        assert_eq!(video.resolution.as_deref(), Some("1920x1080"));
    }

    #[test]
    fn test_bad_duration_is_none() {
        for raw in ["abc", "-3", "NaN", "inf"] {
            let video = normalize(&detected("https://x.com/a.mp4", &[("duration", raw)])).unwrap();
            assert_eq!(video.duration, None, "duration {raw}");
        }
    }

    #[test]
    fn test_url_without_scheme_falls_back_to_raw() {
        let video = normalize(&detected("cdn.example/video.mov", &[])).unwrap();
        assert_eq!(video.hosting_source, "cdn.example/video.mov");
        assert_eq!(video.format(), VideoFormat::Mov);
    }

    #[test]
    fn test_empty_url_fails() {
        assert!(matches!(normalize(&detected("  ", &[])), Err(Error::NormalizeFailed(_))));
    }

    #[test]
    fn test_normalize_deterministic_except_timestamp() {
        let input = detected("https://x.com/a.mkv", &[("title", "A")]);
        let first = normalize(&input).unwrap();
        let mut second = normalize(&input).unwrap();
        second.discovered_at = first.discovered_at;
        assert_eq!(first, second);
    }

    #[test]
    fn test_platform_video_id() {
        let cases = [
            ("https://www.youtube.com/embed/abc123?rel=0", Some("abc123")),
            ("https://youtube.com/watch?v=dQw4w9WgXcQ&t=1", Some("dQw4w9WgXcQ")),
            ("https://m.youtube.com/shorts/s1", Some("s1")),
            ("https://youtu.be/xyz", Some("xyz")),
            ("https://www.youtube-nocookie.com/embed/nc1", Some("nc1")),
            ("https://player.vimeo.com/video/76979871", Some("76979871")),
            ("https://vimeo.com/channels/staff/12345", Some("12345")),
            ("https://www.dailymotion.com/embed/video/x7tgad0", Some("x7tgad0")),
            ("https://www.dailymotion.com/video/x7tgad0_some-title", Some("x7tgad0")),
            ("https://x.com/a.mp4", None),
            ("not a url", None),
        ];
        for (url, expected) in cases {
            assert_eq!(platform_video_id(url).as_deref(), expected, "{url}");
        }
    }

    #[test]
    fn test_platform_id_in_metadata() {
        let mut input = detected("https://www.youtube.com/embed/abc", &[("allowfullscreen", "true")]);
        input.embed_type = EmbedType::Iframe;
        input.context = Some("Player".into());
        let video = normalize(&input).unwrap();
        assert_eq!(video.metadata.get("videoId").map(String::as_str), Some("abc"));
        assert_eq!(video.metadata.get("context").map(String::as_str), Some("Player"));
        assert_eq!(video.format(), VideoFormat::Unknown);
    }
}
