//! Serialization of analysis results.
//!
//! JSON output is the lossless camelCase form of [`SiteAnalysis`]; HTML output
//! is a self-contained report with every scraped string escaped.

mod html;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use vidscout_core::{Error, SiteAnalysis};

/// Output format for [`export`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Html,
}

impl ExportFormat {
    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Html => "html",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "html" => Ok(ExportFormat::Html),
            other => Err(Error::InvalidInput(format!("unknown export format {other:?} (expected json or html)"))),
        }
    }
}

/// Render `analysis` in `format`.
///
/// # Errors
///
/// Returns `Error::ExportFailed` if serialization fails.
pub fn export(analysis: &SiteAnalysis, format: ExportFormat) -> Result<Vec<u8>, Error> {
    let bytes = match format {
        ExportFormat::Json => serde_json::to_vec_pretty(analysis)?,
        ExportFormat::Html => html::render(analysis)?.into_bytes(),
    };
    tracing::debug!(format = %format, bytes = bytes.len(), "exported analysis {}", analysis.id);
    Ok(bytes)
}

/// `video_analysis_<unix_ts>.<ext>`, the file name callers write exports to.
pub fn export_file_name(format: ExportFormat, unix_timestamp: i64) -> String {
    format!("video_analysis_{}.{}", unix_timestamp, format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use vidscout_core::{Article, EmbedType, Video, VideoPosition};

    fn sample() -> SiteAnalysis {
        let mut video = Video::new("https://x.com/a.mp4", EmbedType::Html5, "x.com").unwrap();
        video.duration = Some(12.25);
        video.metadata.insert("position".into(), "0".into());
        let mut article = Article::new("https://x.com/post", Some("Post".into()));
        article.video_positions.push(VideoPosition::new(video.id.clone(), 0));
        let analyzed_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        SiteAnalysis::new(
            "https://x.com/post",
            "https://x.com",
            vec![video],
            vec![article],
            Vec::new(),
            analyzed_at,
            0.5,
            vec!["accessibility probe failed".into()],
        )
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!(" html ".parse::<ExportFormat>().unwrap(), ExportFormat::Html);
        assert!(matches!("xml".parse::<ExportFormat>(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_json_round_trip() {
        let analysis = sample();
        let bytes = export(&analysis, ExportFormat::Json).unwrap();
        let decoded: SiteAnalysis = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, analysis);
    }

    #[test]
    fn test_json_field_names() {
        let bytes = export(&sample(), ExportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let keys =
            ["targetUrl", "siteUrl", "videos", "articles", "videoDetails", "analyzedAt", "processingTime", "errorLog"];
        for key in keys {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(value["videos"][0]["embedType"], "html5");
        assert_eq!(value["videos"][0]["hostingSource"], "x.com");
        assert_eq!(value["articles"][0]["videoPositions"][0]["isAboveFold"], true);
    }

    #[test]
    fn test_html_export() {
        let html = String::from_utf8(export(&sample(), ExportFormat::Html).unwrap()).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("https://x.com/post"));
        assert!(html.contains("accessibility probe failed"));
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name(ExportFormat::Json, 1_700_000_000), "video_analysis_1700000000.json");
        assert_eq!(export_file_name(ExportFormat::Html, 42), "video_analysis_42.html");
    }
}
