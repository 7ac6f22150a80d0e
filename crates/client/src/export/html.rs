//! Standalone HTML report.

use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fmt::{self, Write};
use url::Url;

use vidscout_core::{Article, Error, SiteAnalysis, Video, VideoUrlDetail};

const STYLE: &str = "body{font-family:system-ui,sans-serif;margin:2rem;color:#222}\
table{border-collapse:collapse;width:100%}td,th{border:1px solid #ccc;padding:.3rem .5rem;text-align:left}\
.card{border:1px solid #ddd;border-radius:6px;padding:.75rem 1rem;margin:.75rem 0}\
.muted{color:#666}.errors li{color:#a00}";

pub(super) fn render(analysis: &SiteAnalysis) -> Result<String, Error> {
    let mut out = String::new();
    write_report(&mut out, analysis)
        .map_err(|e| Error::ExportFailed(format!("failed to render HTML report: {e}")))?;
    Ok(out)
}

fn write_report(out: &mut String, analysis: &SiteAnalysis) -> fmt::Result {
    writeln!(out, "<!DOCTYPE html>")?;
    writeln!(out, "<html lang=\"en\"><head><meta charset=\"utf-8\">")?;
    writeln!(out, "<title>Video analysis: {}</title>", encode_text(&analysis.target_url))?;
    writeln!(out, "<style>{STYLE}</style></head><body>")?;

    writeln!(out, "<header><h1>Video analysis</h1>")?;
    writeln!(out, "<p>Target: {}</p>", link(&analysis.target_url))?;
    writeln!(out, "<p>Site: {}</p>", encode_text(&analysis.site_url))?;
    writeln!(
        out,
        "<p class=\"muted\">Analyzed {} in {:.2}s</p></header>",
        analysis.analyzed_at.to_rfc3339(),
        analysis.processing_time
    )?;

    writeln!(out, "<section><h2>Summary</h2><ul>")?;
    writeln!(out, "<li>Videos: {}</li>", analysis.videos.len())?;
    writeln!(out, "<li>Articles: {}</li>", analysis.articles.len())?;
    writeln!(out, "<li>Video details: {}</li>", analysis.video_details.len())?;
    writeln!(out, "<li>Errors: {}</li>", analysis.error_log.len())?;
    writeln!(out, "</ul></section>")?;

    writeln!(out, "<section><h2>Videos</h2>")?;
    for video in &analysis.videos {
        write_video(out, video)?;
    }
    writeln!(out, "</section>")?;

    writeln!(out, "<section><h2>Articles</h2>")?;
    for article in &analysis.articles {
        write_article(out, article)?;
    }
    writeln!(out, "</section>")?;

    writeln!(out, "<section><h2>Video details</h2><table>")?;
    writeln!(
        out,
        "<tr><th>URL</th><th>Format</th><th>Resolution</th><th>File size</th>\
         <th>Accessible</th><th>Related articles</th></tr>"
    )?;
    for detail in &analysis.video_details {
        write_detail_row(out, detail)?;
    }
    writeln!(out, "</table></section>")?;

    writeln!(out, "<section class=\"errors\"><h2>Errors</h2><ul>")?;
    for error in &analysis.error_log {
        writeln!(out, "<li>{}</li>", encode_text(error))?;
    }
    writeln!(out, "</ul></section>")?;

    writeln!(out, "</body></html>")
}

/// Anchor for http(s) URLs; anything else is shown as plain text.
fn link(url: &str) -> String {
    let linkable = Url::parse(url).is_ok_and(|u| matches!(u.scheme(), "http" | "https"));
    if !linkable {
        return encode_text(url).into_owned();
    }
    format!("<a href=\"{}\">{}</a>", encode_double_quoted_attribute(url), encode_text(url))
}

fn or_dash(value: Option<&str>) -> String {
    value.map_or_else(|| "-".to_string(), |v| encode_text(v).into_owned())
}

fn write_video(out: &mut String, video: &Video) -> fmt::Result {
    writeln!(out, "<div class=\"card\">")?;
    writeln!(out, "<h3>{}</h3>", or_dash(video.title.as_deref()))?;
    writeln!(out, "<p>{}</p><ul>", link(&video.url))?;
    writeln!(out, "<li>Format: {}</li>", video.format())?;
    writeln!(out, "<li>Resolution: {}</li>", or_dash(video.resolution.as_deref()))?;
    writeln!(out, "<li>Embed type: {}</li>", video.embed_type)?;
    writeln!(out, "<li>Hosting source: {}</li>", encode_text(&video.hosting_source))?;
    if let Some(duration) = video.duration {
        writeln!(out, "<li>Duration: {duration:.1}s</li>")?;
    }
    writeln!(out, "</ul>")?;

    if !video.metadata.is_empty() {
        writeln!(out, "<details><summary>Metadata</summary><ul>")?;
        for (key, value) in &video.metadata {
            writeln!(out, "<li>{}: {}</li>", encode_text(key), encode_text(value))?;
        }
        writeln!(out, "</ul></details>")?;
    }
    writeln!(out, "</div>")
}

fn write_article(out: &mut String, article: &Article) -> fmt::Result {
    writeln!(out, "<div class=\"card\">")?;
    writeln!(out, "<h3>{}</h3>", or_dash(article.title.as_deref()))?;
    writeln!(out, "<p>{}</p>", link(&article.url))?;
    if let Some(author) = &article.author {
        writeln!(out, "<p>Author: {}</p>", encode_text(author))?;
    }
    if let Some(published) = article.published_at {
        writeln!(out, "<p>Published: {}</p>", published.to_rfc3339())?;
    }
    writeln!(out, "<p>Videos: {}</p>", article.video_positions.len())?;

    if !article.video_positions.is_empty() {
        writeln!(out, "<ol start=\"0\">")?;
        for position in &article.video_positions {
            write!(out, "<li>Position {}", position.position)?;
            if position.is_above_fold {
                write!(out, " (above the fold)")?;
            }
            for (label, value) in [
                ("Caption", &position.caption),
                ("Description", &position.description),
                ("Context", &position.surrounding_text),
            ] {
                if let Some(value) = value {
                    write!(out, "<br>{label}: {}", encode_text(value))?;
                }
            }
            writeln!(out, "</li>")?;
        }
        writeln!(out, "</ol>")?;
    }
    writeln!(out, "</div>")
}

fn write_detail_row(out: &mut String, detail: &VideoUrlDetail) -> fmt::Result {
    let size = detail.file_size.map_or_else(|| "-".to_string(), |bytes| format!("{bytes} bytes"));
    let accessible = if detail.accessibility.is_accessible { "yes" } else { "no" };
    writeln!(
        out,
        "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
        link(&detail.original_url),
        detail.video.format(),
        or_dash(detail.video.resolution.as_deref()),
        size,
        accessible,
        detail.related_articles.len()
    )
}
