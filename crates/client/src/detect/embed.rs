use scraper::{ElementRef, Selector};
use std::sync::LazyLock;

use super::{Candidate, DetectionStrategy};
use crate::html;
use vidscout_core::EmbedType;

static EMBED: LazyLock<Selector> = LazyLock::new(|| Selector::parse("embed[src]").expect("invalid selector"));
static OBJECT: LazyLock<Selector> = LazyLock::new(|| Selector::parse("object").expect("invalid selector"));
static PARAM: LazyLock<Selector> = LazyLock::new(|| Selector::parse("param[name][value]").expect("invalid selector"));

/// Keywords marking a plugin source as video content.
const VIDEO_KEYWORDS: &[&str] = &["video", "youtube", "vimeo"];

const FLASH_MIME: &str = "application/x-shockwave-flash";

/// Plugin-era `<embed>` and `<object>` tags, including Flash players.
pub(crate) struct EmbedObjectStrategy;

/// Classify a plugin source, or `None` when it does not look like video.
///
/// Only sources mentioning a video keyword qualify; Flash players among them
/// are told apart by the `.swf` extension or the Flash media type.
fn classify(src: &str, mime: Option<&str>, plain: EmbedType) -> Option<EmbedType> {
    let lower = src.to_ascii_lowercase();
    if !VIDEO_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return None;
    }

    let path = lower.split(['?', '#']).next().unwrap_or_default();
    if path.ends_with(".swf") || mime.is_some_and(|m| m.eq_ignore_ascii_case(FLASH_MIME)) {
        Some(EmbedType::Flash)
    } else {
        Some(plain)
    }
}

impl DetectionStrategy for EmbedObjectStrategy {
    fn name(&self) -> &'static str {
        "embed"
    }

    fn candidates<'a>(&self, scope: ElementRef<'a>, _base_url: &str) -> Vec<Candidate<'a>> {
        let mut candidates = Vec::new();

        for embed in scope.select(&EMBED) {
            let Some(src) = html::attr(embed, "src") else { continue };
            let mime = embed.value().attr("type");
            if let Some(embed_type) = classify(&src, mime, EmbedType::Embed) {
                candidates.push(Candidate {
                    element: embed,
                    url: src,
                    embed_type,
                    attributes: html::attributes(embed),
                    context: None,
                });
            }
        }

        for object in scope.select(&OBJECT) {
            let mime = object.value().attr("type");
            let movie = object
                .select(&PARAM)
                .filter(|param| param.value().attr("name").is_some_and(|n| n.eq_ignore_ascii_case("movie")))
                .find_map(|param| html::attr(param, "value"));
            let Some(src) = html::attr(object, "data").or(movie) else { continue };

            if let Some(embed_type) = classify(&src, mime, EmbedType::Object) {
                candidates.push(Candidate {
                    element: object,
                    url: src,
                    embed_type,
                    attributes: html::attributes(object),
                    context: None,
                });
            }
        }

        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::HtmlDocument;

    fn found(html: &str) -> Vec<(String, EmbedType)> {
        let doc = HtmlDocument::parse(html);
        EmbedObjectStrategy
            .candidates(doc.root(), "https://x.com/")
            .into_iter()
            .map(|c| (c.url, c.embed_type))
            .collect()
    }

    #[test]
    fn test_embed_keyword_filter() {
        let result = found(
            r#"
            <embed src="https://cdn.x.com/VIDEO/clip.mp4">
            <embed src="https://cdn.x.com/audio/track.mp3">
            <embed src="https://vimeo.com/moogaloop.swf?clip_id=1" type="application/x-shockwave-flash">
            "#,
        );
        assert_eq!(
            result,
            vec![
                ("https://cdn.x.com/VIDEO/clip.mp4".to_string(), EmbedType::Embed),
                ("https://vimeo.com/moogaloop.swf?clip_id=1".to_string(), EmbedType::Flash),
            ]
        );
    }

    #[test]
    fn test_object_data_and_movie_param() {
        let result = found(
            r#"
            <object data="/media/video/intro.mp4" type="video/mp4"></object>
            <object type="application/x-shockwave-flash">
                <param name="Movie" value="/video/player.swf">
            </object>
            <object data="/docs/manual.pdf"></object>
            "#,
        );
        assert_eq!(
            result,
            vec![
                ("/media/video/intro.mp4".to_string(), EmbedType::Object),
                ("/video/player.swf".to_string(), EmbedType::Flash),
            ]
        );
    }

    #[test]
    fn test_flash_without_video_keyword_ignored() {
        let result = found(
            r#"
            <embed src="/ads/banner.swf">
            <object type="application/x-shockwave-flash"><param name="movie" value="/ads/promo.swf"></object>
            "#,
        );
        assert!(result.is_empty(), "{result:?}");
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("video.SWF", None, EmbedType::Embed), Some(EmbedType::Flash));
        assert_eq!(classify("videoplayer", Some(FLASH_MIME), EmbedType::Object), Some(EmbedType::Flash));
        assert_eq!(classify("banner.swf", Some(FLASH_MIME), EmbedType::Embed), None);
        assert_eq!(classify("https://youtube.com/v/abc", None, EmbedType::Embed), Some(EmbedType::Embed));
        assert_eq!(classify("banner.gif", None, EmbedType::Embed), None);
    }
}
