use scraper::{ElementRef, Selector};
use std::sync::LazyLock;

use super::{Candidate, DetectionStrategy};
use crate::html;
use vidscout_core::EmbedType;

static IFRAME: LazyLock<Selector> = LazyLock::new(|| Selector::parse("iframe[src]").expect("invalid selector"));

/// Substrings identifying video hosting services in an iframe `src`.
const VIDEO_HOSTS: &[&str] = &["youtube", "youtu.be", "vimeo", "dailymotion", "twitch", "wistia", "jwplayer"];

/// `<iframe>` players served by a known video host.
pub(crate) struct IframeStrategy;

impl IframeStrategy {
    fn is_video_host(src: &str) -> bool {
        let src = src.to_ascii_lowercase();
        VIDEO_HOSTS.iter().any(|host| src.contains(host))
    }
}

impl DetectionStrategy for IframeStrategy {
    fn name(&self) -> &'static str {
        "iframe"
    }

    fn candidates<'a>(&self, scope: ElementRef<'a>, _base_url: &str) -> Vec<Candidate<'a>> {
        scope
            .select(&IFRAME)
            .filter_map(|iframe| {
                let src = html::attr(iframe, "src")?;
                if !Self::is_video_host(&src) {
                    return None;
                }
                let context = html::attr(iframe, "title");
                Some(Candidate {
                    element: iframe,
                    url: src,
                    embed_type: EmbedType::Iframe,
                    attributes: html::attributes(iframe),
                    context,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::HtmlDocument;

    #[test]
    fn test_known_hosts_only() {
        let doc = HtmlDocument::parse(
            r#"
            <iframe src="https://www.YouTube.com/embed/abc"></iframe>
            <iframe src="https://maps.google.com/embed?q=x"></iframe>
            <iframe src="//fast.wistia.net/embed/iframe/xyz"></iframe>
            <iframe src="https://player.twitch.tv/?channel=c"></iframe>
            "#,
        );
        let urls: Vec<String> =
            IframeStrategy.candidates(doc.root(), "https://x.com/").into_iter().map(|c| c.url).collect();
        assert_eq!(
            urls,
            vec![
                "https://www.YouTube.com/embed/abc",
                "//fast.wistia.net/embed/iframe/xyz",
                "https://player.twitch.tv/?channel=c",
            ]
        );
    }

    #[test]
    fn test_is_video_host() {
        assert!(IframeStrategy::is_video_host("https://youtu.be/abc"));
        assert!(IframeStrategy::is_video_host("https://cdn.jwplayer.com/players/abc.html"));
        assert!(!IframeStrategy::is_video_host("https://example.com/widget"));
    }
}
