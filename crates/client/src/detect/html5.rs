use scraper::{ElementRef, Selector};
use std::sync::LazyLock;

use super::{Candidate, DetectionStrategy};
use crate::fetch::resolve;
use crate::html;
use vidscout_core::EmbedType;

static VIDEO: LazyLock<Selector> = LazyLock::new(|| Selector::parse("video").expect("invalid selector"));
static SOURCE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("source").expect("invalid selector"));

/// Native `<video>` elements: the tag's own `src`, then every `<source src>` child.
pub(crate) struct Html5Strategy;

impl DetectionStrategy for Html5Strategy {
    fn name(&self) -> &'static str {
        "html5"
    }

    fn candidates<'a>(&self, scope: ElementRef<'a>, base_url: &str) -> Vec<Candidate<'a>> {
        let mut candidates = Vec::new();

        for video in scope.select(&VIDEO) {
            let video_attrs = html::attributes(video);
            let poster = html::attr(video, "poster").map(|poster| resolve(&poster, base_url));

            if let Some(src) = html::attr(video, "src") {
                candidates.push(Candidate {
                    element: video,
                    url: src,
                    embed_type: EmbedType::Html5,
                    attributes: video_attrs.clone(),
                    context: poster.clone(),
                });
            }

            for source in video.select(&SOURCE) {
                let Some(src) = html::attr(source, "src") else { continue };
                let mut attributes = video_attrs.clone();
                attributes.extend(html::attributes(source));
                candidates.push(Candidate {
                    element: video,
                    url: src,
                    embed_type: EmbedType::Html5,
                    attributes,
                    context: poster.clone(),
                });
            }
        }

        candidates
    }
}
