use regex::Regex;
use scraper::{ElementRef, Selector};
use std::collections::BTreeMap;
use std::sync::LazyLock;

use super::{Candidate, DetectionStrategy};
use vidscout_core::EmbedType;

static INLINE_SCRIPT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script:not([src])").expect("invalid selector"));

/// `src: "..."` / `src = '...'` inside player setup code.
static SRC_ASSIGNMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bsrc\s*[:=]\s*["']([^"'\s]+)["']"#).expect("invalid regex"));

/// `videoUrl = "..."` and `video_source: '...'` style assignments.
static VIDEO_ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(?:videoUrl|video_source)\s*[:=]\s*["']([^"'\s]+)["']"#).expect("invalid regex")
});

const CONTEXT: &str = "JavaScript-rendered";

/// Video URLs assigned in inline scripts. Nothing is executed.
pub(crate) struct ScriptStrategy;

/// Whether a generic `src` value points at video: `.mp4`/`.webm` files or any URL mentioning "video".
fn looks_like_video(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    let path = lower.split(['?', '#']).next().unwrap_or_default();
    path.ends_with(".mp4") || path.ends_with(".webm") || lower.contains("video")
}

/// Video URLs in `source`, in order of appearance.
pub(crate) fn scan(source: &str) -> Vec<String> {
    let mut found: Vec<(usize, String)> = SRC_ASSIGNMENT
        .captures_iter(source)
        .filter_map(|caps| caps.get(1))
        .filter(|m| looks_like_video(m.as_str()))
        .chain(VIDEO_ASSIGNMENT.captures_iter(source).filter_map(|caps| caps.get(1)))
        .map(|m| (m.start(), m.as_str().to_string()))
        .collect();

    found.sort_by_key(|(start, _)| *start);
    found.into_iter().map(|(_, url)| url).collect()
}

impl DetectionStrategy for ScriptStrategy {
    fn name(&self) -> &'static str {
        "script"
    }

    fn candidates<'a>(&self, scope: ElementRef<'a>, _base_url: &str) -> Vec<Candidate<'a>> {
        let mut candidates = Vec::new();

        for script in scope.select(&INLINE_SCRIPT) {
            let source: String = script.text().collect();
            for url in scan(&source) {
                candidates.push(Candidate {
                    element: script,
                    url,
                    embed_type: EmbedType::Javascript,
                    attributes: BTreeMap::new(),
                    context: Some(CONTEXT.to_string()),
                });
            }
        }

        candidates
    }
}
