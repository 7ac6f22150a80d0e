//! Video detection over parsed HTML.
//!
//! Four independent strategies each report candidate elements; the detector
//! resolves their URLs against the page base, drops blanks, and keeps the first
//! occurrence of every resolved URL.
//!
//! Strategies run in a fixed order:
//! 1. `<video>` / `<source>`
//! 2. `<iframe>` embeds from known hosts
//! 3. `<embed>` / `<object>` plugin tags
//! 4. inline `<script>` text patterns

mod embed;
mod html5;
mod iframe;
mod script;

use scraper::ElementRef;
use std::collections::{BTreeMap, HashSet};

use crate::fetch::{is_web_scheme, resolve};
use crate::html::{self, HtmlDocument};
use vidscout_core::EmbedType;

pub(crate) use embed::EmbedObjectStrategy;
pub(crate) use html5::Html5Strategy;
pub(crate) use iframe::IframeStrategy;
pub(crate) use script::ScriptStrategy;

/// Longest surrounding-text excerpt kept per video, in characters.
const SURROUNDING_TEXT_MAX: usize = 200;

/// Where a detected element sits in the document.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ElementContext {
    pub xpath: Option<String>,
    pub parent_tag: Option<String>,
    pub surrounding_text: Option<String>,
    pub caption: Option<String>,
    pub section_heading: Option<String>,
}

impl ElementContext {
    fn of(element: ElementRef<'_>, scope: ElementRef<'_>) -> Self {
        let surrounding_text = element
            .parent()
            .and_then(ElementRef::wrap)
            .map(html::visible_text)
            .filter(|text| !text.is_empty())
            .map(|text| html::truncate_chars(&text, SURROUNDING_TEXT_MAX));

        Self {
            xpath: Some(html::element_path(element)),
            parent_tag: html::parent_tag(element),
            surrounding_text,
            caption: figure_caption(element),
            section_heading: preceding_heading(element, scope),
        }
    }
}

/// `figcaption` text of the nearest enclosing `<figure>`.
fn figure_caption(element: ElementRef<'_>) -> Option<String> {
    let figure = element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| ancestor.value().name() == "figure")?;

    html::select_in(figure, "figcaption")
        .into_iter()
        .map(html::inner_text)
        .find(|text| !text.is_empty())
}

/// Text of the last non-empty heading before `element` in document order, within `scope`.
fn preceding_heading(element: ElementRef<'_>, scope: ElementRef<'_>) -> Option<String> {
    let mut last = None;
    for node in scope.descendants() {
        if node.id() == element.id() {
            return last;
        }
        if let Some(heading) = ElementRef::wrap(node)
            && html::is_heading(heading)
        {
            let text = html::inner_text(heading);
            if !text.is_empty() {
                last = Some(text);
            }
        }
    }
    None
}

/// A raw video found in markup, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DetectedVideo {
    /// Absolute URL after resolution against `base_url`.
    pub url: String,
    /// Page URL the video was found on.
    pub base_url: String,
    pub embed_type: EmbedType,
    /// Tag attributes, names lowercased.
    pub attributes: BTreeMap<String, String>,
    pub context: Option<String>,
    /// 0-based discovery order within the scanned scope.
    pub position: usize,
    pub location: ElementContext,
}

/// One element a strategy believes embeds a video. `url` is still unresolved.
pub(crate) struct Candidate<'a> {
    pub element: ElementRef<'a>,
    pub url: String,
    pub embed_type: EmbedType,
    pub attributes: BTreeMap<String, String>,
    pub context: Option<String>,
}

/// A single way of spotting videos in markup.
pub(crate) trait DetectionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Candidates below `scope`, in document order.
    fn candidates<'a>(&self, scope: ElementRef<'a>, base_url: &str) -> Vec<Candidate<'a>>;
}

/// Runs every strategy and merges their findings.
pub(crate) struct VideoDetector {
    strategies: Vec<Box<dyn DetectionStrategy>>,
}

impl Default for VideoDetector {
    fn default() -> Self {
        Self::new(vec![
            Box::new(Html5Strategy),
            Box::new(IframeStrategy),
            Box::new(EmbedObjectStrategy),
            Box::new(ScriptStrategy),
        ])
    }
}

impl VideoDetector {
    pub fn new(strategies: Vec<Box<dyn DetectionStrategy>>) -> Self {
        Self { strategies }
    }

    /// Videos anywhere in the document.
    pub fn detect(&self, doc: &HtmlDocument, base_url: &str) -> Vec<DetectedVideo> {
        self.detect_in(doc.root(), base_url)
    }

    /// Videos below `scope`, deduplicated by resolved URL.
    pub fn detect_in(&self, scope: ElementRef<'_>, base_url: &str) -> Vec<DetectedVideo> {
        let mut seen = HashSet::new();
        let mut videos = Vec::new();

        for strategy in &self.strategies {
            let mut found = 0usize;
            for candidate in strategy.candidates(scope, base_url) {
                let raw = candidate.url.trim();
                if raw.is_empty() {
                    continue;
                }

                let url = resolve(raw, base_url);
                if !is_web_scheme(&url) {
                    tracing::debug!(strategy = strategy.name(), "skipping non-web video URL {:?}", url);
                    continue;
                }
                if !seen.insert(url.clone()) {
                    continue;
                }

                found += 1;
                videos.push(DetectedVideo {
                    url,
                    base_url: base_url.to_string(),
                    embed_type: candidate.embed_type,
                    attributes: candidate.attributes,
                    context: candidate.context,
                    position: videos.len(),
                    location: ElementContext::of(candidate.element, scope),
                });
            }

            if found > 0 {
                tracing::debug!(strategy = strategy.name(), found, "video candidates accepted");
            }
        }

        videos
    }
}
