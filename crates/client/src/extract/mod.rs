//! Article extraction.
//!
//! Candidate containers are `<article>` elements, then `<div>`s whose class
//! mentions "article", "post" or "entry". A candidate holding two or more
//! separate candidates is a listing and is skipped in favour of its entries;
//! otherwise a candidate nested in (or wrapping) one already accepted is
//! skipped. Pages without any candidate are treated as a single article
//! covering the whole document.

mod date;

use chrono::{DateTime, Utc};
use scraper::{ElementRef, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::detect::{ElementContext, VideoDetector};
use crate::fetch::{is_web_scheme, resolve};
use crate::html::{self, HtmlDocument};
use crate::normalize::platform_video_id;
use vidscout_core::id::video_id;

use date::{find_date_in_text, parse_date};

static HEADING: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1, h2, h3, h4, h5, h6").expect("invalid selector"));
static TIME: LazyLock<Selector> = LazyLock::new(|| Selector::parse("time[datetime]").expect("invalid selector"));
static AUTHOR_HINT: LazyLock<Selector> = LazyLock::new(|| Selector::parse("[class], [rel]").expect("invalid selector"));
static PERMALINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[rel~=bookmark][href]").expect("invalid selector"));
static LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").expect("invalid selector"));
static CANONICAL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("link[rel=canonical][href]").expect("invalid selector"));
static PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p").expect("invalid selector"));

/// Class substrings marking a `<div>` as an article container, in priority order.
const CONTAINER_CLASS_HINTS: &[&str] = &["article", "post", "entry"];

const UNTITLED: &str = "Untitled";

/// Longest description kept, in characters.
const DESCRIPTION_MAX: usize = 300;

/// A video found inside an article container, not yet linked to a `Video`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct VideoReference {
    /// Id the page-wide scan assigns to the same resolved URL.
    pub video_id: String,
    /// Id of the video on its hosting platform, when recognizable.
    pub platform_id: Option<String>,
    pub url: String,
    /// 0-based discovery order inside the container.
    pub position: usize,
    pub location: ElementContext,
    pub description: Option<String>,
}

/// An article-like region before cross-referencing.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DetectedArticle {
    pub url: String,
    pub title: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
    pub content: Option<String>,
    pub references: Vec<VideoReference>,
}

/// Finds articles and the videos inside each.
#[derive(Default)]
pub(crate) struct ArticleExtractor {
    detector: VideoDetector,
}

impl ArticleExtractor {
    pub fn extract(&self, doc: &HtmlDocument, base_url: &str) -> Vec<DetectedArticle> {
        let containers = candidate_containers(doc);

        let articles: Vec<DetectedArticle> = if containers.is_empty() {
            tracing::debug!("no article containers, treating whole document as one article");
            vec![self.extract_one(doc, doc.root(), base_url, true)]
        } else {
            containers
                .into_iter()
                .map(|container| self.extract_one(doc, container, base_url, false))
                .collect()
        };

        let mut seen = HashSet::new();
        articles
            .into_iter()
            .filter(|article| seen.insert((article.url.clone(), article.title.clone())))
            .collect()
    }

    fn extract_one(
        &self, doc: &HtmlDocument, scope: ElementRef<'_>, base_url: &str, whole_document: bool,
    ) -> DetectedArticle {
        let title = first_heading(scope)
            .or_else(|| doc.title())
            .unwrap_or_else(|| UNTITLED.to_string());

        let url = if whole_document { canonical_link(doc, base_url) } else { permalink(scope, base_url) }
            .unwrap_or_else(|| base_url.to_string());

        let description = whole_document
            .then(|| doc.meta_content("description"))
            .flatten()
            .or_else(|| first_paragraph(scope))
            .map(|text| html::truncate_chars(&text, DESCRIPTION_MAX));

        let content = Some(html::visible_text(scope)).filter(|text| !text.is_empty());

        let references = self
            .detector
            .detect_in(scope, base_url)
            .into_iter()
            .map(|video| VideoReference {
                video_id: video_id(&video.url),
                platform_id: platform_video_id(&video.url),
                description: video.context,
                position: video.position,
                location: video.location,
                url: video.url,
            })
            .collect();

        DetectedArticle {
            url,
            title,
            author: author(doc, scope),
            description,
            published_at: published_date(doc, scope),
            modified_at: modified_date(doc),
            content,
            references,
        }
    }
}

fn candidate_containers(doc: &HtmlDocument) -> Vec<ElementRef<'_>> {
    let pools = std::iter::once(doc.select_tag("article")).chain(
        CONTAINER_CLASS_HINTS
            .iter()
            .map(|hint| doc.select_attr_contains("div", "class", hint)),
    );

    let mut seen = HashSet::new();
    let candidates: Vec<ElementRef<'_>> = pools.flatten().filter(|el| seen.insert(el.id())).collect();

    let mut accepted: Vec<ElementRef<'_>> = Vec::new();
    for &candidate in &candidates {
        if is_listing(candidate, &candidates) {
            continue;
        }
        let overlaps = accepted
            .iter()
            .any(|kept| html::is_ancestor(*kept, candidate) || html::is_ancestor(candidate, *kept));
        if !overlaps {
            accepted.push(candidate);
        }
    }
    accepted
}

/// Whether `el` holds at least two candidates that are not nested in one another.
fn is_listing(el: ElementRef<'_>, candidates: &[ElementRef<'_>]) -> bool {
    let inner: Vec<ElementRef<'_>> = candidates.iter().copied().filter(|c| html::is_ancestor(el, *c)).collect();
    inner
        .iter()
        .filter(|c| !inner.iter().any(|outer| html::is_ancestor(*outer, **c)))
        .count()
        >= 2
}

fn first_heading(scope: ElementRef<'_>) -> Option<String> {
    scope
        .select(&HEADING)
        .map(html::inner_text)
        .find(|text| !text.is_empty())
}

fn first_paragraph(scope: ElementRef<'_>) -> Option<String> {
    scope
        .select(&PARAGRAPH)
        .map(html::visible_text)
        .find(|text| !text.is_empty())
}

fn author(doc: &HtmlDocument, scope: ElementRef<'_>) -> Option<String> {
    scope
        .select(&AUTHOR_HINT)
        .filter(|el| html::attr_contains(*el, "class", "author") || html::attr_contains(*el, "rel", "author"))
        .map(html::visible_text)
        .find(|text| !text.is_empty())
        .or_else(|| doc.meta_content("author"))
}

fn published_date(doc: &HtmlDocument, scope: ElementRef<'_>) -> Option<DateTime<Utc>> {
    scope
        .select(&TIME)
        .filter_map(|time| time.value().attr("datetime"))
        .find_map(parse_date)
        .or_else(|| {
            doc.meta_entries()
                .into_iter()
                .filter(|(key, _)| (key.contains("date") || key.contains("published")) && !key.contains("modified"))
                .find_map(|(_, content)| parse_date(&content))
        })
        .or_else(|| find_date_in_text(&html::visible_text(scope)))
}

fn modified_date(doc: &HtmlDocument) -> Option<DateTime<Utc>> {
    doc.meta_entries()
        .into_iter()
        .filter(|(key, _)| key.contains("modified"))
        .find_map(|(_, content)| parse_date(&content))
}

/// `rel=bookmark` link, else the first link inside a heading.
fn permalink(scope: ElementRef<'_>, base_url: &str) -> Option<String> {
    let bookmark = scope
        .select(&PERMALINK)
        .filter_map(|a| html::attr(a, "href"))
        .find(|href| is_web_scheme(href));
    let heading_link = || {
        scope
            .select(&HEADING)
            .flat_map(|heading| heading.select(&LINK).collect::<Vec<_>>())
            .filter_map(|a| html::attr(a, "href"))
            .find(|href| !href.starts_with('#') && is_web_scheme(href))
    };

    bookmark.or_else(heading_link).map(|href| resolve(&href, base_url))
}

fn canonical_link(doc: &HtmlDocument, base_url: &str) -> Option<String> {
    doc.root()
        .select(&CANONICAL)
        .filter_map(|link| html::attr(link, "href"))
        .find(|href| is_web_scheme(href))
        .map(|href| resolve(&href, base_url))
}
