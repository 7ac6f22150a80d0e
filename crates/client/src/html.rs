//! Queryable HTML documents built on `scraper`.
//!
//! Parsing never fails: html5ever repairs unclosed tags and missing quotes, and
//! empty input yields an empty `<html><head></head><body></body></html>` tree.
//! All selection helpers take an `ElementRef` scope so detectors can run over a
//! whole document or a single container with the same code.

use std::collections::BTreeMap;

use scraper::{ElementRef, Html, Node, Selector};

/// Tags whose text never counts as visible content.
const HIDDEN_TEXT_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// A parsed HTML document.
pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    pub fn parse(source: &str) -> Self {
        Self { html: Html::parse_document(source) }
    }

    /// The `<html>` element, usable as a whole-document scope.
    pub fn root(&self) -> ElementRef<'_> {
        self.html.root_element()
    }

    /// Elements matching a CSS selector; an invalid selector matches nothing.
    pub fn select(&self, css: &str) -> Vec<ElementRef<'_>> {
        select_in(self.root(), css)
    }

    /// All elements with the given tag name.
    pub fn select_tag(&self, tag: &str) -> Vec<ElementRef<'_>> {
        self.select(tag)
    }

    /// `tag` elements whose `attr` value contains `needle` (case-insensitive).
    pub fn select_attr_contains(&self, tag: &str, attr: &str, needle: &str) -> Vec<ElementRef<'_>> {
        self.select_tag(tag)
            .into_iter()
            .filter(|el| attr_contains(*el, attr, needle))
            .collect()
    }

    /// Text of the document `<title>`.
    pub fn title(&self) -> Option<String> {
        self.select("title")
            .into_iter()
            .map(inner_text)
            .find(|t| !t.is_empty())
    }

    /// `content` of the first `<meta>` whose name or property contains `needle`.
    pub fn meta_content(&self, needle: &str) -> Option<String> {
        self.meta_entries()
            .into_iter()
            .find(|(key, _)| key.contains(&needle.to_ascii_lowercase()))
            .map(|(_, content)| content)
    }

    /// `(lowercased name-or-property, content)` for every `<meta>` with non-empty content.
    pub fn meta_entries(&self) -> Vec<(String, String)> {
        self.select("meta")
            .into_iter()
            .filter_map(|meta| {
                let el = meta.value();
                let key = el.attr("name").or_else(|| el.attr("property")).or_else(|| el.attr("itemprop"))?;
                let content = el.attr("content")?.trim();
                if content.is_empty() { None } else { Some((key.to_ascii_lowercase(), content.to_string())) }
            })
            .collect()
    }
}

/// Elements below `scope` matching `css`, in document order.
pub fn select_in<'a>(scope: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => scope.select(&selector).collect(),
        Err(e) => {
            tracing::debug!("ignoring invalid selector {:?}: {}", css, e);
            Vec::new()
        }
    }
}

/// Whether the element's `attr` contains `needle`, ignoring ASCII case.
pub fn attr_contains(el: ElementRef<'_>, attr: &str, needle: &str) -> bool {
    el.value()
        .attr(attr)
        .is_some_and(|v| v.to_ascii_lowercase().contains(&needle.to_ascii_lowercase()))
}

/// Non-empty attribute value, trimmed.
pub fn attr(el: ElementRef<'_>, name: &str) -> Option<String> {
    el.value()
        .attr(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// All attributes of the element, keyed by lowercased name.
pub fn attributes(el: ElementRef<'_>) -> BTreeMap<String, String> {
    el.value()
        .attrs()
        .map(|(name, value)| (name.to_ascii_lowercase(), value.trim().to_string()))
        .collect()
}

/// All descendant text, whitespace-collapsed.
pub fn inner_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

/// Descendant text outside script/style blocks, whitespace-collapsed.
pub fn visible_text(el: ElementRef<'_>) -> String {
    let mut parts = Vec::new();
    for node in el.descendants() {
        let Node::Text(text) = node.value() else { continue };
        let hidden = node
            .ancestors()
            .filter_map(ElementRef::wrap)
            .take_while(|ancestor| ancestor.id() != el.id())
            .any(|ancestor| HIDDEN_TEXT_TAGS.contains(&ancestor.value().name()));
        if !hidden {
            parts.push(&**text);
        }
    }
    collapse_whitespace(&parts.join(" "))
}

/// The element serialized back to markup, including itself.
pub fn outer_html(el: ElementRef<'_>) -> String {
    el.html()
}

/// Tag name of the enclosing element.
pub fn parent_tag(el: ElementRef<'_>) -> Option<String> {
    el.parent()
        .and_then(ElementRef::wrap)
        .map(|parent| parent.value().name().to_string())
}

/// XPath-like location such as `/html/body/div[2]/video`.
///
/// Same-name siblings get a 1-based index; unique children are bare.
pub fn element_path(el: ElementRef<'_>) -> String {
    let mut segments = Vec::new();
    let mut current = Some(el);

    while let Some(element) = current {
        let name = element.value().name();
        let same_name = |sibling: &ElementRef<'_>| sibling.value().name() == name;
        let before = element.prev_siblings().filter_map(ElementRef::wrap).filter(same_name).count();
        let after = element.next_siblings().filter_map(ElementRef::wrap).filter(same_name).count();

        if before + after > 0 {
            segments.push(format!("{}[{}]", name, before + 1));
        } else {
            segments.push(name.to_string());
        }
        current = element.parent().and_then(ElementRef::wrap);
    }

    segments.reverse();
    format!("/{}", segments.join("/"))
}

/// Whether `ancestor` strictly contains `el`.
pub fn is_ancestor(ancestor: ElementRef<'_>, el: ElementRef<'_>) -> bool {
    el.ancestors().any(|node| node.id() == ancestor.id())
}

pub fn is_heading(el: ElementRef<'_>) -> bool {
    matches!(el.value().name(), "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to at most `max` characters on a char boundary.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", text[..idx].trim_end()),
        None => text.to_string(),
    }
}
