//! Order-preserving duplicate elimination.
//!
//! Two records are duplicates when they share an id OR a canonical key
//! (a URL). The first occurrence wins and relative order is kept.

use std::collections::HashSet;

use crate::model::{Article, Video, VideoUrlDetail};

/// Identity of a record for duplicate detection.
pub trait DedupKey {
    fn dedup_id(&self) -> &str;
    fn dedup_url(&self) -> &str;
}

impl DedupKey for Video {
    fn dedup_id(&self) -> &str {
        &self.id
    }

    fn dedup_url(&self) -> &str {
        &self.url
    }
}

impl DedupKey for Article {
    fn dedup_id(&self) -> &str {
        &self.id
    }

    fn dedup_url(&self) -> &str {
        &self.url
    }
}

impl DedupKey for VideoUrlDetail {
    fn dedup_id(&self) -> &str {
        &self.id
    }

    fn dedup_url(&self) -> &str {
        &self.original_url
    }
}

/// Remove duplicates from `items` without mutating the input.
pub fn dedupe<T: DedupKey + Clone>(items: &[T]) -> Vec<T> {
    let mut seen_ids: HashSet<&str> = HashSet::new();
    let mut seen_urls: HashSet<&str> = HashSet::new();
    let mut unique = Vec::with_capacity(items.len());

    for item in items {
        let id = item.dedup_id();
        let url = item.dedup_url();
        if seen_ids.contains(id) || seen_urls.contains(url) {
            continue;
        }
        seen_ids.insert(id);
        seen_urls.insert(url);
        unique.push(item.clone());
    }

    unique
}

/// Pluggable duplicate detection for the analysis pipeline.
pub trait Deduplicator: Send + Sync {
    fn videos(&self, videos: &[Video]) -> Vec<Video>;
    fn articles(&self, articles: &[Article]) -> Vec<Article>;
    fn details(&self, details: &[VideoUrlDetail]) -> Vec<VideoUrlDetail>;
}

/// Default deduplicator: first occurrence by id or URL wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstSeenDeduplicator;

impl Deduplicator for FirstSeenDeduplicator {
    fn videos(&self, videos: &[Video]) -> Vec<Video> {
        dedupe(videos)
    }

    fn articles(&self, articles: &[Article]) -> Vec<Article> {
        dedupe(articles)
    }

    fn details(&self, details: &[VideoUrlDetail]) -> Vec<VideoUrlDetail> {
        dedupe(details)
    }
}
