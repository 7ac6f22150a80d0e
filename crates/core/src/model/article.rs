use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::article_id;

/// Highest discovery position still considered visible without scrolling.
pub const ABOVE_FOLD_MAX_POSITION: usize = 3;

/// Where a video sits inside an article. Links to the video by id only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoPosition {
    pub video_id: String,
    /// 0-based discovery order within the article.
    pub position: usize,
    pub xpath: Option<String>,
    pub parent_tag: Option<String>,
    pub surrounding_text: Option<String>,
    pub caption: Option<String>,
    pub description: Option<String>,
    pub section_heading: Option<String>,
    pub is_above_fold: bool,
}

impl VideoPosition {
    pub fn new(video_id: impl Into<String>, position: usize) -> Self {
        Self {
            video_id: video_id.into(),
            position,
            xpath: None,
            parent_tag: None,
            surrounding_text: None,
            caption: None,
            description: None,
            section_heading: None,
            is_above_fold: position <= ABOVE_FOLD_MAX_POSITION,
        }
    }
}

/// An article-like region of a page and the videos it contains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub url: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
    pub content: Option<String>,
    pub video_positions: Vec<VideoPosition>,
}

impl Article {
    /// Create an empty article; the id is derived from `url` and `title`.
    pub fn new(url: impl Into<String>, title: Option<String>) -> Self {
        let url = url.into();
        Self {
            id: article_id(&url, title.as_deref().unwrap_or_default()),
            url,
            title,
            author: None,
            description: None,
            published_at: None,
            modified_at: None,
            content: None,
            video_positions: Vec::new(),
        }
    }

    /// Whether any position in this article points at `video_id`.
    pub fn references(&self, video_id: &str) -> bool {
        self.video_positions.iter().any(|p| p.video_id == video_id)
    }
}
