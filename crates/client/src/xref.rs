//! Linking article-scoped video references to page-level `Video` records.
//!
//! A reference resolves to a video by exact id, else by matching the platform
//! video id recorded in the video's `videoId` metadata. Unresolved references
//! are dropped.

use crate::extract::{DetectedArticle, VideoReference};
use vidscout_core::{Article, Video, VideoPosition};

/// The video a reference points at, if any.
pub(crate) fn resolve_reference<'a>(reference: &VideoReference, videos: &'a [Video]) -> Option<&'a Video> {
    videos.iter().find(|video| video.id == reference.video_id).or_else(|| {
        let platform_id = reference.platform_id.as_deref()?;
        videos
            .iter()
            .find(|video| video.metadata.get("videoId").is_some_and(|id| id == platform_id))
    })
}

/// Turn detected articles into `Article`s whose positions reference `videos`.
pub(crate) fn link_articles(videos: &[Video], detected: Vec<DetectedArticle>) -> Vec<Article> {
    detected
        .into_iter()
        .map(|found| {
            let mut article = Article::new(found.url, Some(found.title));
            article.author = found.author;
            article.description = found.description;
            article.published_at = found.published_at;
            article.modified_at = found.modified_at;
            article.content = found.content;

            for reference in found.references {
                let Some(video) = resolve_reference(&reference, videos) else {
                    tracing::debug!(url = %reference.url, article = %article.id, "dropping unresolved video reference");
                    continue;
                };
                if article.references(&video.id) {
                    continue;
                }

                let mut position = VideoPosition::new(video.id.clone(), reference.position);
                position.xpath = reference.location.xpath;
                position.parent_tag = reference.location.parent_tag;
                position.surrounding_text = reference.location.surrounding_text;
                position.caption = reference.location.caption;
                position.section_heading = reference.location.section_heading;
                position.description = reference.description;
                article.video_positions.push(position);
            }

            article
        })
        .collect()
}

/// Ids of the articles that contain `video`.
pub(crate) fn related_articles(video: &Video, articles: &[Article]) -> Vec<String> {
    articles
        .iter()
        .filter(|article| article.references(&video.id))
        .map(|article| article.id.clone())
        .collect()
}
