//! Analysis data model.
//!
//! All types serialize with camelCase field names. The JSON shape is a stable
//! wire format consumed by external tooling; rename fields only with a version bump.

mod analysis;
mod article;
mod video;

pub use analysis::{AccessibilityInfo, SiteAnalysis, StreamingInfo, StreamingProtocol, VideoUrlDetail};
pub use article::{ABOVE_FOLD_MAX_POSITION, Article, VideoPosition};
pub use video::{EmbedType, Video, VideoFormat, url_extension};
