//! Core types and shared functionality for vidscout.
//!
//! This crate provides:
//! - The analysis data model (videos, articles, per-video details)
//! - Unified error types
//! - Configuration structures
//! - Deterministic identifiers and duplicate elimination

pub mod config;
pub mod dedupe;
pub mod error;
pub mod id;
pub mod model;

pub use config::{AppConfig, ConfigError};
pub use dedupe::{DedupKey, Deduplicator, FirstSeenDeduplicator, dedupe};
pub use error::Error;
pub use model::{
    AccessibilityInfo, Article, EmbedType, SiteAnalysis, StreamingInfo, StreamingProtocol, Video, VideoFormat,
    VideoPosition, VideoUrlDetail,
};
