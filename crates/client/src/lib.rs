//! Video and article extraction for vidscout.
//!
//! This crate provides the network-facing half of the pipeline: the HTTP
//! client seam, HTML parsing, video detection, article extraction,
//! normalization, cross-referencing and export. The entry point is
//! [`Analyzer`], which turns a target URL into a [`vidscout_core::SiteAnalysis`].

pub mod analyze;
pub mod export;
pub mod fetch;
pub mod html;

mod detect;
mod extract;
mod normalize;
mod xref;

pub use analyze::{AnalysisStage, Analyzer, AnalyzerConfig, FetchClientFactory, HttpClientFactory, ValidationResult};
pub use export::{ExportFormat, export, export_file_name};
pub use fetch::{
    FetchClient, FetchConfig, FetchResponse, HttpClient, ProbeResponse, StaticHttpClient, canonicalize, resolve,
    with_default_scheme,
};
pub use html::HtmlDocument;

pub use tokio_util::sync::CancellationToken;
