//! Unified error types for vidscout.
//!
//! Every variant renders as `CODE: detail` so callers can surface the message
//! verbatim in error logs and CLI output.

/// Unified error type for the extraction pipeline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., an empty batch).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Malformed or unsupported URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Fetch or probe did not complete in time.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Fetch response too large.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// Transport failure or non-2xx response.
    #[error("HTTP_ERROR: {0}")]
    HttpError(String),

    /// A detected video could not be converted into a [`crate::Video`].
    #[error("NORMALIZE_FAILED: {0}")]
    NormalizeFailed(String),

    /// Serialization of an analysis failed.
    #[error("EXPORT_FAILED: {0}")]
    ExportFailed(String),

    /// The caller cancelled the operation.
    #[error("CANCELLED")]
    Cancelled,
}

impl Error {
    /// Whether the error is recovered into a `SiteAnalysis` error log rather
    /// than returned to the caller.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::InvalidUrl(_)
                | Error::FetchTimeout(_)
                | Error::FetchTooLarge(_)
                | Error::HttpError(_)
                | Error::NormalizeFailed(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ExportFailed(err.to_string())
    }
}
