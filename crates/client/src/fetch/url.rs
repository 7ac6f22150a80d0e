//! URL canonicalization and resolution.
//!
//! `canonicalize` validates analysis targets; `resolve` turns the relative and
//! protocol-relative locators found in markup into absolute URLs and never fails.

/// Error type for URL canonicalization failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("missing host: {0}")]
    MissingHost(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Canonicalize an analysis target.
///
/// The input must already be absolute. Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Require an http(s) scheme and a host
/// 3. Lowercase the host
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
pub fn canonicalize(input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = url::Url::parse(trimmed).map_err(|e| UrlError::InvalidUrl(format!("{trimmed}: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    let host = parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .map(str::to_lowercase)
        .ok_or_else(|| UrlError::MissingHost(trimmed.to_string()))?;
    parsed
        .set_host(Some(&host))
        .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    parsed.set_fragment(None);

    Ok(parsed)
}

/// Default the scheme to `https://` for bare host input such as `example.com/page`.
///
/// Used by interactive callers; the pipeline itself validates strictly.
pub fn with_default_scheme(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.contains("://") || trimmed.is_empty() { trimmed.to_string() } else { format!("https://{trimmed}") }
}

/// Resolve `url` found on a page against `base_url`.
///
/// Rules, in order:
/// 1. `http://` / `https://` URLs are returned unchanged
/// 2. protocol-relative `//host/path` gets an `https:` prefix
/// 3. root-relative `/path` gets the scheme and host of the base
/// 4. anything else is joined against the base path
///
/// If the base cannot be parsed the input is returned unchanged.
pub fn resolve(url: &str, base_url: &str) -> String {
    let url = url.trim();
    let lower = url.get(..8).unwrap_or(url).to_ascii_lowercase();

    if lower.starts_with("http://") || lower.starts_with("https://") {
        return url.to_string();
    }

    if url.starts_with("//") {
        return format!("https:{url}");
    }

    let Ok(base) = url::Url::parse(base_url.trim()) else {
        return url.to_string();
    };

    if url.starts_with('/') {
        if !base.has_host() {
            return url.to_string();
        }
        return format!("{}{url}", base.origin().ascii_serialization());
    }

    match base.join(url) {
        Ok(joined) => joined.to_string(),
        Err(_) => url.to_string(),
    }
}

/// False when `url` names a scheme other than `http`/`https` (`javascript:`, `data:`, ...).
///
/// Scheme-less input passes, so relative locators and unparseable absolute
/// URLs are left for later stages to judge.
pub fn is_web_scheme(url: &str) -> bool {
    let Some((scheme, _)) = url.trim().split_once(':') else {
        return true;
    };
    let mut chars = scheme.chars();
    let is_scheme = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    !is_scheme || scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https")
}

/// Host of `url`, if it parses and has one.
pub fn host_of(url: &str) -> Option<String> {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .filter(|h| !h.is_empty())
}

/// Scheme and host (with non-default port) of `url`, e.g. `https://x.com`.
pub fn site_url(url: &url::Url) -> String {
    url.origin().ascii_serialization()
}
