//! Deterministic identifiers for discovered records.
//!
//! Ids are derived from the canonical URL (and, for articles, the title) so the
//! same video found by a page-wide scan and by an article-scoped scan always
//! receives the same id.

use sha2::{Digest, Sha256};

/// Number of hex characters kept from the digest.
const ID_HEX_LEN: usize = 16;

fn digest(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            hasher.update(b"\n");
        }
        hasher.update(part.as_bytes());
    }
    let mut hex = hex::encode(hasher.finalize());
    hex.truncate(ID_HEX_LEN);
    hex
}

/// Id for a video located at `canonical_url`.
pub fn video_id(canonical_url: &str) -> String {
    format!("vid_{}", digest(&[canonical_url]))
}

/// Id for an article identified by its URL and title.
pub fn article_id(url: &str, title: &str) -> String {
    format!("art_{}", digest(&[url, title]))
}

/// Id for a whole-site analysis run.
pub fn analysis_id(target_url: &str, analyzed_at_nanos: i64) -> String {
    format!("ana_{}", digest(&[target_url, &analyzed_at_nanos.to_string()]))
}
