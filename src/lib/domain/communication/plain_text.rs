//! Plain text alternative for HTML bodies

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TAG_REGEX: Regex = Regex::new(r"<[^>]+>").unwrap();
}

/// Derives a plain text body from an HTML body by stripping every tag.
///
/// This is a best-effort fallback, not an HTML-to-text conversion: entities
/// are left encoded, and literal angle brackets in text (`a < b > c`) are
/// treated as markup and removed.
pub fn strip_tags(html: &str) -> String {
    TAG_REGEX.replace_all(html, "").into_owned()
}
