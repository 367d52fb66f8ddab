//! Heading text canonicalization.

use regex::Regex;

/// Normalize heading or anchor text for matching.
///
/// Strips a leading manual enumeration prefix ("3.", "4.2. ", "1.2.3"),
/// lowercases, and drops every character that is not a lowercase letter or
/// digit, so headings match despite formatting drift. Total and
/// deterministic; an empty result simply never matches anything.
pub fn canonicalize(text: &str) -> String {
    let prefix = Regex::new(r"^\s*\d+(\.\d+)*\.?\s*").unwrap();
    let stripped = prefix.replace(text.trim(), "");
    stripped
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}
