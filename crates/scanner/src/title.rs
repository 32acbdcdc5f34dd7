//! Title classification and normalization.
//!
//! The tracker page is uncontrolled third-party markup, so candidate text is
//! filtered through a heuristic "does this look like a task title" check
//! before being cleaned into a canonical form.

use once_cell::sync::Lazy;
use regex::Regex;

/// Normalized titles are capped at this many characters.
pub const MAX_TITLE_LEN: usize = 200;

const MIN_CANDIDATE_CHARS: usize = 5;
const MAX_CANDIDATE_CHARS: usize = 300;

/// Leading "12. " style numbering.
static ORDINAL_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\s*").expect("ordinal prefix regex"));

/// Common UI chrome that is never a task title.
static SKIP_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)^(home|menu|login|logout|settings|profile|search|filter|sort|edit|delete|save|cancel|submit|back|next|previous)$",
        r"(?i)^(yes|no|ok|cancel|close|open|show|hide|expand|collapse)$",
        // Only numbers, spaces, dashes, slashes
        r"^[\d\s\-/]+$",
        // No letters at all
        r"^[^a-zA-Z]*$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("skip pattern regex"))
    .collect()
});

/// Whether `text` looks like a task title: plausible length and not a known
/// UI chrome pattern.
pub fn is_likely_title(text: &str) -> bool {
    let len = text.chars().count();
    if len < MIN_CANDIDATE_CHARS || len > MAX_CANDIDATE_CHARS {
        return false;
    }
    !SKIP_PATTERNS.iter().any(|p| p.is_match(text))
}

/// Case-insensitive containment check for the exclusion marker.
pub fn contains_marker(text: &str, marker: &str) -> bool {
    if marker.is_empty() {
        return false;
    }
    text.to_lowercase().contains(&marker.to_lowercase())
}

/// Normalize raw element text into a canonical title: strip leading
/// numbering, collapse all whitespace to single spaces, trim, and cap the
/// length. The transform is idempotent.
pub fn clean_title(text: &str) -> String {
    let mut stripped = text.trim_start();
    // Strip repeated numbering so re-cleaning a cleaned title is a no-op.
    while let Some(m) = ORDINAL_PREFIX.find(stripped) {
        stripped = &stripped[m.end()..];
    }

    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    let capped: String = collapsed.chars().take(MAX_TITLE_LEN).collect();
    capped.trim_end().to_string()
}

/// Full candidate pipeline: reject non-titles and marker-carrying text,
/// normalize the rest. Returns `None` for rejected candidates.
pub fn classify(text: &str, contacted_marker: &str) -> Option<String> {
    let text = text.trim();
    if !is_likely_title(text) {
        return None;
    }
    if contains_marker(text, contacted_marker) {
        return None;
    }
    let title = clean_title(text);
    if title.is_empty() {
        return None;
    }
    Some(title)
}
