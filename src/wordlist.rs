//! C2 — Wordlist Loader.
//!
//! Reads a newline-delimited path-suffix file. Blank lines are skipped.
//! A missing or unreadable file is not fatal: the scan proceeds with an
//! empty list, matching the canonical behavior from `original_source`
//! (missing wordlists never abort `main_scanner`).

use crate::config::resolve_wordlist_path;

/// Load a wordlist, returning the ordered, non-empty, trimmed lines.
///
/// No deduplication is performed — canonical behavior per spec.md §9
/// keeps duplicate suffixes so repeated hits are visible to the
/// false-positive clusterer.
pub fn load(path: &str) -> Vec<String> {
    let resolved = resolve_wordlist_path(path);
    match std::fs::read_to_string(&resolved) {
        Ok(contents) => contents
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect(),
        Err(e) => {
            tracing::warn!(path = %resolved.display(), error = %e, "wordlist file unreadable, continuing with empty list");
            Vec::new()
        }
    }
}

/// Combine two wordlists by concatenation, preserving order and
/// duplicates (canonical: no deduplication, see spec.md §9).
pub fn combine(primary: Vec<String>, secondary: Vec<String>) -> Vec<String> {
    let mut out = primary;
    out.extend(secondary);
    out
}
