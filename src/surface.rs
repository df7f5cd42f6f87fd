//! The API surface value type and the line filter it is built with.
//!
//! A surface is a set of opaque signature lines produced by the extractor or
//! read back from a baseline file. Entries are compared as exact strings:
//! whitespace inside a signature is significant and no normalization is
//! applied.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

/// Lines that carry no API meaning: empty, all-whitespace, or comment-only
/// (first non-whitespace character is `#`). Indented comments count.
fn non_semantic_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(#|$)").expect("valid pattern"))
}

/// Whether a line contributes an entry to the surface.
pub fn is_semantic_line(line: &str) -> bool {
    !non_semantic_re().is_match(line)
}

/// The exported-symbol surface of one package directory: the raw bytes it was
/// parsed from plus the set of signature entries found in them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSurface {
    raw: Vec<u8>,
    entries: BTreeSet<String>,
}

impl ApiSurface {
    /// Parse extractor output or baseline file contents, dropping
    /// non-semantic lines from the entry set. The raw bytes are kept
    /// verbatim.
    pub fn parse(raw: Vec<u8>) -> Self {
        let entries = String::from_utf8_lossy(&raw)
            .lines()
            .filter(|line| is_semantic_line(line))
            .map(str::to_owned)
            .collect();
        Self { raw, entries }
    }

    /// The unfiltered bytes this surface was parsed from.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn entries(&self) -> &BTreeSet<String> {
        &self.entries
    }

    /// Two surfaces are the same public API iff their entry sets are equal,
    /// regardless of line order or interleaved comments.
    pub fn same_entries(&self, other: &ApiSurface) -> bool {
        self.entries == other.entries
    }

    pub fn into_parts(self) -> (Vec<u8>, BTreeSet<String>) {
        (self.raw, self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_comment_lines_are_not_semantic() {
        assert!(!is_semantic_line(""));
        assert!(!is_semantic_line("   "));
        assert!(!is_semantic_line("# comment"));
        assert!(!is_semantic_line("\t # indented comment"));
        assert!(is_semantic_line("func A() int"));
        assert!(is_semantic_line("type T struct, unexported: false # trailing"));
    }

    #[test]
    fn parse_filters_non_semantic_lines_but_keeps_raw() {
        let raw = b"# header\nfunc A() int\n\n  # note\nfunc B() string\n".to_vec();
        let surface = ApiSurface::parse(raw.clone());
        assert_eq!(surface.raw(), raw.as_slice());
        let entries: Vec<&str> = surface.entries().iter().map(String::as_str).collect();
        assert_eq!(entries, vec!["func A() int", "func B() string"]);
    }

    #[test]
    fn entry_equality_ignores_line_order() {
        let a = ApiSurface::parse(b"func A() int\nfunc B() string\n".to_vec());
        let b = ApiSurface::parse(b"func B() string\nfunc A() int\n".to_vec());
        assert!(a.same_entries(&b));
    }

    #[test]
    fn whitespace_inside_entries_is_significant() {
        let a = ApiSurface::parse(b"func A() int\n".to_vec());
        let b = ApiSurface::parse(b"func  A() int\n".to_vec());
        assert!(!a.same_entries(&b));
    }
}
