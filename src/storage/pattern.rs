//! Path patterns over `/`-separated object keys
//!
//! `*` matches any run of characters inside one path segment, `?` matches a
//! single character and `[...]` a character class. No wildcard crosses a `/`.

use crate::error::{Error, Result};
use glob::{MatchOptions, Pattern};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A compiled path pattern such as `song_data/A/A/*/*.json`
#[derive(Debug, Clone)]
pub struct PathPattern {
    pattern: Pattern,
    literal_prefix: String,
}

impl PathPattern {
    /// Compile a pattern
    pub fn new(pattern: &str) -> Result<Self> {
        let trimmed = pattern.trim_matches('/');
        if trimmed.is_empty() {
            return Err(Error::config("Empty path pattern"));
        }

        let segments: Vec<&str> = trimmed.split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(Error::config(format!(
                "Path pattern '{pattern}' contains an empty segment"
            )));
        }

        let mut literal: Vec<&str> = segments
            .iter()
            .take_while(|s| !s.contains(['*', '?', '[']))
            .copied()
            .collect();
        // The last segment names files, never a listing prefix
        if literal.len() == segments.len() {
            literal.pop();
        }

        let compiled = Pattern::new(trimmed)
            .map_err(|e| Error::config(format!("Invalid path pattern '{pattern}': {e}")))?;

        Ok(Self {
            pattern: compiled,
            literal_prefix: literal.join("/"),
        })
    }

    /// The pattern as written (without surrounding slashes)
    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }

    /// Leading directory segments free of wildcards, usable as a listing prefix
    pub fn literal_prefix(&self) -> &str {
        &self.literal_prefix
    }

    /// Check a `/`-separated relative path against the pattern
    pub fn matches(&self, path: &str) -> bool {
        self.pattern.matches_with(path.trim_matches('/'), MATCH_OPTIONS)
    }
}
