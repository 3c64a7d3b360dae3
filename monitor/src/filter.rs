//! Regex line filter.
//!
//! Lines that do not match are dropped before classification, so they are
//! neither printed nor counted. The search is unanchored; use `^` or `$` to
//! anchor.

use regex::Regex;

/// Compiled pattern deciding which lines are shown.
#[derive(Debug, Clone)]
pub struct LineFilter {
    regex: Regex,
}

impl LineFilter {
    /// Compiles `pattern` as a regular expression.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    /// Returns true if the pattern matches anywhere in `line`.
    pub fn matches(&self, line: &str) -> bool {
        self.regex.is_match(line)
    }

    /// Source text the filter was compiled from.
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }
}
