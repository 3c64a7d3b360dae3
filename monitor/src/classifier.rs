//! Keyword-based severity classification for log lines.

use std::fmt;

/// Keywords that mark a line as an error. Checked before [`WARNING_KEYWORDS`].
///
/// `failure` is listed alongside `failed` since neither is a substring of the
/// other.
const ERROR_KEYWORDS: [&str; 6] = [
    "error",
    "exception",
    "failed",
    "failure",
    "fatal",
    "critical",
];

/// Keywords that mark a line as a warning.
const WARNING_KEYWORDS: [&str; 3] = ["warn", "warning", "deprecated"];

/// Severity assigned to a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Severity {
    #[default]
    Normal,
    Warning,
    Error,
}

impl Severity {
    /// Prefix printed in front of the line text.
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Normal => "",
            Self::Warning => "WARN: ",
            Self::Error => "ERROR: ",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Normal => "normal",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// Classifies a line by case-insensitive substring match.
///
/// Error keywords win over warning keywords, so a line mentioning both is an
/// error.
#[must_use]
pub fn classify(line: &str) -> Severity {
    let lowered = line.to_lowercase();

    if ERROR_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
        Severity::Error
    } else if WARNING_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
        Severity::Warning
    } else {
        Severity::Normal
    }
}
