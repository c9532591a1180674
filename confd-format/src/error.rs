//! Error definitions for the configuration file format.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result alias used throughout the format parser.
pub type FormatResult<T> = std::result::Result<T, FormatError>;

/// A single line that matched neither a section header nor an option.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseIssue {
    /// One-based line number within the file.
    pub line: usize,
    /// The offending line exactly as read, without its line terminator.
    pub content: String,
}

impl fmt::Display for ParseIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[line {:2}]: {:?}", self.line, self.content)
    }
}

/// Errors that can occur while reading a configuration file.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The resource could not be opened or fully read.
    #[error("could not read config file `{}`: {source}", .path.display())]
    Io {
        /// Path that failed to load.
        path: PathBuf,
        /// Source I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Content appeared before the first section header.
    #[error(
        "file contains no section headers: `{}`, [line {line:2}]: {content:?}",
        .path.display()
    )]
    MissingSectionHeader {
        /// File being parsed.
        path: PathBuf,
        /// One-based line number of the offending line.
        line: usize,
        /// The offending line.
        content: String,
    },

    /// One or more lines could not be interpreted.
    #[error("file contains parsing errors: `{}`{}", .path.display(), render_issues(.issues))]
    Parsing {
        /// File being parsed.
        path: PathBuf,
        /// Every offending line, in file order.
        issues: Vec<ParseIssue>,
    },

    /// The source implementation cannot read configuration at all.
    #[error("config source cannot read `{}`: {reason}", .path.display())]
    Unsupported {
        /// Path that was requested.
        path: PathBuf,
        /// Human-readable reason for rejection.
        reason: String,
    },
}

impl FormatError {
    /// Helper to construct [`FormatError::Unsupported`] from string-like values.
    #[must_use]
    pub fn unsupported(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Unsupported {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Returns the offending lines for an aggregated parsing error.
    #[must_use]
    pub fn issues(&self) -> &[ParseIssue] {
        match self {
            Self::Parsing { issues, .. } => issues,
            _ => &[],
        }
    }
}

fn render_issues(issues: &[ParseIssue]) -> String {
    issues.iter().map(|issue| format!("\n\t{issue}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsing_error_lists_every_issue() {
        let err = FormatError::Parsing {
            path: PathBuf::from("broken.ini"),
            issues: vec![
                ParseIssue {
                    line: 3,
                    content: "garbage".into(),
                },
                ParseIssue {
                    line: 7,
                    content: "more garbage".into(),
                },
            ],
        };

        let rendered = err.to_string();
        assert!(rendered.contains("broken.ini"));
        assert!(rendered.contains("[line  3]: \"garbage\""));
        assert!(rendered.contains("[line  7]: \"more garbage\""));
        assert_eq!(err.issues().len(), 2);
    }

    #[test]
    fn non_parsing_errors_have_no_issues() {
        let err = FormatError::unsupported("a.ini", "not implemented");
        assert!(err.issues().is_empty());
        assert!(err.to_string().contains("not implemented"));
    }
}
