//! Line-oriented parser for sectioned `key = value` files.
//!
//! The grammar is deliberately tolerant:
//!
//! - blank lines and lines starting with `#` or `;` are comments, as is a line
//!   whose first word is `rem` (no leading whitespace);
//! - `[name]` opens a section, re-opening a known name accumulates into it;
//! - `key = value` and `key: value` set an option, keys are case-folded;
//! - an indented line continues the previous option's value;
//! - `;` starts an inline comment in a value only when preceded by whitespace.
//!
//! Unrecognized lines do not stop the scan. They are collected and reported
//! together once the whole file has been read.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{FormatError, FormatResult, ParseIssue};
use crate::section::{RawSection, SectionSet, normalize_key};
use crate::source::ConfigSource;

/// Default [`ConfigSource`] implementation for the INI-like format.
#[derive(Debug, Clone, Copy, Default)]
pub struct IniParser;

impl IniParser {
    /// Creates a new parser.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Parses already loaded text. `path` is used for error reporting only.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::MissingSectionHeader`] as soon as content appears
    /// before any header, and [`FormatError::Parsing`] after the full pass when
    /// any line matched neither a header nor an option.
    pub fn parse_str(
        &self,
        text: &str,
        path: &Path,
        defaults: &RawSection,
    ) -> FormatResult<SectionSet> {
        let mut set = SectionSet::with_defaults(defaults);
        let mut section: Option<String> = None;
        let mut option: Option<String> = None;
        let mut issues = Vec::new();

        for (index, line) in text.lines().enumerate() {
            let lineno = index + 1;

            if is_comment(line) {
                continue;
            }

            if line.starts_with(char::is_whitespace) {
                if let (Some(name), Some(key)) = (section.as_deref(), option.as_deref()) {
                    let value = line.trim();
                    if !value.is_empty() {
                        if let Some(current) = set.open(name).get_mut(key) {
                            current.push('\n');
                            current.push_str(value);
                        }
                    }
                    continue;
                }
            }

            if let Some(name) = section_header(line) {
                set.open(name);
                section = Some(name.to_owned());
                option = None;
                continue;
            }

            let Some(name) = section.as_deref() else {
                return Err(FormatError::MissingSectionHeader {
                    path: path.to_path_buf(),
                    line: lineno,
                    content: line.to_owned(),
                });
            };

            match option_line(line) {
                Some((key, value)) => {
                    let key = normalize_key(key);
                    set.open(name).insert(key.clone(), value);
                    option = Some(key);
                }
                None => issues.push(ParseIssue {
                    line: lineno,
                    content: line.to_owned(),
                }),
            }
        }

        if !issues.is_empty() {
            return Err(FormatError::Parsing {
                path: path.to_path_buf(),
                issues,
            });
        }

        debug!(path = %path.display(), sections = set.len(), "parsed config file");
        Ok(set)
    }
}

impl ConfigSource for IniParser {
    fn read(&self, path: &Path, defaults: &RawSection) -> FormatResult<SectionSet> {
        let text = fs::read_to_string(path).map_err(|source| FormatError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.parse_str(&text, path, defaults)
    }
}

fn is_comment(line: &str) -> bool {
    if line.trim().is_empty() || line.starts_with(['#', ';']) {
        return true;
    }
    line.starts_with(['r', 'R'])
        && line
            .split_whitespace()
            .next()
            .is_some_and(|word| word.eq_ignore_ascii_case("rem"))
}

/// Returns the bracketed name when the line, minus any `;` comment, is a header.
fn section_header(line: &str) -> Option<&str> {
    let value = line.split(';').next().unwrap_or(line).trim();
    if value.len() > 2 && value.starts_with('[') && value.ends_with(']') {
        Some(&value[1..value.len() - 1])
    } else {
        None
    }
}

/// Splits `key <sep> value` on the first `:` or `=`.
fn option_line(line: &str) -> Option<(&str, String)> {
    let first = line.chars().next()?;
    if first.is_whitespace() || first == ':' || first == '=' {
        return None;
    }

    let separator = line.find([':', '='])?;
    let key = line[..separator].trim_end();
    let mut value = line[separator + 1..].trim_start();

    // A `;` at the very start of the value is kept, never a comment.
    if let Some(pos) = value.find(';') {
        if value[..pos].ends_with(char::is_whitespace) {
            value = &value[..pos];
        }
    }

    let value = value.trim();
    let value = if value == "\"\"" { "" } else { value };
    Some((key, value.to_owned()))
}
