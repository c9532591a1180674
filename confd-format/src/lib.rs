//! Parser for sectioned `key = value` configuration files.
//!
//! This crate turns one file into an ordered [`SectionSet`]; merging several
//! files into a single view lives in `confd-config`.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod parser;
mod section;
mod source;

/// Error type, offending-line records and result alias.
pub use error::{FormatError, FormatResult, ParseIssue};
/// Stock parser for the INI-like grammar.
pub use parser::IniParser;
/// Parsed section containers and key normalization helpers.
pub use section::{DEFAULT_SECTION, RawSection, SectionSet, normalize_key, normalize_keys};
/// Capability implemented by anything that can load sections from a path.
pub use source::ConfigSource;
