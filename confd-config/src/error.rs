//! Error types for configuration loading and lookup.

use confd_format::FormatError;
use thiserror::Error;

/// Errors emitted while loading or querying a [`Configuration`](crate::Configuration).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The primary configuration path was empty.
    #[error("no config path specified")]
    MissingPath,
    /// A required file could not be read or parsed.
    #[error(transparent)]
    Format(#[from] FormatError),
    /// The requested section is neither the main section nor a known section.
    #[error("invalid section `{name}`")]
    UnknownSection {
        /// Name that was looked up.
        name: String,
    },
    /// A caller supplied transform failed.
    #[error("transform failed for section `{section}`: {source}")]
    Transform {
        /// Section being transformed.
        section: String,
        /// Error returned by the transform.
        #[source]
        source: anyhow::Error,
    },
}

impl ConfigError {
    /// Helper to construct lookup errors from string-like values.
    #[must_use]
    pub fn unknown_section(name: impl Into<String>) -> Self {
        Self::UnknownSection { name: name.into() }
    }
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
