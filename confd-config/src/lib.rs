//! Layered configuration loading, conf.d style.
//!
//! A [`Configuration`] reads one primary file, extracts its main section, and
//! folds every other section of that file plus the sections of each file in an
//! optional fragment directory into a single queryable view.

#![warn(missing_docs, clippy::pedantic)]

mod configuration;
mod error;
mod loader;
mod transform;

/// Merged configuration view and its builder.
pub use configuration::{Configuration, ConfigurationBuilder, SECTIONS_KEY};
/// Error type and result alias for configuration operations.
pub use error::{ConfigError, ConfigResult};
/// Transform hooks and the post-transform section type.
pub use transform::{Section, SectionTransform, untransformed};

pub use confd_format::RawSection;
