//! Read configuration files, conf.d style.
//!
//! Depend on this crate via `cargo add confd`. It bundles the format parser and
//! the layered configuration manager behind the `format` and `config` features;
//! enable only `format` to pull in the parser alone.

#![warn(missing_docs, clippy::pedantic)]

/// Section-based file format parser (enabled by `format` feature).
#[cfg(feature = "format")]
pub use confd_format as format;

/// Layered configuration manager (enabled by `config` feature).
#[cfg(feature = "config")]
pub use confd_config as config;

#[cfg(feature = "config")]
pub use confd_config::{ConfigError, ConfigResult, Configuration, ConfigurationBuilder, Section};
