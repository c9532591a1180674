//! Post-merge transform hooks.

use std::collections::BTreeMap;

use confd_format::RawSection;
use serde_json::Value;

/// Options of a section after its transform has run.
pub type Section = BTreeMap<String, Value>;

/// Converts a section's merged string options into their final values.
///
/// Any `Fn(RawSection) -> anyhow::Result<Section>` implements this trait, so
/// plain functions and closures can be handed to the builder directly.
pub trait SectionTransform: Send + Sync {
    /// Transforms one section.
    ///
    /// # Errors
    ///
    /// Whatever the implementation reports; it reaches the caller of
    /// [`Configuration::parse`](crate::Configuration::parse) untouched as the
    /// source of [`ConfigError::Transform`](crate::ConfigError::Transform).
    fn apply(&self, options: RawSection) -> anyhow::Result<Section>;
}

impl<F> SectionTransform for F
where
    F: Fn(RawSection) -> anyhow::Result<Section> + Send + Sync,
{
    fn apply(&self, options: RawSection) -> anyhow::Result<Section> {
        self(options)
    }
}

/// Carries string options over unchanged when no transform is configured.
#[must_use]
pub fn untransformed(options: RawSection) -> Section {
    options
        .into_iter()
        .map(|(key, value)| (key, Value::String(value)))
        .collect()
}
