//! Ordered collection of parsed sections.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Key/value options of a single section before any transform is applied.
pub type RawSection = BTreeMap<String, String>;

/// Reserved header whose options seed every other section of the same file.
pub const DEFAULT_SECTION: &str = "DEFAULT";

/// Normalizes an option key so defaults and parsed keys always agree.
#[must_use]
pub fn normalize_key(key: &str) -> String {
    key.to_lowercase()
}

/// Normalizes every key of a mapping with [`normalize_key`].
#[must_use]
pub fn normalize_keys(options: &RawSection) -> RawSection {
    options
        .iter()
        .map(|(key, value)| (normalize_key(key), value.clone()))
        .collect()
}

/// Sections declared by a single file, in declaration order.
///
/// Options declared under [`DEFAULT_SECTION`] together with the caller supplied
/// defaults form a shared bucket that [`SectionSet::items`] layers beneath each
/// section.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSet {
    defaults: RawSection,
    sections: Vec<(String, RawSection)>,
}

impl SectionSet {
    /// Creates an empty set seeded with the supplied defaults.
    #[must_use]
    pub fn with_defaults(defaults: &RawSection) -> Self {
        Self {
            defaults: normalize_keys(defaults),
            sections: Vec::new(),
        }
    }

    /// Returns the number of declared sections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Returns `true` when the file declared no sections.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Returns `true` when a section with this exact name was declared.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Iterates over section names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|(name, _)| name.as_str())
    }

    /// Returns the shared defaults bucket.
    #[must_use]
    pub fn defaults(&self) -> &RawSection {
        &self.defaults
    }

    /// Returns the options declared directly under a section, without defaults.
    #[must_use]
    pub fn options(&self, name: &str) -> Option<&RawSection> {
        self.position(name).map(|index| &self.sections[index].1)
    }

    /// Returns the effective options of a section: defaults overlaid with the
    /// section's own values.
    #[must_use]
    pub fn items(&self, name: &str) -> Option<RawSection> {
        let own = self.options(name)?;
        let mut merged = self.defaults.clone();
        merged.extend(own.iter().map(|(k, v)| (k.clone(), v.clone())));
        Some(merged)
    }

    /// Returns the bucket that options for `name` should be written into,
    /// creating the section when it has not been seen yet.
    ///
    /// Re-opening a known section accumulates into it; [`DEFAULT_SECTION`]
    /// resolves to the shared defaults bucket.
    pub fn open(&mut self, name: &str) -> &mut RawSection {
        if let Some(index) = self.position(name) {
            return &mut self.sections[index].1;
        }
        if name == DEFAULT_SECTION {
            return &mut self.defaults;
        }
        self.sections.push((name.to_owned(), RawSection::new()));
        let last = self.sections.len() - 1;
        &mut self.sections[last].1
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.sections.iter().position(|(known, _)| known == name)
    }
}
