//! Merged configuration view and its builder.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use confd_format::{ConfigSource, IniParser, RawSection, normalize_key};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::loader::{SectionFilter, fragment_paths, load_sections, merge_sections};
use crate::transform::{Section, SectionTransform};

/// Key under which [`Configuration::raw`] nests every non-main section.
pub const SECTIONS_KEY: &str = "sections";

/// Configuration assembled from a primary file and an optional fragment
/// directory.
///
/// The section called [`name`](Self::name) is the main block and is read from
/// the primary file only. Every other section of the primary file, plus the
/// sections of each fragment file, end up in [`sections`](Self::sections).
/// Fragments are applied in file name order and override earlier values key by
/// key.
///
/// # Examples
///
/// ```no_run
/// use confd_config::Configuration;
///
/// let conf = Configuration::builder("beaver", "/etc/beaver/beaver.conf")
///     .confd_path("/etc/beaver/conf.d")
///     .conf_ext("conf")
///     .main_defaults([("logstash_version", "1")])
///     .build()?;
///
/// let version = conf.get_or("beaver", "logstash_version", "0")?;
/// # Ok::<(), confd_config::ConfigError>(())
/// ```
#[derive(Clone)]
pub struct Configuration {
    name: String,
    path: PathBuf,
    confd_path: Option<PathBuf>,
    conf_ext: Option<String>,
    path_from_main: Option<String>,
    main_defaults: RawSection,
    section_defaults: RawSection,
    main_parser: Option<Arc<dyn SectionTransform>>,
    section_parser: Option<Arc<dyn SectionTransform>>,
    source: Arc<dyn ConfigSource>,
    main: Section,
    sections: BTreeMap<String, Section>,
    parsed: bool,
}

impl Configuration {
    /// Starts building a [`Configuration`] whose main section is `name`, read
    /// from the primary file at `path`.
    #[must_use]
    pub fn builder(name: impl Into<String>, path: impl Into<PathBuf>) -> ConfigurationBuilder {
        ConfigurationBuilder {
            name: name.into(),
            path: path.into(),
            parse: true,
            confd_path: None,
            conf_ext: None,
            path_from_main: None,
            main_defaults: RawSection::new(),
            section_defaults: RawSection::new(),
            main_parser: None,
            section_parser: None,
            source: None,
        }
    }

    /// Returns the name of the main section.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the primary file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the main section.
    #[must_use]
    pub fn main(&self) -> &Section {
        &self.main
    }

    /// Returns every non-main section.
    #[must_use]
    pub fn sections(&self) -> &BTreeMap<String, Section> {
        &self.sections
    }

    /// Returns `true` once [`parse`](Self::parse) has completed successfully.
    #[must_use]
    pub const fn is_parsed(&self) -> bool {
        self.parsed
    }

    /// Reads every file from disk and rebuilds the merged view.
    ///
    /// The previous view is replaced only when the whole load succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingPath`] for an empty primary path,
    /// [`ConfigError::Format`] when the primary file or a fragment cannot be
    /// read or parsed, and [`ConfigError::Transform`] when a transform fails.
    /// A missing or unreadable fragment directory is not an error.
    pub fn parse(&mut self) -> ConfigResult<()> {
        debug!(name = %self.name, path = %self.path.display(), "parsing configuration");

        let mut main = load_sections(
            &*self.source,
            &self.path,
            &self.main_defaults,
            self.main_parser.as_deref(),
            SectionFilter::Only(&self.name),
        )?;
        let main = main.remove(&self.name).unwrap_or_default();

        let mut sections = self.load_fragment(&self.path)?;

        if let Some(dir) = self.fragment_dir(&main) {
            for path in fragment_paths(&dir, self.conf_ext.as_deref()) {
                debug!(path = %path.display(), "merging fragment");
                let fragment = self.load_fragment(&path)?;
                merge_sections(&mut sections, fragment);
            }
        }

        debug!(
            name = %self.name,
            sections = sections.len(),
            "configuration parsed"
        );
        self.main = main;
        self.sections = sections;
        self.parsed = true;
        Ok(())
    }

    /// Returns a whole section; the main name resolves to the main section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownSection`] when the section does not exist.
    pub fn get_section(&self, section: &str) -> ConfigResult<&Section> {
        self.lookup(section)
            .ok_or_else(|| ConfigError::unknown_section(section))
    }

    /// Returns the value of `key` in `section`, or `None` when the key is unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownSection`] when the section does not exist.
    pub fn get(&self, section: &str, key: &str) -> ConfigResult<Option<&Value>> {
        let options = self.get_section(section)?;
        Ok(find_key(options, key))
    }

    /// Returns the value of `key` in `section`, or `default` when the key is
    /// unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownSection`] when the section does not exist.
    pub fn get_or(
        &self,
        section: &str,
        key: &str,
        default: impl Into<Value>,
    ) -> ConfigResult<Value> {
        Ok(self
            .get(section, key)?
            .cloned()
            .unwrap_or_else(|| default.into()))
    }

    /// Reports whether `section` exists and, when `key` is given, whether it is
    /// set there. Never fails.
    #[must_use]
    pub fn has(&self, section: &str, key: Option<&str>) -> bool {
        match (self.lookup(section), key) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(options), Some(key)) => find_key(options, key).is_some(),
        }
    }

    /// Returns the merged view as JSON.
    ///
    /// Without a section this is `{ <name>: main, "sections": { ... } }`; with
    /// one it is just that section's options.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownSection`] when the requested section does
    /// not exist.
    pub fn raw(&self, section: Option<&str>) -> ConfigResult<Value> {
        if let Some(section) = section {
            return self.get_section(section).map(section_to_value);
        }

        let sections: Map<String, Value> = self
            .sections
            .iter()
            .map(|(name, options)| (name.clone(), section_to_value(options)))
            .collect();

        let mut root = Map::new();
        root.insert(self.name.clone(), section_to_value(&self.main));
        root.insert(SECTIONS_KEY.to_owned(), Value::Object(sections));
        Ok(Value::Object(root))
    }

    fn lookup(&self, section: &str) -> Option<&Section> {
        if section == self.name {
            Some(&self.main)
        } else {
            self.sections.get(section)
        }
    }

    fn load_fragment(&self, path: &Path) -> ConfigResult<BTreeMap<String, Section>> {
        load_sections(
            &*self.source,
            path,
            &self.section_defaults,
            self.section_parser.as_deref(),
            SectionFilter::Except(&self.name),
        )
    }

    fn fragment_dir(&self, main: &Section) -> Option<PathBuf> {
        let from_main = self
            .path_from_main
            .as_deref()
            .and_then(|key| match main.get(key) {
                Some(Value::String(dir)) => Some(PathBuf::from(dir)),
                Some(other) => {
                    warn!(key, value = %other, "ignoring non-string fragment directory");
                    None
                }
                None => None,
            });

        from_main
            .or_else(|| self.confd_path.clone())
            .filter(|dir| !dir.as_os_str().is_empty())
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("confd_path", &self.confd_path)
            .field("conf_ext", &self.conf_ext)
            .field("path_from_main", &self.path_from_main)
            .field("source", &self.source)
            .field("main", &self.main)
            .field("sections", &self.sections)
            .field("parsed", &self.parsed)
            .finish_non_exhaustive()
    }
}

fn find_key<'a>(options: &'a Section, key: &str) -> Option<&'a Value> {
    options
        .get(key)
        .or_else(|| options.get(&normalize_key(key)))
}

fn section_to_value(options: &Section) -> Value {
    Value::Object(
        options
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
    )
}

fn collect_defaults<I, K, V>(defaults: I) -> RawSection
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    defaults
        .into_iter()
        .map(|(key, value)| (normalize_key(key.as_ref()), value.into()))
        .collect()
}

/// Builder for [`Configuration`].
pub struct ConfigurationBuilder {
    name: String,
    path: PathBuf,
    parse: bool,
    confd_path: Option<PathBuf>,
    conf_ext: Option<String>,
    path_from_main: Option<String>,
    main_defaults: RawSection,
    section_defaults: RawSection,
    main_parser: Option<Arc<dyn SectionTransform>>,
    section_parser: Option<Arc<dyn SectionTransform>>,
    source: Option<Arc<dyn ConfigSource>>,
}

impl ConfigurationBuilder {
    /// Chooses whether [`build`](Self::build) parses immediately. Defaults to
    /// `true`.
    #[must_use]
    pub fn parse_on_build(mut self, parse: bool) -> Self {
        self.parse = parse;
        self
    }

    /// Sets the fragment directory.
    #[must_use]
    pub fn confd_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.confd_path = Some(dir.into());
        self
    }

    /// Restricts fragments to file names ending in `ext`. A leading dot is
    /// optional; an empty extension disables the filter.
    #[must_use]
    pub fn conf_ext(mut self, ext: impl AsRef<str>) -> Self {
        let trimmed = ext.as_ref().trim_matches('.');
        self.conf_ext = (!trimmed.is_empty()).then(|| format!(".{trimmed}"));
        self
    }

    /// Reads the fragment directory from this key of the main section when it
    /// is set there, falling back to [`confd_path`](Self::confd_path).
    #[must_use]
    pub fn path_from_main(mut self, key: impl AsRef<str>) -> Self {
        self.path_from_main = Some(normalize_key(key.as_ref()));
        self
    }

    /// Replaces the seed values of the main section.
    #[must_use]
    pub fn main_defaults<I, K, V>(mut self, defaults: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        self.main_defaults = collect_defaults(defaults);
        self
    }

    /// Replaces the seed values applied to every non-main section.
    #[must_use]
    pub fn section_defaults<I, K, V>(mut self, defaults: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        self.section_defaults = collect_defaults(defaults);
        self
    }

    /// Sets the transform applied to the main section.
    #[must_use]
    pub fn main_parser(mut self, transform: impl SectionTransform + 'static) -> Self {
        self.main_parser = Some(Arc::new(transform));
        self
    }

    /// Sets the transform applied to every non-main section.
    #[must_use]
    pub fn section_parser(mut self, transform: impl SectionTransform + 'static) -> Self {
        self.section_parser = Some(Arc::new(transform));
        self
    }

    /// Substitutes the file format implementation. Defaults to [`IniParser`].
    #[must_use]
    pub fn config_source(mut self, source: impl ConfigSource + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// Finalises construction, parsing unless disabled with
    /// [`parse_on_build`](Self::parse_on_build).
    ///
    /// # Errors
    ///
    /// Propagates any error from [`Configuration::parse`].
    pub fn build(self) -> ConfigResult<Configuration> {
        let mut configuration = Configuration {
            name: self.name,
            path: self.path,
            confd_path: self.confd_path,
            conf_ext: self.conf_ext,
            path_from_main: self.path_from_main,
            main_defaults: self.main_defaults,
            section_defaults: self.section_defaults,
            main_parser: self.main_parser,
            section_parser: self.section_parser,
            source: self.source.unwrap_or_else(|| Arc::new(IniParser::new())),
            main: Section::new(),
            sections: BTreeMap::new(),
            parsed: false,
        };

        if self.parse {
            configuration.parse()?;
        }
        Ok(configuration)
    }
}

impl fmt::Debug for ConfigurationBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigurationBuilder")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("parse", &self.parse)
            .field("confd_path", &self.confd_path)
            .field("conf_ext", &self.conf_ext)
            .field("path_from_main", &self.path_from_main)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_normalized() {
        for ext in ["conf", ".conf", "..conf."] {
            let builder = Configuration::builder("main", "main.ini").conf_ext(ext);
            assert_eq!(builder.conf_ext.as_deref(), Some(".conf"));
        }
        let builder = Configuration::builder("main", "main.ini").conf_ext("");
        assert!(builder.conf_ext.is_none());
    }

    #[test]
    fn default_keys_are_case_folded() {
        let builder = Configuration::builder("main", "main.ini")
            .main_defaults([("Main_Key", "value")])
            .section_defaults([("SLEEP", "2")]);
        assert!(builder.main_defaults.contains_key("main_key"));
        assert!(builder.section_defaults.contains_key("sleep"));
    }

    #[test]
    fn unparsed_configuration_only_knows_main() {
        let conf = Configuration::builder("main", "does/not/exist.ini")
            .parse_on_build(false)
            .build()
            .unwrap();

        assert!(!conf.is_parsed());
        assert!(conf.has("main", None));
        assert!(!conf.has("other", None));
        assert!(conf.main().is_empty());
    }
}
