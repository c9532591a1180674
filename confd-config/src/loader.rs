//! Single-file loading and fragment directory discovery.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use confd_format::{ConfigSource, RawSection};
use tracing::{debug, trace, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::transform::{Section, SectionTransform, untransformed};

/// Selects which sections of a file take part in a load.
#[derive(Debug, Clone, Copy)]
pub(crate) enum SectionFilter<'a> {
    /// Keep only this section; fall back to the defaults when it is absent.
    Only(&'a str),
    /// Keep every section except this one.
    Except(&'a str),
}

impl SectionFilter<'_> {
    fn accepts(self, name: &str) -> bool {
        match self {
            Self::Only(target) => target == name,
            Self::Except(excluded) => excluded != name,
        }
    }
}

/// Loads one file through `source`, seeding sections with `defaults` and
/// running `transform` once per surviving section.
pub(crate) fn load_sections(
    source: &dyn ConfigSource,
    path: &Path,
    defaults: &RawSection,
    transform: Option<&dyn SectionTransform>,
    filter: SectionFilter<'_>,
) -> ConfigResult<BTreeMap<String, Section>> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::MissingPath);
    }

    let set = source.read(path, defaults)?;

    let mut sections = BTreeMap::new();
    for name in set.names().filter(|name| filter.accepts(name)) {
        let options = set.items(name).unwrap_or_default();
        sections.insert(name.to_owned(), finish(name, options, transform)?);
    }

    if let SectionFilter::Only(target) = filter {
        if sections.is_empty() {
            debug!(path = %path.display(), section = target, "section absent, using defaults");
            sections.insert(target.to_owned(), finish(target, defaults.clone(), transform)?);
        }
    }

    Ok(sections)
}

fn finish(
    name: &str,
    options: RawSection,
    transform: Option<&dyn SectionTransform>,
) -> ConfigResult<Section> {
    match transform {
        Some(transform) => transform
            .apply(options)
            .map_err(|source| ConfigError::Transform {
                section: name.to_owned(),
                source,
            }),
        None => Ok(untransformed(options)),
    }
}

/// Lists the regular files of `dir` that pass the extension filter, sorted by
/// file name.
///
/// An unreadable or missing directory yields no fragments.
pub(crate) fn fragment_paths(dir: &Path, extension: Option<&str>) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(dir = %dir.display(), error = %err, "fragment directory unavailable");
            return Vec::new();
        }
    };

    let mut names: Vec<OsString> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.file_name())
        .collect();
    names.sort();

    names
        .into_iter()
        .map(|name| dir.join(name))
        .filter(|path| {
            let is_file = fs::metadata(path).is_ok_and(|meta| meta.is_file());
            if !is_file {
                trace!(path = %path.display(), "skipping non-regular fragment entry");
            }
            is_file
        })
        .filter(|path| {
            let matches = extension.is_none_or(|ext| {
                path.file_name()
                    .is_some_and(|name| name.to_string_lossy().ends_with(ext))
            });
            if !matches {
                trace!(path = %path.display(), "skipping fragment with other extension");
            }
            matches
        })
        .collect()
}

/// Folds `fragment` into `sections` key by key; later values win.
pub(crate) fn merge_sections(
    sections: &mut BTreeMap<String, Section>,
    fragment: BTreeMap<String, Section>,
) {
    for (name, options) in fragment {
        sections.entry(name).or_default().extend(options);
    }
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::io::Write;

    use confd_format::IniParser;
    use serde_json::Value;

    use super::*;

    fn write(dir: &Path, name: &str, body: &str) {
        let mut file = File::create(dir.join(name)).unwrap();
        file.write_all(body.as_bytes()).unwrap();
    }

    #[test]
    fn only_filter_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "app.ini", "[other]\nkey = value\n");

        let mut defaults = RawSection::new();
        defaults.insert("mode".into(), "safe".into());

        let sections = load_sections(
            &IniParser::new(),
            &dir.path().join("app.ini"),
            &defaults,
            None,
            SectionFilter::Only("app"),
        )
        .unwrap();

        assert_eq!(sections.len(), 1);
        assert_eq!(sections["app"].get("mode"), Some(&Value::from("safe")));
    }

    #[test]
    fn except_filter_drops_named_section() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "app.ini", "[app]\na = 1\n[db]\nb = 2\n");

        let sections = load_sections(
            &IniParser::new(),
            &dir.path().join("app.ini"),
            &RawSection::new(),
            None,
            SectionFilter::Except("app"),
        )
        .unwrap();

        assert_eq!(sections.keys().collect::<Vec<_>>(), vec!["db"]);
    }

    #[test]
    fn empty_path_is_rejected() {
        let err = load_sections(
            &IniParser::new(),
            Path::new(""),
            &RawSection::new(),
            None,
            SectionFilter::Except("app"),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingPath));
    }

    #[test]
    fn fragments_are_sorted_filtered_and_files_only() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b.conf", "");
        write(dir.path(), "a.conf", "");
        write(dir.path(), "c.ini", "");
        fs::create_dir(dir.path().join("d.conf")).unwrap();

        let all: Vec<_> = fragment_paths(dir.path(), None)
            .into_iter()
            .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(all, vec!["a.conf", "b.conf", "c.ini"]);

        let filtered: Vec<_> = fragment_paths(dir.path(), Some(".conf"))
            .into_iter()
            .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(filtered, vec!["a.conf", "b.conf"]);
    }

    #[test]
    fn missing_fragment_directory_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(fragment_paths(&dir.path().join("absent"), None).is_empty());
    }

    #[test]
    fn empty_fragment_directory_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(fragment_paths(dir.path(), None).is_empty());
        assert!(fragment_paths(dir.path(), Some(".conf")).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_followed() {
        use std::os::unix::fs::symlink;

        let dir = tempfile::tempdir().unwrap();
        let confd = dir.path().join("conf.d");
        fs::create_dir(&confd).unwrap();
        write(dir.path(), "target.ini", "[linked]\na = 1\n");
        fs::create_dir(dir.path().join("target.d")).unwrap();
        symlink(dir.path().join("target.ini"), confd.join("l.ini")).unwrap();
        symlink(dir.path().join("target.d"), confd.join("d.ini")).unwrap();

        let paths = fragment_paths(&confd, Some(".ini"));
        assert_eq!(paths, vec![confd.join("l.ini")]);
    }

    #[test]
    fn merge_overlays_keys_and_adds_sections() {
        let mut sections = BTreeMap::new();
        sections.insert(
            "s".to_owned(),
            Section::from([
                ("a".to_owned(), Value::from("1")),
                ("b".to_owned(), Value::from("2")),
            ]),
        );

        let mut fragment = BTreeMap::new();
        fragment.insert(
            "s".to_owned(),
            Section::from([("b".to_owned(), Value::from("3"))]),
        );
        fragment.insert(
            "t".to_owned(),
            Section::from([("c".to_owned(), Value::from("4"))]),
        );

        merge_sections(&mut sections, fragment);

        assert_eq!(sections["s"]["a"], Value::from("1"));
        assert_eq!(sections["s"]["b"], Value::from("3"));
        assert_eq!(sections["t"]["c"], Value::from("4"));
    }
}
