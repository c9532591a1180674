//! Pluggable loading capability.

use std::fmt::Debug;
use std::path::Path;

use crate::error::FormatResult;
use crate::section::{RawSection, SectionSet};

/// Something that can turn a file into an ordered set of named sections.
///
/// [`IniParser`](crate::IniParser) is the stock implementation. Alternative
/// formats and test doubles plug in anywhere a source is accepted.
pub trait ConfigSource: Debug + Send + Sync {
    /// Reads `path` completely and returns the sections it declares, seeded
    /// with `defaults`.
    ///
    /// # Errors
    ///
    /// Implementations return [`FormatError::Io`](crate::FormatError::Io) when
    /// the resource cannot be fully read and a parse error when its content is
    /// malformed.
    fn read(&self, path: &Path, defaults: &RawSection) -> FormatResult<SectionSet>;
}
