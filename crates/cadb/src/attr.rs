//! The `<index>.attr` sidecar carrying store-wide settings.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::fs::{self, FileSystem};

const UNIQUE_SUBJECT: &str = "unique_subject";

/// Settings persisted next to the index file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    /// Whether two valid records may share a subject name.
    pub unique_subject: bool,
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            unique_subject: true,
        }
    }
}

impl Attributes {
    /// Parses attribute file contents, starting from `defaults`.
    ///
    /// Only `key = value` lines before the first `[section]` header are
    /// consulted. Blank lines and `#` comments are skipped. Unknown keys and
    /// lines without `=` are ignored.
    #[must_use]
    pub fn parse(contents: &str, defaults: Self) -> Self {
        let mut attrs = defaults;
        for line in contents.lines() {
            let line = line.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('[') {
                break;
            }
            let Some((key, value)) = line.split_once('=') else {
                debug!(line, "ignoring attribute line without '='");
                continue;
            };
            if key.trim() == UNIQUE_SUBJECT {
                attrs.unique_subject = parse_yesno(unquote(value.trim()), defaults.unique_subject);
            }
        }
        attrs
    }

    /// Renders the attribute file.
    #[must_use]
    pub fn render(&self) -> String {
        let value = if self.unique_subject { "yes" } else { "no" };
        format!("{UNIQUE_SUBJECT} = {value}\n")
    }

    /// Loads the attribute file at `path`, or returns `defaults` if it is absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file exists but cannot be read.
    pub fn load<F: FileSystem + ?Sized>(fs: &F, path: &Path, defaults: Self) -> Result<Self> {
        match fs::read_to_string(fs, path) {
            Ok(contents) => Ok(Self::parse(&contents, defaults)),
            Err(Error::NotFound { .. }) => {
                debug!(path = %path.display(), "no attribute file, using defaults");
                Ok(defaults)
            }
            Err(Error::Io { source, .. }) if source.kind() == std::io::ErrorKind::InvalidData => {
                warn!(path = %path.display(), "attribute file is not UTF-8, using defaults");
                Ok(defaults)
            }
            Err(e) => Err(e),
        }
    }

    /// Writes the attribute file to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be written.
    pub fn save<F: FileSystem + ?Sized>(&self, fs: &F, path: &Path) -> Result<()> {
        fs::write_all(fs, path, &self.render())
    }
}

/// Interprets a boolean setting by its first character.
///
/// `f`, `n` and `0` mean false; `t`, `y` and `1` mean true (case-insensitive).
/// Anything else, including an empty string, yields `default`.
#[must_use]
pub fn parse_yesno(value: &str, default: bool) -> bool {
    match value.chars().next() {
        Some('f' | 'F' | 'n' | 'N' | '0') => false,
        Some('t' | 'T' | 'y' | 'Y' | '1') => true,
        _ => default,
    }
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::OsFileSystem;
    use test_case::test_case;

    #[test_case("yes", true ; "yes")]
    #[test_case("YES", true ; "upper yes")]
    #[test_case("true", true ; "true")]
    #[test_case("T", true ; "t")]
    #[test_case("1", true ; "one")]
    #[test_case("no", false ; "no")]
    #[test_case("No", false ; "mixed no")]
    #[test_case("false", false ; "false")]
    #[test_case("F", false ; "f")]
    #[test_case("0", false ; "zero")]
    fn yesno(value: &str, expected: bool) {
        assert_eq!(parse_yesno(value, !expected), expected);
    }

    #[test_case("" ; "empty")]
    #[test_case("maybe" ; "maybe")]
    #[test_case("2" ; "two")]
    #[test_case(" yes" ; "leading space")]
    fn yesno_falls_back(value: &str) {
        assert!(parse_yesno(value, true));
        assert!(!parse_yesno(value, false));
    }

    #[test]
    fn parse_reads_unique_subject() {
        let attrs = Attributes::parse("unique_subject = no\n", Attributes::default());
        assert!(!attrs.unique_subject);
    }

    #[test]
    fn parse_tolerates_comments_and_noise() {
        let contents = "# generated\n\nother = 1\nunique_subject=\"no\" # trailing\njunk line\n";
        let attrs = Attributes::parse(contents, Attributes::default());
        assert!(!attrs.unique_subject);
    }

    #[test]
    fn parse_ignores_sections() {
        let contents = "[ca]\nunique_subject = no\n";
        let attrs = Attributes::parse(contents, Attributes::default());
        assert!(attrs.unique_subject);
    }

    #[test]
    fn unparsable_value_keeps_default() {
        let attrs = Attributes::parse("unique_subject = perhaps\n", Attributes::default());
        assert!(attrs.unique_subject);
    }

    #[test]
    fn render_matches_file_format() {
        let attrs = Attributes {
            unique_subject: false,
        };
        assert_eq!(attrs.render(), "unique_subject = no\n");
        assert_eq!(Attributes::default().render(), "unique_subject = yes\n");
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let defaults = Attributes {
            unique_subject: false,
        };
        let attrs = Attributes::load(&OsFileSystem, &dir.path().join("index.txt.attr"), defaults)
            .unwrap();
        assert_eq!(attrs, defaults);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("index.txt.attr");
        let attrs = Attributes {
            unique_subject: false,
        };
        attrs.save(&OsFileSystem, &path).unwrap();
        let loaded = Attributes::load(&OsFileSystem, &path, Attributes::default()).unwrap();
        assert_eq!(loaded, attrs);
    }
}
