//! Options shared by the store, the serial allocator and their callers.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::attr::Attributes;
use crate::error::{Error, Result};
use crate::fs::{self, FileSystem};

/// Default bit width of a freshly generated serial. One bit short of 160
/// so the DER encoding of the value never needs a sign byte.
pub const DEFAULT_SERIAL_BITS: u64 = 159;

/// Largest accepted serial width.
pub const MAX_SERIAL_BITS: u64 = 2048;

/// Database options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbOptions {
    /// Suffix of freshly written files awaiting rotation.
    pub new_suffix: String,
    /// Suffix the previous live file is kept under after rotation.
    pub old_suffix: String,
    /// Width of randomly generated serials.
    pub serial_bits: u64,
    /// Uniqueness policy when the attribute file does not say otherwise.
    pub unique_subject_default: bool,
}

impl Default for DbOptions {
    fn default() -> Self {
        Self {
            new_suffix: "new".into(),
            old_suffix: "old".into(),
            serial_bits: DEFAULT_SERIAL_BITS,
            unique_subject_default: true,
        }
    }
}

impl DbOptions {
    /// Loads options from a JSON file. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// fails [`DbOptions::validate`].
    pub fn from_json_file<F: FileSystem + ?Sized>(fs: &F, path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(fs, path)?;
        let options: Self = serde_json::from_str(&contents)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        options.validate()?;
        Ok(options)
    }

    /// Checks the options for values the rotation and allocator cannot use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        for (name, suffix) in [("new_suffix", &self.new_suffix), ("old_suffix", &self.old_suffix)] {
            if suffix.is_empty() {
                return Err(Error::Config(format!("{name} cannot be empty")));
            }
            if suffix.contains(['/', '\\']) {
                return Err(Error::Config(format!("{name} cannot contain a path separator")));
            }
        }
        if self.new_suffix == self.old_suffix {
            return Err(Error::Config("new_suffix and old_suffix must differ".into()));
        }
        check_serial_bits(self.serial_bits)
    }

    /// Attribute values used when the attribute file is absent.
    #[must_use]
    pub const fn default_attributes(&self) -> Attributes {
        Attributes {
            unique_subject: self.unique_subject_default,
        }
    }
}

/// Checks a random serial width against `1..=MAX_SERIAL_BITS`.
///
/// # Errors
///
/// Returns [`Error::Config`] if `bits` is out of range.
pub fn check_serial_bits(bits: u64) -> Result<()> {
    if bits == 0 || bits > MAX_SERIAL_BITS {
        return Err(Error::Config(format!(
            "serial_bits must be between 1 and {MAX_SERIAL_BITS}, got {bits}"
        )));
    }
    Ok(())
}
