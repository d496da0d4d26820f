//! The serial file: one persisted big integer handed out to new certificates.
//!
//! On disk the value is uppercase hex, two digits per byte, with a `\`
//! continuation after every 35 bytes and a trailing newline.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use num_bigint::BigUint;
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::{debug, info};

use crate::config::check_serial_bits;
use crate::error::{Error, Result};
use crate::fs::{self, with_suffix, FileSystem};
use crate::rotation::rotate_file;

const BYTES_PER_LINE: usize = 35;

/// A non-negative certificate serial number.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SerialNumber(BigUint);

impl SerialNumber {
    /// Wraps a value.
    #[must_use]
    pub const fn new(value: BigUint) -> Self {
        Self(value)
    }

    /// Draws a uniformly random value below `2^bits` from the OS CSPRNG.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] unless `bits` is in `1..=MAX_SERIAL_BITS`.
    pub fn random(bits: u64) -> Result<Self> {
        check_serial_bits(bits)?;
        let len = bits.div_ceil(8) as usize;
        let mut bytes = vec![0u8; len];
        OsRng.fill_bytes(&mut bytes);
        let excess = (len as u64) * 8 - bits;
        if let Some(top) = bytes.first_mut() {
            *top &= 0xFF >> excess;
        }
        Ok(Self(BigUint::from_bytes_be(&bytes)))
    }

    /// Returns the value.
    #[must_use]
    pub const fn value(&self) -> &BigUint {
        &self.0
    }

    /// Returns the successor serial.
    #[must_use]
    pub fn next(&self) -> Self {
        Self(&self.0 + 1u32)
    }

    /// Number of significant bits.
    #[must_use]
    pub fn bits(&self) -> u64 {
        self.0.bits()
    }

    /// Hex digits as stored in an index record's serial field.
    #[must_use]
    pub fn to_record_field(&self) -> String {
        hex_upper(&self.0.to_bytes_be())
    }

    /// Canonical serial file contents, including the trailing newline.
    #[must_use]
    pub fn encode(&self) -> String {
        let bytes = self.0.to_bytes_be();
        let mut out = String::with_capacity(bytes.len() * 2 + 1);
        for (i, chunk) in bytes.chunks(BYTES_PER_LINE).enumerate() {
            if i > 0 {
                out.push_str("\\\n");
            }
            out.push_str(&hex_upper(chunk));
        }
        out.push('\n');
        out
    }

    /// Parses serial file contents.
    ///
    /// # Errors
    ///
    /// Returns the reason the text is not a canonical hex integer.
    pub fn decode(text: &str) -> std::result::Result<Self, String> {
        let mut digits = String::new();
        for line in text.lines() {
            let line = line.trim_end();
            let (line, continued) = match line.strip_suffix('\\') {
                Some(rest) => (rest, true),
                None => (line, false),
            };
            if line.len() % 2 != 0 {
                return Err("odd number of hex digits".into());
            }
            if let Some(bad) = line.chars().find(|c| !c.is_ascii_hexdigit()) {
                return Err(format!("unexpected character {bad:?}"));
            }
            digits.push_str(line);
            if !continued {
                break;
            }
        }
        if digits.is_empty() {
            return Err("no number found".into());
        }
        BigUint::parse_bytes(digits.as_bytes(), 16)
            .map(Self)
            .ok_or_else(|| "invalid hex number".into())
    }
}

impl std::fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_record_field())
    }
}

impl From<u64> for SerialNumber {
    fn from(value: u64) -> Self {
        Self(BigUint::from(value))
    }
}

/// A serial as loaded, with the exact text a save would write back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedSerial {
    /// The numeric value.
    pub serial: SerialNumber,
    /// Its serial-file encoding.
    pub encoded: String,
    /// Whether the value was generated because no file existed.
    pub generated: bool,
}

/// Loads the serial file at `path`.
///
/// If the file is absent and `create` is set, a random `bits`-wide serial is
/// generated instead.
///
/// # Errors
///
/// Returns [`Error::Config`] if `create` is set and `bits` is out of range,
/// [`Error::NotFound`] if the file is absent and `create` is false,
/// [`Error::MalformedSerial`] if it does not hold a hex integer, or
/// [`Error::Io`] on read failure.
pub fn load_serial<F: FileSystem + ?Sized>(
    fs: &F,
    path: &Path,
    create: bool,
    bits: u64,
) -> Result<LoadedSerial> {
    if create {
        check_serial_bits(bits)?;
    }
    let serial = match fs::read_to_string(fs, path) {
        Ok(text) => {
            let serial = SerialNumber::decode(&text).map_err(|reason| Error::MalformedSerial {
                path: path.to_path_buf(),
                reason,
            })?;
            debug!(path = %path.display(), %serial, "loaded serial");
            return Ok(LoadedSerial {
                encoded: serial.encode(),
                serial,
                generated: false,
            });
        }
        Err(Error::NotFound { .. }) if create => SerialNumber::random(bits)?,
        Err(e) => return Err(e),
    };

    info!(path = %path.display(), bits, "no serial file, generated a random serial");
    Ok(LoadedSerial {
        encoded: serial.encode(),
        serial,
        generated: true,
    })
}

/// Writes `serial` to `<path>.<suffix>`, or to `path` itself when `suffix` is
/// `None`. Returns the path written.
///
/// # Errors
///
/// Returns [`Error::Io`] on write failure or [`Error::NameTooLong`] if the
/// derived name exceeds the filesystem limit.
pub fn save_serial<F: FileSystem + ?Sized>(
    fs: &F,
    path: &Path,
    suffix: Option<&str>,
    serial: &SerialNumber,
) -> Result<PathBuf> {
    let target = match suffix {
        Some(suffix) => with_suffix(path, suffix)?,
        None => path.to_path_buf(),
    };
    fs::write_all(fs, &target, &serial.encode())?;
    debug!(path = %target.display(), %serial, "saved serial");
    Ok(target)
}

/// Commits `<path>.<new_suffix>` as the live serial file.
///
/// # Errors
///
/// See [`rotate_file`].
pub fn rotate_serial<F: FileSystem + ?Sized>(
    fs: &F,
    path: &Path,
    new_suffix: &str,
    old_suffix: &str,
) -> Result<()> {
    rotate_file(fs, path, new_suffix, old_suffix)
}

fn hex_upper(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut s, b| {
        let _ = write!(s, "{b:02X}");
        s
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_SERIAL_BITS;
    use crate::fs::OsFileSystem;
    use crate::record::canonical_serial;
    use proptest::prelude::*;

    #[test]
    fn zero_encodes_as_two_digits() {
        let zero = SerialNumber::from(0);
        assert_eq!(zero.encode(), "00\n");
        assert_eq!(zero.to_record_field(), "00");
    }

    #[test]
    fn encoding_is_byte_aligned_uppercase() {
        assert_eq!(SerialNumber::from(0xA1).encode(), "A1\n");
        assert_eq!(SerialNumber::from(0x1A2).encode(), "01A2\n");
        assert_eq!(SerialNumber::from(0xDEAD_BEEF).to_record_field(), "DEADBEEF");
    }

    #[test]
    fn long_values_use_continuation_lines() {
        let value = BigUint::from_bytes_be(&[0xAB; 40]);
        let encoded = SerialNumber::new(value.clone()).encode();
        let first = format!("{}\\\n", "AB".repeat(35));
        assert!(encoded.starts_with(&first));
        assert!(encoded.ends_with(&format!("{}\n", "AB".repeat(5))));
        assert_eq!(SerialNumber::decode(&encoded).unwrap().value(), &value);
    }

    #[test]
    fn decode_accepts_crlf_and_lowercase() {
        let serial = SerialNumber::decode("0a1b\r\n").unwrap();
        assert_eq!(serial, SerialNumber::from(0x0A1B));
    }

    #[test]
    fn decode_rejects_bad_input() {
        assert!(SerialNumber::decode("").is_err());
        assert!(SerialNumber::decode("\n").is_err());
        assert!(SerialNumber::decode("ABC\n").is_err());
        assert!(SerialNumber::decode("-01\n").is_err());
        assert!(SerialNumber::decode("0G\n").is_err());
    }

    #[test]
    fn next_increments() {
        assert_eq!(SerialNumber::from(0xFF).next(), SerialNumber::from(0x100));
        assert_eq!(SerialNumber::from(0xFF).next().to_record_field(), "0100");
    }

    #[test]
    fn random_serial_fits_width_and_varies() {
        let a = SerialNumber::random(159).unwrap();
        let b = SerialNumber::random(159).unwrap();
        assert!(a.bits() <= 159);
        assert!(b.bits() <= 159);
        assert_ne!(a, b);

        for bits in [1, 7, 8, 9, 64, MAX_SERIAL_BITS] {
            assert!(SerialNumber::random(bits).unwrap().bits() <= bits);
        }
    }

    #[test]
    fn random_serial_rejects_unusable_widths() {
        for bits in [0, MAX_SERIAL_BITS + 1, u64::MAX] {
            assert!(matches!(SerialNumber::random(bits), Err(Error::Config(_))));
        }
    }

    #[test]
    fn create_with_unusable_width_fails_without_generating() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("serial");
        let result = load_serial(&OsFileSystem, &path, true, u64::MAX);
        assert!(matches!(result, Err(Error::Config(_))));
        assert!(!path.exists());

        // An existing file is read regardless of width
        std::fs::write(&path, "01\n").unwrap();
        let loaded = load_serial(&OsFileSystem, &path, false, u64::MAX).unwrap();
        assert_eq!(loaded.serial, SerialNumber::from(1));
    }

    #[test]
    fn missing_file_without_create_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = load_serial(&OsFileSystem, &dir.path().join("serial"), false, 159);
        assert!(matches!(result, Err(Error::NotFound { .. })));
    }

    #[test]
    fn missing_file_with_create_generates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("serial");
        let loaded = load_serial(&OsFileSystem, &path, true, 159).unwrap();
        assert!(loaded.generated);
        assert!(loaded.serial.bits() <= 159);
        assert_eq!(loaded.encoded, loaded.serial.encode());
        assert!(!path.exists());
    }

    #[test]
    fn malformed_file_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("serial");
        std::fs::write(&path, "hello\n").unwrap();
        let result = load_serial(&OsFileSystem, &path, true, 159);
        assert!(matches!(result, Err(Error::MalformedSerial { .. })));
    }

    #[test]
    fn allocate_save_rotate_cycle() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("serial");
        std::fs::write(&path, "1000\n").unwrap();

        let loaded = load_serial(&OsFileSystem, &path, false, 159).unwrap();
        assert_eq!(loaded.serial, SerialNumber::from(0x1000));
        assert_eq!(loaded.encoded, "1000\n");

        let next = loaded.serial.next();
        let written = save_serial(&OsFileSystem, &path, Some("new"), &next).unwrap();
        assert_eq!(written, dir.path().join("serial.new"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "1000\n");

        rotate_serial(&OsFileSystem, &path, "new", "old").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "1001\n");
        assert_eq!(
            std::fs::read_to_string(dir.path().join("serial.old")).unwrap(),
            "1000\n"
        );
    }

    #[test]
    fn save_without_suffix_writes_base() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("serial");
        save_serial(&OsFileSystem, &path, None, &SerialNumber::from(1)).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "01\n");
    }

    proptest! {
        #[test]
        fn encoding_reloads_to_the_same_value(
            bytes in proptest::collection::vec(any::<u8>(), 0..80),
        ) {
            let serial = SerialNumber::new(BigUint::from_bytes_be(&bytes));
            let decoded = SerialNumber::decode(&serial.encode()).unwrap();
            prop_assert_eq!(&decoded, &serial);
            prop_assert_eq!(decoded.encode(), serial.encode());
        }

        #[test]
        fn record_field_has_no_leading_zero_pair(value in 1u64..) {
            let field = SerialNumber::from(value).to_record_field();
            prop_assert!(!field.starts_with("00"));
            prop_assert_eq!(canonical_serial(&field), format!("{value:X}"));
        }
    }
}
