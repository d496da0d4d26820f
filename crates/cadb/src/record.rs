//! Index records: one line of the database per issued certificate.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of tab-separated fields in every record.
pub const FIELD_COUNT: usize = 6;

/// Field delimiter of the index file.
pub const DELIMITER: char = '\t';

/// Lifecycle state of an issued certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    /// Certificate is valid.
    Valid,
    /// Certificate was revoked.
    Revoked,
    /// Certificate passed its expiration date.
    Expired,
}

impl Status {
    /// Returns the single-character code stored in the index file.
    #[must_use]
    pub const fn code(self) -> char {
        match self {
            Self::Valid => 'V',
            Self::Revoked => 'R',
            Self::Expired => 'E',
        }
    }

    /// Parses a status code.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "V" => Some(Self::Valid),
            "R" => Some(Self::Revoked),
            "E" => Some(Self::Expired),
            _ => None,
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// One issued certificate as recorded in the index.
///
/// Absent values are empty strings. The serial is stored exactly as read;
/// [`Record::canonical_serial`] gives the form used for comparisons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Current state.
    pub status: Status,
    /// Expiration date as an ASN.1 time string.
    pub expiration_date: String,
    /// Revocation date, empty unless revoked.
    pub revocation_date: String,
    /// Serial number in hex, possibly zero-padded.
    pub serial: String,
    /// Certificate file name or `unknown`.
    pub filename: String,
    /// Subject distinguished name.
    pub subject: String,
}

impl Record {
    /// Creates a valid, unrevoked record with an `unknown` file name.
    #[must_use]
    pub fn new(
        expiration_date: impl Into<String>,
        serial: impl Into<String>,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            status: Status::Valid,
            expiration_date: expiration_date.into(),
            revocation_date: String::new(),
            serial: serial.into(),
            filename: "unknown".into(),
            subject: subject.into(),
        }
    }

    /// Sets the status.
    #[must_use]
    pub const fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    /// Sets the revocation date.
    #[must_use]
    pub fn with_revocation_date(mut self, date: impl Into<String>) -> Self {
        self.revocation_date = date.into();
        self
    }

    /// Sets the file name.
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    /// Serial with leading zeros stripped and hex digits uppercased.
    #[must_use]
    pub fn canonical_serial(&self) -> String {
        canonical_serial(&self.serial)
    }

    /// Parses one index line (without its newline).
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedRecord`] on a wrong field count or an
    /// unknown status code.
    pub fn parse_line(line: &str, path: &Path, line_no: usize) -> Result<Self> {
        let malformed = |reason: String| Error::MalformedRecord {
            path: path.to_path_buf(),
            line: line_no,
            reason,
        };

        let fields: Vec<&str> = line.split(DELIMITER).collect();
        if fields.len() != FIELD_COUNT {
            return Err(malformed(format!(
                "expected {FIELD_COUNT} fields, found {}",
                fields.len()
            )));
        }

        let status = Status::from_code(fields[0])
            .ok_or_else(|| malformed(format!("unknown status {:?}", fields[0])))?;

        Ok(Self {
            status,
            expiration_date: fields[1].to_string(),
            revocation_date: fields[2].to_string(),
            serial: fields[3].to_string(),
            filename: fields[4].to_string(),
            subject: fields[5].to_string(),
        })
    }

    /// Renders the record as an index line, without the newline.
    #[must_use]
    pub fn to_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            self.status.code(),
            self.expiration_date,
            self.revocation_date,
            self.serial,
            self.filename,
            self.subject,
        )
    }

    /// Checks that no field would break the line format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedRecord`] if a field holds a tab or line break.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("expiration-date", &self.expiration_date),
            ("revocation-date", &self.revocation_date),
            ("serial", &self.serial),
            ("filename", &self.filename),
            ("subject", &self.subject),
        ];
        for (name, value) in fields {
            if value.contains(['\t', '\n', '\r']) {
                return Err(Error::MalformedRecord {
                    path: Default::default(),
                    line: 0,
                    reason: format!("{name} contains a delimiter or line break"),
                });
            }
        }
        Ok(())
    }
}

/// Comparison key of a hex serial: leading zeros stripped, digits uppercased.
///
/// Two serials with the same key denote the same number.
#[must_use]
pub fn canonical_serial(serial: &str) -> String {
    serial.trim_start_matches('0').to_ascii_uppercase()
}
