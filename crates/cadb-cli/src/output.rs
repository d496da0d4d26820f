//! Output formatting for CLI commands.
//!
//! Supports text (human-readable) and JSON output formats.

use std::io::Write;

use serde::Serialize;

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both text and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TextDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Text => {
                value.write_text(writer)?;
            }
        }
        Ok(())
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Text)
    }
}

/// Trait for types that can be displayed as plain text.
pub trait TextDisplay {
    /// Write the value as human-readable text.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_text<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// Result of the `update` command.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateSummary {
    /// Records marked expired.
    pub expired: usize,
    /// Valid records with an unreadable expiration date.
    pub unparsable: usize,
    /// Whether the index was rewritten.
    pub saved: bool,
}

impl TextDisplay for UpdateSummary {
    fn write_text<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.expired == 0 {
            writeln!(writer, "No entries found to mark expired")?;
        } else {
            writeln!(writer, "Done. {} entries marked as expired", self.expired)?;
        }
        if self.unparsable > 0 {
            writeln!(
                writer,
                "Warning: {} entries have an unreadable expiration date",
                self.unparsable
            )?;
        }
        Ok(())
    }
}

/// Result of the `verify` command.
#[derive(Debug, Clone, Serialize)]
pub struct VerifySummary {
    /// Total records.
    pub records: usize,
    /// Records with status `V`.
    pub valid: usize,
    /// Records with status `R`.
    pub revoked: usize,
    /// Records with status `E`.
    pub expired: usize,
    /// Whether valid subjects must be unique.
    pub unique_subject: bool,
}

impl TextDisplay for VerifySummary {
    fn write_text<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Index OK")?;
        writeln!(writer, "  Records:        {}", self.records)?;
        writeln!(writer, "  Valid:          {}", self.valid)?;
        writeln!(writer, "  Revoked:        {}", self.revoked)?;
        writeln!(writer, "  Expired:        {}", self.expired)?;
        writeln!(
            writer,
            "  Unique subject: {}",
            if self.unique_subject { "yes" } else { "no" }
        )?;
        Ok(())
    }
}

/// A single certificate's status.
#[derive(Debug, Clone, Serialize)]
pub struct CertStatus {
    /// Serial as stored in the index.
    pub serial: String,
    /// Status code.
    pub status: char,
    /// Expiration date.
    pub expiration_date: String,
    /// Revocation date, empty unless revoked.
    pub revocation_date: String,
    /// Subject name.
    pub subject: String,
}

impl From<&cadb::Record> for CertStatus {
    fn from(record: &cadb::Record) -> Self {
        Self {
            serial: record.serial.clone(),
            status: record.status.code(),
            expiration_date: record.expiration_date.clone(),
            revocation_date: record.revocation_date.clone(),
            subject: record.subject.clone(),
        }
    }
}

impl TextDisplay for CertStatus {
    fn write_text<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        let label = match self.status {
            'V' => "Valid",
            'R' => "Revoked",
            _ => "Expired",
        };
        writeln!(writer, "{}={} ({})", self.serial, label, self.status)?;
        Ok(())
    }
}

/// Result of the `serial` command.
#[derive(Debug, Clone, Serialize)]
pub struct SerialSummary {
    /// The serial handed out.
    pub serial: String,
    /// The value now stored for the next call.
    pub next: String,
    /// Whether the serial was freshly generated.
    pub generated: bool,
}

impl TextDisplay for SerialSummary {
    fn write_text<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "{}", self.serial)?;
        Ok(())
    }
}
