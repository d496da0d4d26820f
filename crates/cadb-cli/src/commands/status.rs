//! Certificate status lookup command.

use std::io::Write;
use std::path::PathBuf;

use cadb::Store;

use super::Context;
use crate::error::CliError;
use crate::output::{CertStatus, OutputFormat};

/// Status command executor.
pub struct StatusCommand<'a> {
    ctx: Context<'a>,
    dbfile: PathBuf,
}

impl<'a> StatusCommand<'a> {
    /// Create a new status command.
    #[must_use]
    pub fn new(ctx: Context<'a>, dbfile: impl Into<PathBuf>) -> Self {
        Self {
            ctx,
            dbfile: dbfile.into(),
        }
    }

    /// Execute the status command.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be loaded or has no such serial.
    pub fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        serial: &str,
    ) -> Result<(), CliError> {
        let mut store = Store::load(self.ctx.fs, &self.dbfile, self.ctx.options)?;
        store.build_indices()?;

        let record = store
            .find_by_serial(serial)
            .ok_or_else(|| cadb::Error::RecordNotFound(serial.to_string()))?;
        format.write(writer, &CertStatus::from(record))
    }
}
