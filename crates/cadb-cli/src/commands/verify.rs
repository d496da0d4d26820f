//! Index integrity check command.

use std::io::Write;
use std::path::PathBuf;

use cadb::{Status, Store};

use super::Context;
use crate::error::CliError;
use crate::output::{OutputFormat, VerifySummary};

/// Verify command executor.
pub struct VerifyCommand<'a> {
    ctx: Context<'a>,
    dbfile: PathBuf,
}

impl<'a> VerifyCommand<'a> {
    /// Create a new verify command.
    #[must_use]
    pub fn new(ctx: Context<'a>, dbfile: impl Into<PathBuf>) -> Self {
        Self {
            ctx,
            dbfile: dbfile.into(),
        }
    }

    /// Execute the verify command.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Integrity`] if the indices cannot be built, or the
    /// load error.
    pub fn execute<W: Write>(&self, writer: &mut W, format: &OutputFormat) -> Result<(), CliError> {
        let mut store = Store::load(self.ctx.fs, &self.dbfile, self.ctx.options)?;
        store
            .build_indices()
            .map_err(|e| CliError::Integrity(e.to_string()))?;

        let count = |status| {
            store
                .records()
                .iter()
                .filter(|r| r.status == status)
                .count()
        };
        let summary = VerifySummary {
            records: store.len(),
            valid: count(Status::Valid),
            revoked: count(Status::Revoked),
            expired: count(Status::Expired),
            unique_subject: store.attributes().unique_subject,
        };
        format.write(writer, &summary)
    }
}
