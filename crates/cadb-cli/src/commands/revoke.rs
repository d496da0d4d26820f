//! Certificate revocation command.

use std::io::Write;
use std::path::PathBuf;

use cadb::Store;

use super::{time_arg, Context};
use crate::error::CliError;
use crate::output::{CertStatus, OutputFormat};

/// Revoke command executor.
pub struct RevokeCommand<'a> {
    ctx: Context<'a>,
    dbfile: PathBuf,
}

impl<'a> RevokeCommand<'a> {
    /// Create a new revoke command.
    #[must_use]
    pub fn new(ctx: Context<'a>, dbfile: impl Into<PathBuf>) -> Self {
        Self {
            ctx,
            dbfile: dbfile.into(),
        }
    }

    /// Execute the revoke command.
    ///
    /// # Errors
    ///
    /// Returns an error if the record is missing or already revoked, or the
    /// index cannot be loaded or committed.
    pub fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        serial: &str,
        date: Option<&str>,
    ) -> Result<(), CliError> {
        let at = time_arg(date)?;
        let mut store = Store::load(self.ctx.fs, &self.dbfile, self.ctx.options)?;
        store.build_indices()?;

        let status = CertStatus::from(store.revoke(serial, at)?);
        store.commit(self.ctx.fs, self.ctx.options)?;
        format.write(writer, &status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{context, write_index, INDEX};
    use cadb::{DbOptions, OsFileSystem, Status};

    #[test]
    fn revokes_and_persists() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_index(dir.path(), INDEX);
        let options = DbOptions::default();
        let ctx = context(&options);

        let mut out = Vec::new();
        RevokeCommand::new(ctx, &path)
            .execute(&mut out, &OutputFormat::default(), "02", Some("20240301120000Z"))
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "02=Revoked (R)\n");

        let store = Store::load(&OsFileSystem, &path, &options).unwrap();
        let record = store.find_by_serial("02").unwrap();
        assert_eq!(record.status, Status::Revoked);
        assert_eq!(record.revocation_date, "240301120000Z");
    }

    #[test]
    fn already_revoked_leaves_index_untouched() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_index(dir.path(), INDEX);
        let options = DbOptions::default();
        let ctx = context(&options);

        let result = RevokeCommand::new(ctx, &path).execute(
            &mut Vec::new(),
            &OutputFormat::default(),
            "03",
            None,
        );
        assert!(matches!(
            result,
            Err(CliError::Db(cadb::Error::InvalidTransition { .. }))
        ));
        assert!(!dir.path().join("index.txt.old").exists());
    }
}
