//! Expiry scan command.

use std::io::Write;
use std::path::PathBuf;

use cadb::{scan_and_expire, Store};
use tracing::warn;

use super::{time_arg, Context};
use crate::error::CliError;
use crate::output::{OutputFormat, UpdateSummary};

/// Update command executor.
pub struct UpdateCommand<'a> {
    ctx: Context<'a>,
    dbfile: PathBuf,
}

impl<'a> UpdateCommand<'a> {
    /// Create a new update command.
    #[must_use]
    pub fn new(ctx: Context<'a>, dbfile: impl Into<PathBuf>) -> Self {
        Self {
            ctx,
            dbfile: dbfile.into(),
        }
    }

    /// Execute the update command.
    ///
    /// # Errors
    ///
    /// Returns an error if the reference time is invalid, or loading, saving
    /// or rotating the index fails.
    pub fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        date: Option<&str>,
    ) -> Result<(), CliError> {
        let reference = time_arg(date)?;
        let mut store = Store::load(self.ctx.fs, &self.dbfile, self.ctx.options)?;
        if let Err(e) = store.build_indices() {
            warn!(error = %e, "index has integrity problems, updating anyway");
        }

        let report = scan_and_expire(&mut store, reference);
        if report.modified() {
            store.commit(self.ctx.fs, self.ctx.options)?;
        }

        let summary = UpdateSummary {
            expired: report.expired,
            unparsable: report.unparsable,
            saved: report.modified(),
        };
        format.write(writer, &summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{context, write_index, INDEX};
    use cadb::{DbOptions, OsFileSystem, Status};

    #[test]
    fn expires_and_commits() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_index(dir.path(), INDEX);
        let options = DbOptions::default();
        let ctx = context(&options);

        let mut out = Vec::new();
        UpdateCommand::new(ctx, &path)
            .execute(&mut out, &OutputFormat::default(), Some("210101000000Z"))
            .unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "Done. 1 entries marked as expired\n");
        let store = Store::load(&OsFileSystem, &path, &options).unwrap();
        assert_eq!(store.status_of("01"), Some(Status::Expired));
        assert!(dir.path().join("index.txt.old").exists());
    }

    #[test]
    fn nothing_to_do_leaves_files_alone() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_index(dir.path(), INDEX);
        let options = DbOptions::default();
        let ctx = context(&options);

        let mut out = Vec::new();
        UpdateCommand::new(ctx, &path)
            .execute(&mut out, &OutputFormat::default(), Some("19000101000000Z"))
            .unwrap();

        assert!(!dir.path().join("index.txt.new").exists());
        assert!(!dir.path().join("index.txt.old").exists());
    }

    #[test]
    fn bad_date_is_rejected_before_loading() {
        let dir = tempfile::tempdir().expect("tempdir");
        let options = DbOptions::default();
        let ctx = context(&options);

        let result = UpdateCommand::new(ctx, dir.path().join("missing.txt")).execute(
            &mut Vec::new(),
            &OutputFormat::default(),
            Some("soon"),
        );
        assert!(matches!(
            result,
            Err(CliError::Db(cadb::Error::InvalidTimestamp(_)))
        ));
    }
}
