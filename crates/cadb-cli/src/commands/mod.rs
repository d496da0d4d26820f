//! Command implementations for the cadb CLI.

pub mod revoke;
pub mod serial;
pub mod status;
pub mod update;
pub mod verify;

pub use revoke::RevokeCommand;
pub use serial::SerialCommand;
pub use status::StatusCommand;
pub use update::UpdateCommand;
pub use verify::VerifyCommand;

use cadb::{DbOptions, FileSystem};

/// What every command needs: where files live and how to treat them.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    /// Filesystem the database lives on.
    pub fs: &'a dyn FileSystem,
    /// Database options.
    pub options: &'a DbOptions,
}

impl std::fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("options", self.options)
            .finish_non_exhaustive()
    }
}

/// Resolves an optional time argument, defaulting to now.
pub(crate) fn time_arg(
    date: Option<&str>,
) -> Result<chrono::DateTime<chrono::Utc>, crate::error::CliError> {
    date.map_or_else(
        || Ok(chrono::Utc::now()),
        |d| cadb::parse_reference_time(d).map_err(Into::into),
    )
}

#[cfg(test)]
pub(crate) mod testing {
    use std::path::{Path, PathBuf};

    use cadb::{DbOptions, OsFileSystem};

    use super::Context;

    pub(crate) const INDEX: &str = "\
V\t200101000000Z\t\t01\tunknown\t/CN=expired.example
V\t20990101000000Z\t\t02\tunknown\t/CN=current.example
R\t200101000000Z\t190601000000Z\t03\tunknown\t/CN=revoked.example
";

    pub(crate) fn context(options: &DbOptions) -> Context<'_> {
        Context {
            fs: &OsFileSystem,
            options,
        }
    }

    pub(crate) fn write_index(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("index.txt");
        std::fs::write(&path, contents).expect("write index");
        path
    }
}
