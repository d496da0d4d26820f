//! Rename-based commit of freshly written files.
//!
//! A save writes `<base>.<new>`; rotation then moves the live `<base>` aside
//! to `<base>.<old>` and renames `<base>.<new>` into place. Each rename is
//! atomic on a single POSIX filesystem, so a crash leaves either the previous
//! or the new file live, with the other recoverable under its suffix.
//!
//! The index and its attribute file are rotated one after the other. If the
//! second rotation fails the first is undone on a best-effort basis, but the
//! pair is never replaced as a single atomic unit.

use std::io;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::fs::{attr_path, with_suffix, FileSystem};

/// Replaces `base` with `<base>.<new_suffix>`, keeping the previous file as
/// `<base>.<old_suffix>`.
///
/// A missing `base` is not an error (first commit). If the new file cannot be
/// moved into place the previous file is restored.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if `<base>.<new_suffix>` does not exist,
/// [`Error::Io`] for any other rename failure, or [`Error::NameTooLong`] if a
/// derived name exceeds the filesystem limit.
pub fn rotate_file<F: FileSystem + ?Sized>(
    fs: &F,
    base: &Path,
    new_suffix: &str,
    old_suffix: &str,
) -> Result<()> {
    let new_path = with_suffix(base, new_suffix)?;
    let old_path = with_suffix(base, old_suffix)?;
    replace(fs, base, &new_path, &old_path).map(|_| ())
}

/// Rotates an index file together with its `.attr` sidecar.
///
/// The index is rotated first. If the attribute file then fails to rotate,
/// the index rotation is rolled back as far as possible and
/// [`Error::PartialRotation`] is returned, saying whether the previous pair
/// is live again.
///
/// # Errors
///
/// Returns the [`rotate_file`] errors for the index itself, or
/// [`Error::PartialRotation`] if the attribute step fails.
pub fn rotate_index<F: FileSystem + ?Sized>(
    fs: &F,
    base: &Path,
    new_suffix: &str,
    old_suffix: &str,
) -> Result<()> {
    let db_new = with_suffix(base, new_suffix)?;
    let db_old = with_suffix(base, old_suffix)?;
    let attr = attr_path(base)?;
    let attr_new = with_suffix(&attr, new_suffix)?;
    let attr_old = with_suffix(&attr, old_suffix)?;

    let db_archived = replace(fs, base, &db_new, &db_old)?;

    // Undo steps for the index, in order
    let mut steps = vec![(base, db_new.as_path())];
    if db_archived {
        steps.push((db_old.as_path(), base));
    }

    let attr_archived = match archive(fs, &attr, &attr_old) {
        Ok(archived) => archived,
        Err(e) => {
            let reason = format!("archiving attribute file: {e}");
            return Err(partial(fs, base, reason, &steps));
        }
    };

    if let Err(e) = fs.rename(&attr_new, &attr) {
        let reason = format!("renaming {} to {}: {e}", attr_new.display(), attr.display());
        if attr_archived {
            steps.insert(0, (attr_old.as_path(), attr.as_path()));
        }
        return Err(partial(fs, base, reason, &steps));
    }

    info!(path = %attr.display(), "rotated");
    Ok(())
}

/// Archives `base` to `old_path` and moves `new_path` into place. Returns
/// whether a previous file was archived.
fn replace<F: FileSystem + ?Sized>(
    fs: &F,
    base: &Path,
    new_path: &Path,
    old_path: &Path,
) -> Result<bool> {
    let archived = archive(fs, base, old_path)?;

    if let Err(e) = fs.rename(new_path, base) {
        warn!(
            from = %new_path.display(),
            to = %base.display(),
            error = %e,
            "rename failed, restoring previous file"
        );
        if archived {
            undo(fs, old_path, base);
        }
        return Err(Error::from_io(new_path, e));
    }

    info!(path = %base.display(), "rotated");
    Ok(archived)
}

/// Moves the live file aside. A live file that does not exist yet is fine.
/// Returns whether anything was moved.
fn archive<F: FileSystem + ?Sized>(fs: &F, live: &Path, old: &Path) -> Result<bool> {
    match fs.rename(live, old) {
        Ok(()) => Ok(true),
        Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) => {
            debug!(path = %live.display(), "nothing to archive");
            Ok(false)
        }
        Err(e) => Err(Error::Io {
            path: live.to_path_buf(),
            source: e,
        }),
    }
}

/// Runs the undo `steps` and builds the resulting [`Error::PartialRotation`].
fn partial<F: FileSystem + ?Sized>(
    fs: &F,
    base: &Path,
    reason: String,
    steps: &[(&Path, &Path)],
) -> Error {
    let mut stuck = Vec::new();
    for &(from, to) in steps {
        if !undo(fs, from, to) {
            stuck.push(format!("{} -> {}", from.display(), to.display()));
        }
    }

    let rolled_back = stuck.is_empty();
    let reason = if rolled_back {
        reason
    } else {
        format!("{reason}; could not undo {}", stuck.join(", "))
    };
    Error::PartialRotation {
        path: base.to_path_buf(),
        reason,
        rolled_back,
    }
}

/// Best-effort rollback step. Returns whether the rename succeeded.
fn undo<F: FileSystem + ?Sized>(fs: &F, from: &Path, to: &Path) -> bool {
    match fs.rename(from, to) {
        Ok(()) => true,
        Err(e) => {
            warn!(
                from = %from.display(),
                to = %to.display(),
                error = %e,
                "rollback rename failed"
            );
            false
        }
    }
}
