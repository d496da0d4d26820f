//! Filesystem access used by the store, the serial allocator and rotation.

use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Longest file name component most filesystems accept.
pub const NAME_MAX: usize = 255;

/// Byte-stream and rename primitives the database is written against.
pub trait FileSystem {
    /// Opens `path` for reading.
    fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read>>;

    /// Opens `path` for writing, creating or truncating it.
    fn open_write(&self, path: &Path) -> io::Result<Box<dyn Write>>;

    /// Renames `from` to `to`, replacing `to` if it exists.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
}

/// [`FileSystem`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read>> {
        Ok(Box::new(BufReader::new(File::open(path)?)))
    }

    fn open_write(&self, path: &Path) -> io::Result<Box<dyn Write>> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(Box::new(SyncOnFlush(file)))
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        std::fs::rename(from, to)
    }
}

/// File handle whose `flush` also forces data to stable storage.
struct SyncOnFlush(File);

impl Write for SyncOnFlush {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()?;
        self.0.sync_all()
    }
}

/// Reads a whole file into a string.
pub(crate) fn read_to_string<F: FileSystem + ?Sized>(fs: &F, path: &Path) -> Result<String> {
    let mut reader = fs.open_read(path).map_err(|e| Error::from_io(path, e))?;
    let mut contents = String::new();
    reader
        .read_to_string(&mut contents)
        .map_err(|e| Error::from_io(path, e))?;
    Ok(contents)
}

/// Writes `contents` to `path` and flushes it.
pub(crate) fn write_all<F: FileSystem + ?Sized>(fs: &F, path: &Path, contents: &str) -> Result<()> {
    let mut writer = fs.open_write(path).map_err(|e| Error::from_io(path, e))?;
    writer
        .write_all(contents.as_bytes())
        .and_then(|()| writer.flush())
        .map_err(|e| Error::from_io(path, e))
}

/// Appends `.<suffix>` to `base`.
///
/// # Errors
///
/// Returns [`Error::NameTooLong`] if the resulting file name exceeds [`NAME_MAX`].
pub fn with_suffix(base: &Path, suffix: &str) -> Result<PathBuf> {
    let mut name = OsString::from(base.as_os_str());
    name.push(".");
    name.push(suffix);
    let path = PathBuf::from(name);
    check_name_len(&path)?;
    Ok(path)
}

/// Path of the attribute file belonging to the index at `base`.
///
/// # Errors
///
/// Returns [`Error::NameTooLong`] if the resulting file name exceeds [`NAME_MAX`].
pub fn attr_path(base: &Path) -> Result<PathBuf> {
    with_suffix(base, "attr")
}

fn check_name_len(path: &Path) -> Result<()> {
    let too_long = path
        .file_name()
        .is_some_and(|name| name.as_encoded_bytes().len() > NAME_MAX);
    if too_long {
        return Err(Error::NameTooLong {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}
