//! The index database: an ordered table of issued-certificate records.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::attr::Attributes;
use crate::config::DbOptions;
use crate::error::{Error, Result};
use crate::fs::{self, attr_path, with_suffix, FileSystem};
use crate::index::Indices;
use crate::record::{canonical_serial, Record, Status};
use crate::rotation::rotate_index;
use crate::time::format_asn1_time;

/// Records loaded from an index file, plus their attributes and indices.
///
/// Records keep their file order, which is also the order they are saved in.
/// Indices are built on request with [`Store::build_indices`].
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
    records: Vec<Record>,
    attributes: Attributes,
    indices: Option<Indices>,
}

impl Store {
    /// Creates an empty store for the index file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, attributes: Attributes) -> Self {
        Self {
            path: path.into(),
            records: Vec::new(),
            attributes,
            indices: None,
        }
    }

    /// Loads the index file at `path` and its attribute sidecar.
    ///
    /// Lines starting with `#` are skipped. Any other line must hold exactly
    /// six tab-separated fields. Indices are not built.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the index file is missing,
    /// [`Error::MalformedRecord`] for the first bad line, or [`Error::Io`].
    pub fn load<F: FileSystem + ?Sized>(fs: &F, path: &Path, options: &DbOptions) -> Result<Self> {
        let contents = fs::read_to_string(fs, path)?;

        let mut records = Vec::new();
        for (i, line) in contents.lines().enumerate() {
            if line.starts_with('#') {
                continue;
            }
            records.push(Record::parse_line(line, path, i + 1)?);
        }

        let attributes = Attributes::load(fs, &attr_path(path)?, options.default_attributes())?;

        info!(
            path = %path.display(),
            records = records.len(),
            unique_subject = attributes.unique_subject,
            "loaded index"
        );

        Ok(Self {
            path: path.to_path_buf(),
            records,
            attributes,
            indices: None,
        })
    }

    /// Builds the serial index and, when subject uniqueness is enforced, the
    /// subject index over valid records.
    ///
    /// On failure the store keeps its records but has no indices.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateKey`] for the first colliding key.
    pub fn build_indices(&mut self) -> Result<()> {
        self.indices = None;
        let indices = Indices::build(&self.records, self.attributes.unique_subject)?;
        debug!(path = %self.path.display(), "indices built");
        self.indices = Some(indices);
        Ok(())
    }

    /// Whether indices are currently built.
    #[must_use]
    pub const fn is_indexed(&self) -> bool {
        self.indices.is_some()
    }

    /// Appends a record.
    ///
    /// With indices built the record must not collide with an existing serial
    /// or, under subject uniqueness, with a valid record's subject. Without
    /// indices it is appended unchecked. Returns the record's position.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedRecord`] if a field would break the file
    /// format, or [`Error::DuplicateKey`] on an index collision. The store is
    /// unchanged on error.
    pub fn insert(&mut self, record: Record) -> Result<usize> {
        record.validate()?;
        let pos = self.records.len();
        if let Some(indices) = self.indices.as_mut() {
            indices.check(&record, pos)?;
            indices.add(&record, pos);
        }
        debug!(serial = %record.serial, subject = %record.subject, "record inserted");
        self.records.push(record);
        Ok(pos)
    }

    /// Finds a record by serial, ignoring leading zeros.
    #[must_use]
    pub fn find_by_serial(&self, serial: &str) -> Option<&Record> {
        self.position_of(serial).map(|pos| &self.records[pos])
    }

    /// Finds the valid record holding `subject`.
    #[must_use]
    pub fn find_by_subject(&self, subject: &str) -> Option<&Record> {
        match &self.indices {
            Some(indices) if indices.has_subject_index() => {
                indices.by_subject(subject).map(|pos| &self.records[pos])
            }
            _ => self
                .records
                .iter()
                .find(|r| r.status == Status::Valid && r.subject == subject),
        }
    }

    /// Status of the record with the given serial.
    #[must_use]
    pub fn status_of(&self, serial: &str) -> Option<Status> {
        self.find_by_serial(serial).map(|r| r.status)
    }

    /// Marks a valid or expired record as revoked at `at`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecordNotFound`] for an unknown serial or
    /// [`Error::InvalidTransition`] if the record is already revoked.
    pub fn revoke(&mut self, serial: &str, at: DateTime<Utc>) -> Result<&Record> {
        let pos = self
            .position_of(serial)
            .ok_or_else(|| Error::RecordNotFound(serial.to_string()))?;

        let current = self.records[pos].status;
        if current == Status::Revoked {
            return Err(Error::InvalidTransition {
                serial: serial.to_string(),
                from: current.code(),
                to: Status::Revoked.code(),
            });
        }

        self.set_status(pos, Status::Revoked);
        self.records[pos].revocation_date = format_asn1_time(at);
        info!(serial = %self.records[pos].serial, "revoked");
        Ok(&self.records[pos])
    }

    /// Changes a record's status, keeping the subject index limited to valid
    /// records.
    pub(crate) fn set_status(&mut self, pos: usize, status: Status) {
        let record = &mut self.records[pos];
        if record.status == Status::Valid && status != Status::Valid {
            if let Some(indices) = self.indices.as_mut() {
                indices.retire_subject(record, pos);
            }
        }
        record.status = status;
    }

    /// Writes the records to `<path>.<suffix>` and the attributes to
    /// `<path>.attr.<suffix>`. The live files are not touched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] on write failure or [`Error::NameTooLong`].
    pub fn save<F: FileSystem + ?Sized>(&self, fs: &F, suffix: &str) -> Result<()> {
        let db_path = with_suffix(&self.path, suffix)?;
        let attr = with_suffix(&attr_path(&self.path)?, suffix)?;

        let mut contents = String::new();
        for record in &self.records {
            contents.push_str(&record.to_line());
            contents.push('\n');
        }
        fs::write_all(fs, &db_path, &contents)?;
        self.attributes.save(fs, &attr)?;

        debug!(path = %db_path.display(), records = self.records.len(), "saved index");
        Ok(())
    }

    /// Saves under `options.new_suffix` and rotates into place, keeping the
    /// previous files under `options.old_suffix`.
    ///
    /// # Errors
    ///
    /// Returns the [`Store::save`] or [`rotate_index`] error.
    pub fn commit<F: FileSystem + ?Sized>(&self, fs: &F, options: &DbOptions) -> Result<()> {
        self.save(fs, &options.new_suffix)?;
        rotate_index(fs, &self.path, &options.new_suffix, &options.old_suffix)
    }

    /// The records in file order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The store's attributes.
    #[must_use]
    pub const fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Changes the subject uniqueness policy. Indices are dropped and must be
    /// rebuilt.
    pub fn set_unique_subject(&mut self, unique: bool) {
        self.attributes.unique_subject = unique;
        self.indices = None;
    }

    /// The index file this store belongs to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn position_of(&self, serial: &str) -> Option<usize> {
        match &self.indices {
            Some(indices) => indices.by_serial(serial),
            None => {
                let wanted = canonical_serial(serial);
                self.records
                    .iter()
                    .position(|r| r.canonical_serial() == wanted)
            }
        }
    }
}
