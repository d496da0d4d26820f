//! Secondary lookup tables over a store's records.
//!
//! Both tables map a key to a record's position in the owning store; the
//! records themselves are never copied.

use std::collections::HashMap;

use crate::error::{Error, IndexKind, Result};
use crate::record::{Record, Status};

/// Serial and subject indices.
#[derive(Debug, Clone, Default)]
pub struct Indices {
    serial: HashMap<String, usize>,
    /// Present only when subject uniqueness is enforced.
    subject: Option<HashMap<String, usize>>,
}

impl Indices {
    /// Builds both indices over `records`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateKey`] on the first collision found in either
    /// index.
    pub fn build(records: &[Record], unique_subject: bool) -> Result<Self> {
        let mut serial: HashMap<String, usize> = HashMap::with_capacity(records.len());
        for (pos, record) in records.iter().enumerate() {
            let key = record.canonical_serial();
            if let Some(&existing) = serial.get(&key) {
                return Err(duplicate(IndexKind::Serial, &key, existing, pos));
            }
            serial.insert(key, pos);
        }

        let subject = if unique_subject {
            let mut subject: HashMap<String, usize> = HashMap::new();
            for (pos, record) in records.iter().enumerate() {
                if record.status != Status::Valid {
                    continue;
                }
                if let Some(&existing) = subject.get(&record.subject) {
                    return Err(duplicate(IndexKind::Subject, &record.subject, existing, pos));
                }
                subject.insert(record.subject.clone(), pos);
            }
            Some(subject)
        } else {
            None
        };

        Ok(Self { serial, subject })
    }

    /// Position of the record with the given serial, compared canonically.
    #[must_use]
    pub fn by_serial(&self, serial: &str) -> Option<usize> {
        self.serial
            .get(&crate::record::canonical_serial(serial))
            .copied()
    }

    /// Position of the valid record with the given subject.
    ///
    /// Returns `None` when subject uniqueness is not enforced.
    #[must_use]
    pub fn by_subject(&self, subject: &str) -> Option<usize> {
        self.subject.as_ref()?.get(subject).copied()
    }

    /// Whether the subject index is maintained.
    #[must_use]
    pub const fn has_subject_index(&self) -> bool {
        self.subject.is_some()
    }

    /// Checks that `record` could be added at position `pos`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateKey`] if its serial, or its subject for a
    /// valid record under enforced uniqueness, is already taken.
    pub fn check(&self, record: &Record, pos: usize) -> Result<()> {
        let key = record.canonical_serial();
        if let Some(&existing) = self.serial.get(&key) {
            return Err(duplicate(IndexKind::Serial, &key, existing, pos));
        }
        if record.status == Status::Valid {
            if let Some(existing) = self.by_subject(&record.subject) {
                return Err(duplicate(IndexKind::Subject, &record.subject, existing, pos));
            }
        }
        Ok(())
    }

    /// Registers a record that passed [`Indices::check`].
    pub fn add(&mut self, record: &Record, pos: usize) {
        self.serial.insert(record.canonical_serial(), pos);
        if record.status == Status::Valid {
            if let Some(subject) = self.subject.as_mut() {
                subject.insert(record.subject.clone(), pos);
            }
        }
    }

    /// Drops the subject entry for a record leaving the valid state.
    pub fn retire_subject(&mut self, record: &Record, pos: usize) {
        if let Some(subject) = self.subject.as_mut() {
            if subject.get(&record.subject) == Some(&pos) {
                subject.remove(&record.subject);
            }
        }
    }
}

fn duplicate(index: IndexKind, key: &str, existing: usize, conflicting: usize) -> Error {
    Error::DuplicateKey {
        index,
        key: key.to_string(),
        existing,
        conflicting,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid(serial: &str, subject: &str) -> Record {
        Record::new("301231235959Z", serial, subject)
    }

    #[test]
    fn padded_serials_collide() {
        let records = vec![valid("00A1", "/CN=a"), valid("A1", "/CN=b")];
        let err = Indices::build(&records, false).unwrap_err();
        assert!(matches!(
            err,
            Error::DuplicateKey {
                index: IndexKind::Serial,
                existing: 0,
                conflicting: 1,
                ..
            }
        ));
    }

    #[test]
    fn serial_collision_is_independent_of_order() {
        let records = vec![valid("A1", "/CN=a"), valid("0000A1", "/CN=b")];
        assert!(Indices::build(&records, false).is_err());
    }

    #[test]
    fn subject_collision_only_when_enforced() {
        let records = vec![valid("01", "/CN=dup"), valid("02", "/CN=dup")];
        let err = Indices::build(&records, true).unwrap_err();
        assert!(matches!(
            err,
            Error::DuplicateKey {
                index: IndexKind::Subject,
                ..
            }
        ));
        assert!(Indices::build(&records, false).is_ok());
    }

    #[test]
    fn inactive_records_do_not_claim_subjects() {
        let records = vec![
            valid("01", "/CN=dup").with_status(Status::Revoked),
            valid("02", "/CN=dup").with_status(Status::Expired),
            valid("03", "/CN=dup"),
        ];
        let indices = Indices::build(&records, true).unwrap();
        assert_eq!(indices.by_subject("/CN=dup"), Some(2));
    }

    #[test]
    fn lookups_use_canonical_serial() {
        let records = vec![valid("00A1", "/CN=a")];
        let indices = Indices::build(&records, true).unwrap();
        assert_eq!(indices.by_serial("A1"), Some(0));
        assert_eq!(indices.by_serial("000A1"), Some(0));
        assert_eq!(indices.by_serial("A2"), None);
    }

    #[test]
    fn serials_differing_only_in_case_collide() {
        let records = vec![valid("0A", "/CN=a"), valid("0a", "/CN=b")];
        let err = Indices::build(&records, false).unwrap_err();
        match err {
            Error::DuplicateKey {
                index: IndexKind::Serial,
                key,
                existing: 0,
                conflicting: 1,
            } => assert_eq!(key, "A"),
            other => panic!("unexpected error: {other}"),
        }

        let indices = Indices::build(&records[..1], false).unwrap();
        assert_eq!(indices.by_serial("a"), Some(0));
        assert!(indices.check(&valid("00a", "/CN=c"), 1).is_err());
    }

    #[test]
    fn check_add_and_retire() {
        let records = vec![valid("01", "/CN=a")];
        let mut indices = Indices::build(&records, true).unwrap();

        assert!(indices.check(&valid("001", "/CN=b"), 1).is_err());
        assert!(indices.check(&valid("02", "/CN=a"), 1).is_err());
        assert!(indices
            .check(&valid("02", "/CN=a").with_status(Status::Revoked), 1)
            .is_ok());

        indices.retire_subject(&records[0], 0);
        assert!(indices.check(&valid("02", "/CN=a"), 1).is_ok());
        indices.add(&valid("02", "/CN=a"), 1);
        assert_eq!(indices.by_subject("/CN=a"), Some(1));
    }

    #[test]
    fn no_subject_index_without_uniqueness() {
        let indices = Indices::build(&[valid("01", "/CN=a")], false).unwrap();
        assert!(!indices.has_subject_index());
        assert_eq!(indices.by_subject("/CN=a"), None);
    }
}
