//! Certificate authority index database.
#![forbid(unsafe_code)]
//!
//! This crate keeps the record of every certificate a CA has issued in a
//! flat, tab-separated text file, together with the serial number file the
//! CA draws new serials from.
//!
//! # Overview
//!
//! The `cadb` crate provides:
//! - Loading and saving the index file and its `.attr` sidecar
//! - Serial and subject indices with uniqueness checks
//! - Rename-based rotation that commits new files while keeping the previous ones
//! - A maintenance scan that marks expired certificates
//! - A serial allocator with random initial values
//!
//! # Example
//!
//! ```no_run
//! use cadb::{scan_and_expire, DbOptions, OsFileSystem, Store};
//! use std::path::Path;
//!
//! let options = DbOptions::default();
//! let mut store = Store::load(&OsFileSystem, Path::new("demoCA/index.txt"), &options)?;
//! store.build_indices()?;
//!
//! let report = scan_and_expire(&mut store, chrono::Utc::now());
//! if report.modified() {
//!     store.commit(&OsFileSystem, &options)?;
//! }
//! # Ok::<(), cadb::Error>(())
//! ```
//!
//! # Modules
//!
//! - [`store`] - The record table
//! - [`index`] - Serial and subject indices
//! - [`attr`] - The attribute sidecar file
//! - [`serial`] - The serial number file
//! - [`rotation`] - Rename-based commit
//! - [`update`] - The expiry scan
//! - [`record`] - Record and status types
//! - [`time`] - ASN.1 time strings
//! - [`fs`] - Filesystem access
//! - [`config`] - Options
//! - [`error`] - Error types

pub mod attr;
pub mod config;
pub mod error;
pub mod fs;
pub mod index;
pub mod record;
pub mod rotation;
pub mod serial;
pub mod store;
pub mod time;
pub mod update;

// Re-export commonly used types at crate root
pub use attr::{parse_yesno, Attributes};
pub use config::DbOptions;
pub use error::{Error, IndexKind, Result};
pub use fs::{FileSystem, OsFileSystem};
pub use record::{canonical_serial, Record, Status};
pub use rotation::{rotate_file, rotate_index};
pub use serial::{load_serial, rotate_serial, save_serial, LoadedSerial, SerialNumber};
pub use store::Store;
pub use time::{format_asn1_time, parse_asn1_time, parse_reference_time};
pub use update::{scan_and_expire, scan_and_expire_at, ScanReport};
