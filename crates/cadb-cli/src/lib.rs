//! # cadb-cli
//!
//! Command-line maintenance for certificate authority index databases.
//!
//! Provides commands for:
//! - Marking expired certificates (`update`)
//! - Checking serial and subject uniqueness (`verify`)
//! - Looking up and revoking certificates (`status`, `revoke`)
//! - Handing out serial numbers (`serial`)
//!
//! Every command that changes a file writes `<file>.<new>` first and then
//! rotates it into place, keeping the previous version as `<file>.<old>`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

pub use cli::{Cli, Commands, Format};
pub use error::CliError;
pub use output::OutputFormat;
