//! Serial allocation command.

use std::io::Write;
use std::path::PathBuf;

use cadb::{load_serial, rotate_serial, save_serial};

use super::Context;
use crate::error::CliError;
use crate::output::{OutputFormat, SerialSummary};

/// Serial command executor.
pub struct SerialCommand<'a> {
    ctx: Context<'a>,
    serialfile: PathBuf,
}

impl<'a> SerialCommand<'a> {
    /// Create a new serial command.
    #[must_use]
    pub fn new(ctx: Context<'a>, serialfile: impl Into<PathBuf>) -> Self {
        Self {
            ctx,
            serialfile: serialfile.into(),
        }
    }

    /// Execute the serial command: print the current serial, then persist its
    /// successor.
    ///
    /// # Errors
    ///
    /// Returns an error if the serial file is missing (without `create`),
    /// malformed, or cannot be saved and rotated.
    pub fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        create: bool,
    ) -> Result<(), CliError> {
        let options = self.ctx.options;
        let loaded = load_serial(self.ctx.fs, &self.serialfile, create, options.serial_bits)?;
        let next = loaded.serial.next();

        save_serial(self.ctx.fs, &self.serialfile, Some(&options.new_suffix), &next)?;
        rotate_serial(
            self.ctx.fs,
            &self.serialfile,
            &options.new_suffix,
            &options.old_suffix,
        )?;

        let summary = SerialSummary {
            serial: loaded.serial.to_record_field(),
            next: next.to_record_field(),
            generated: loaded.generated,
        };
        format.write(writer, &summary)
    }
}
