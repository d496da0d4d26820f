//! cadb binary entrypoint.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cadb::{DbOptions, OsFileSystem};
use cadb_cli::cli::{Cli, Commands};
use cadb_cli::commands::{
    Context, RevokeCommand, SerialCommand, StatusCommand, UpdateCommand, VerifyCommand,
};
use cadb_cli::output::OutputFormat;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v
    let default_level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), cadb_cli::CliError> {
    let fs = OsFileSystem;
    let options = match &cli.config {
        Some(path) => DbOptions::from_json_file(&fs, path)?,
        None => DbOptions::default(),
    };
    debug!(?options, "options loaded");

    let ctx = Context {
        fs: &fs,
        options: &options,
    };
    let format = OutputFormat::new(cli.format);
    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::Update { dbfile, date } => {
            UpdateCommand::new(ctx, dbfile).execute(&mut stdout, &format, date.as_deref())?;
        }
        Commands::Verify { dbfile } => {
            VerifyCommand::new(ctx, dbfile).execute(&mut stdout, &format)?;
        }
        Commands::Status { dbfile, serial } => {
            StatusCommand::new(ctx, dbfile).execute(&mut stdout, &format, &serial)?;
        }
        Commands::Revoke {
            dbfile,
            serial,
            date,
        } => {
            RevokeCommand::new(ctx, dbfile).execute(
                &mut stdout,
                &format,
                &serial,
                date.as_deref(),
            )?;
        }
        Commands::Serial { serialfile, create } => {
            SerialCommand::new(ctx, serialfile).execute(&mut stdout, &format, create)?;
        }
    }

    Ok(())
}
