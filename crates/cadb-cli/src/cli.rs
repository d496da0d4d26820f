//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

/// cadb - certificate authority index database maintenance.
#[derive(Parser, Debug, Clone)]
#[command(name = "cadb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// JSON options file (suffixes, serial width, uniqueness default).
    #[arg(short, long, env = "CADB_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    pub format: Format,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum Format {
    /// Human-readable text.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Mark valid certificates past their expiration date as expired.
    ///
    /// The index is only rewritten when at least one record changed.
    Update {
        /// Index file.
        dbfile: PathBuf,

        /// Reference time (ASN.1 `YYMMDDHHMMSSZ`/`YYYYMMDDHHMMSSZ` or RFC 3339).
        /// Defaults to now.
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Load an index and check its serial and subject uniqueness.
    Verify {
        /// Index file.
        dbfile: PathBuf,
    },

    /// Show the status of a certificate.
    Status {
        /// Index file.
        dbfile: PathBuf,

        /// Serial number in hex.
        serial: String,
    },

    /// Revoke a certificate.
    Revoke {
        /// Index file.
        dbfile: PathBuf,

        /// Serial number in hex.
        serial: String,

        /// Revocation time. Defaults to now.
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Print the next serial and advance the serial file.
    Serial {
        /// Serial file.
        serialfile: PathBuf,

        /// Generate a random serial if the file does not exist.
        #[arg(long)]
        create: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_update_with_date() {
        let cli = Cli::parse_from(["cadb", "update", "index.txt", "--date", "210101000000Z"]);
        match cli.command {
            Commands::Update { dbfile, date } => {
                assert_eq!(dbfile, PathBuf::from("index.txt"));
                assert_eq!(date.as_deref(), Some("210101000000Z"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_flags() {
        let cli = Cli::parse_from(["cadb", "-vv", "--format", "json", "verify", "index.txt"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.format, Format::Json);
    }

    #[test]
    fn serial_create_flag() {
        let cli = Cli::parse_from(["cadb", "serial", "serial", "--create"]);
        assert!(matches!(cli.command, Commands::Serial { create: true, .. }));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
