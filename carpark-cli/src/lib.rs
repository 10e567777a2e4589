//! Command-line interface for car-park sync.
//!
//! Three subcommands share one set of connection options:
//! - `ingest` refreshes facility documents from the facility feed;
//! - `availability` records live lot counts on existing documents;
//! - `renew-token` exchanges the access key for a new daily token.
//!
//! Feed outages and per-facility failures are logged and leave the exit
//! status at zero. Configuration, store and token errors are returned as
//! [`CliError`].
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod connection;
mod error;
mod renew;
mod sync;

pub use error::CliError;
use renew::RenewTokenArgs;
use sync::{AvailabilityArgs, IngestArgs};

pub(crate) const ARG_ACCESS_KEY: &str = "access-key";
pub(crate) const ARG_TOKEN: &str = "token";
pub(crate) const ARG_CREDENTIALS_FILE: &str = "credentials-file";
pub(crate) const ARG_DATABASE: &str = "database";
pub(crate) const ARG_BASE_URL: &str = "base-url";
pub(crate) const ARG_USER_AGENT: &str = "user-agent";
pub(crate) const ARG_EXCLUDE: &str = "exclude";
pub(crate) const DEFAULT_DATABASE: &str = "car_parks.db";

/// Run the car-park sync CLI with the current process arguments and
/// environment.
///
/// Argument errors, including `--help` and `--version` requests, are returned
/// as [`CliError::ArgumentParsing`]; callers should let clap report them with
/// [`clap::Error::exit`].
pub fn run() -> Result<(), CliError> {
    let cli = parse_cli(std::env::args_os())?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    match cli.command {
        Command::Ingest(args) => sync::run_ingest(&runtime, args),
        Command::Availability(args) => sync::run_availability(&runtime, args),
        Command::RenewToken(args) => renew::run_renew_token(&runtime, args),
    }
}

fn parse_cli<I, T>(args: I) -> Result<Cli, CliError>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args).map_err(CliError::ArgumentParsing)
}

#[derive(Debug, Parser)]
#[command(
    name = "carpark",
    about = "Synchronise URA car-park facilities and availability into a document store",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Refresh facility documents from the facility details feed.
    Ingest(IngestArgs),
    /// Record live lot availability on stored facilities.
    Availability(AvailabilityArgs),
    /// Renew the daily API token and store it in the credentials file.
    RenewToken(RenewTokenArgs),
}

#[cfg(test)]
mod tests;
