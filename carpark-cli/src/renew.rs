//! The `renew-token` command.

use camino::Utf8PathBuf;
use carpark_data::renew_and_persist;
use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use tokio::runtime::Runtime;

use crate::connection::{
    ConnectionArgs, ConnectionConfig, FeedSourceBuilder, HttpFeedSourceBuilder, TokenRequirement,
};
use crate::{ARG_ACCESS_KEY, ARG_BASE_URL, ARG_CREDENTIALS_FILE, ARG_USER_AGENT, CliError};

/// CLI arguments for the `renew-token` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Exchange the access key for a fresh daily token and store \
                 it as URA_TOKEN in the credentials file. Other lines of the \
                 file are left as they are.",
    about = "Renew the URA API token"
)]
#[ortho_config(prefix = "CARPARK")]
pub(crate) struct RenewTokenArgs {
    /// URA access key; falls back to `URA_ACCESS_KEY` in the credentials file.
    #[arg(long = ARG_ACCESS_KEY, value_name = "key")]
    #[serde(default)]
    pub(crate) access_key: Option<String>,
    /// Dotenv-style credentials file (default `.env`).
    #[arg(long = ARG_CREDENTIALS_FILE, value_name = "path")]
    #[serde(default)]
    pub(crate) credentials_file: Option<Utf8PathBuf>,
    /// Base URL of the URA data service.
    #[arg(long = ARG_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) base_url: Option<String>,
    /// User agent sent with every request.
    #[arg(long = ARG_USER_AGENT, value_name = "agent")]
    #[serde(default)]
    pub(crate) user_agent: Option<String>,
}

impl RenewTokenArgs {
    pub(crate) fn into_config(self) -> Result<ConnectionConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ConnectionConfig::try_from(merged)
    }
}

impl TryFrom<RenewTokenArgs> for ConnectionConfig {
    type Error = CliError;

    fn try_from(args: RenewTokenArgs) -> Result<Self, Self::Error> {
        ConnectionArgs {
            access_key: args.access_key,
            token: None,
            credentials_file: args.credentials_file,
            base_url: args.base_url,
            user_agent: args.user_agent,
        }
        .resolve(TokenRequirement::NotNeeded)
    }
}

pub(super) fn run_renew_token(runtime: &Runtime, args: RenewTokenArgs) -> Result<(), CliError> {
    run_renew_token_with(runtime, args, &HttpFeedSourceBuilder)
}

pub(super) fn run_renew_token_with(
    runtime: &Runtime,
    args: RenewTokenArgs,
    builder: &dyn FeedSourceBuilder,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    let source = builder.build(&config)?;
    runtime.block_on(renew_and_persist(source.as_ref(), &config.credentials_file))?;
    info!("stored a new token in {}", config.credentials_file.path());
    Ok(())
}
