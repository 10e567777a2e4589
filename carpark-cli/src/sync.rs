//! The `ingest` and `availability` commands.

use camino::{Utf8Path, Utf8PathBuf};
use carpark_core::SqliteDocumentStore;
use carpark_data::{
    AvailabilityReport, ExclusionSet, IngestReport, run_availability_update, run_facility_ingest,
};
use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use tokio::runtime::Runtime;

use crate::connection::{
    ConnectionArgs, ConnectionConfig, FeedSourceBuilder, HttpFeedSourceBuilder, TokenRequirement,
};
use crate::{
    ARG_ACCESS_KEY, ARG_BASE_URL, ARG_CREDENTIALS_FILE, ARG_DATABASE, ARG_EXCLUDE, ARG_TOKEN,
    ARG_USER_AGENT, CliError, DEFAULT_DATABASE,
};

/// CLI arguments for the `ingest` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Fetch the facility details feed, group rate rows into one \
                 document per car park and upsert them into the document \
                 store. Previously written availability is preserved.",
    about = "Refresh car-park facility documents"
)]
#[ortho_config(prefix = "CARPARK")]
pub(crate) struct IngestArgs {
    /// URA access key; falls back to `URA_ACCESS_KEY` in the credentials file.
    #[arg(long = ARG_ACCESS_KEY, value_name = "key")]
    #[serde(default)]
    pub(crate) access_key: Option<String>,
    /// Daily API token; falls back to `URA_TOKEN` in the credentials file.
    #[arg(long = ARG_TOKEN, value_name = "token")]
    #[serde(default)]
    pub(crate) token: Option<String>,
    /// Dotenv-style credentials file (default `.env`).
    #[arg(long = ARG_CREDENTIALS_FILE, value_name = "path")]
    #[serde(default)]
    pub(crate) credentials_file: Option<Utf8PathBuf>,
    /// SQLite document store (default `car_parks.db`).
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Base URL of the URA data service.
    #[arg(long = ARG_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) base_url: Option<String>,
    /// User agent sent with every request.
    #[arg(long = ARG_USER_AGENT, value_name = "agent")]
    #[serde(default)]
    pub(crate) user_agent: Option<String>,
    /// Facility code to skip; repeat to list several. Replaces the default
    /// exclusion set.
    #[arg(long = ARG_EXCLUDE, value_name = "code")]
    #[serde(default)]
    pub(crate) exclude: Option<Vec<String>>,
}

/// CLI arguments for the `availability` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Fetch the availability feed and record the lot count for \
                 each facility and lot type. Facilities missing from the \
                 store are reported and left absent.",
    about = "Update live lot availability"
)]
#[ortho_config(prefix = "CARPARK")]
pub(crate) struct AvailabilityArgs {
    /// URA access key; falls back to `URA_ACCESS_KEY` in the credentials file.
    #[arg(long = ARG_ACCESS_KEY, value_name = "key")]
    #[serde(default)]
    pub(crate) access_key: Option<String>,
    /// Daily API token; falls back to `URA_TOKEN` in the credentials file.
    #[arg(long = ARG_TOKEN, value_name = "token")]
    #[serde(default)]
    pub(crate) token: Option<String>,
    /// Dotenv-style credentials file (default `.env`).
    #[arg(long = ARG_CREDENTIALS_FILE, value_name = "path")]
    #[serde(default)]
    pub(crate) credentials_file: Option<Utf8PathBuf>,
    /// SQLite document store (default `car_parks.db`).
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Base URL of the URA data service.
    #[arg(long = ARG_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) base_url: Option<String>,
    /// User agent sent with every request.
    #[arg(long = ARG_USER_AGENT, value_name = "agent")]
    #[serde(default)]
    pub(crate) user_agent: Option<String>,
}

/// Resolved configuration shared by the two sync commands.
#[derive(Debug, Clone)]
pub(crate) struct SyncConfig {
    pub(crate) connection: ConnectionConfig,
    pub(crate) database: Utf8PathBuf,
}

/// Resolved `ingest` configuration.
#[derive(Debug, Clone)]
pub(crate) struct IngestConfig {
    pub(crate) sync: SyncConfig,
    pub(crate) exclusions: ExclusionSet,
}

impl IngestArgs {
    pub(crate) fn into_config(self) -> Result<IngestConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        IngestConfig::try_from(merged)
    }
}

impl AvailabilityArgs {
    pub(crate) fn into_config(self) -> Result<SyncConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        SyncConfig::try_from(merged)
    }
}

impl TryFrom<IngestArgs> for IngestConfig {
    type Error = CliError;

    fn try_from(args: IngestArgs) -> Result<Self, Self::Error> {
        let exclusions = args
            .exclude
            .map_or_else(ExclusionSet::default, |codes| codes.into_iter().collect());
        let connection = ConnectionArgs {
            access_key: args.access_key,
            token: args.token,
            credentials_file: args.credentials_file,
            base_url: args.base_url,
            user_agent: args.user_agent,
        };
        Ok(Self {
            sync: SyncConfig::resolve(connection, args.database)?,
            exclusions,
        })
    }
}

impl TryFrom<AvailabilityArgs> for SyncConfig {
    type Error = CliError;

    fn try_from(args: AvailabilityArgs) -> Result<Self, Self::Error> {
        let connection = ConnectionArgs {
            access_key: args.access_key,
            token: args.token,
            credentials_file: args.credentials_file,
            base_url: args.base_url,
            user_agent: args.user_agent,
        };
        Self::resolve(connection, args.database)
    }
}

impl SyncConfig {
    fn resolve(
        connection: ConnectionArgs,
        database: Option<Utf8PathBuf>,
    ) -> Result<Self, CliError> {
        Ok(Self {
            connection: connection.resolve(TokenRequirement::Required)?,
            database: database.unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATABASE)),
        })
    }
}

fn open_store(path: &Utf8Path) -> Result<SqliteDocumentStore, CliError> {
    carpark_fs::ensure_parent_dir(path).map_err(|source| CliError::PrepareDatabase {
        path: path.to_path_buf(),
        source,
    })?;
    SqliteDocumentStore::open(path.as_std_path()).map_err(|source| CliError::OpenStore {
        path: path.to_path_buf(),
        source,
    })
}

pub(super) fn run_ingest(runtime: &Runtime, args: IngestArgs) -> Result<(), CliError> {
    run_ingest_with(runtime, args, &HttpFeedSourceBuilder).map(|_| ())
}

pub(super) fn run_ingest_with(
    runtime: &Runtime,
    args: IngestArgs,
    builder: &dyn FeedSourceBuilder,
) -> Result<IngestReport, CliError> {
    let config = args.into_config()?;
    let source = builder.build(&config.sync.connection)?;
    let mut store = open_store(&config.sync.database)?;
    info!(
        "ingesting facilities into {} ({} excluded codes)",
        config.sync.database,
        config.exclusions.len()
    );
    let report = runtime.block_on(run_facility_ingest(
        source.as_ref(),
        &config.exclusions,
        &mut store,
    ));
    report.log_summary();
    Ok(report)
}

pub(super) fn run_availability(runtime: &Runtime, args: AvailabilityArgs) -> Result<(), CliError> {
    run_availability_with(runtime, args, &HttpFeedSourceBuilder).map(|_| ())
}

pub(super) fn run_availability_with(
    runtime: &Runtime,
    args: AvailabilityArgs,
    builder: &dyn FeedSourceBuilder,
) -> Result<AvailabilityReport, CliError> {
    let config = args.into_config()?;
    let source = builder.build(&config.connection)?;
    let mut store = open_store(&config.database)?;
    info!("updating availability in {}", config.database);
    let report = runtime.block_on(run_availability_update(source.as_ref(), &mut store));
    report.log_summary();
    Ok(report)
}

#[cfg(test)]
pub(crate) fn ingest_config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<IngestConfig, CliError> {
    let merged = IngestArgs::merge_from_layers(layers).map_err(CliError::from)?;
    IngestConfig::try_from(merged)
}
