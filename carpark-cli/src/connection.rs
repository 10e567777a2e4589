//! Resolution of the options every command shares.

use camino::Utf8PathBuf;
use carpark_data::credentials::{ACCESS_KEY_VAR, DEFAULT_CREDENTIALS_FILE, TOKEN_VAR};
use carpark_data::feed::{FeedCredentials, FeedSource, HttpFeedSource, HttpFeedSourceConfig};
use carpark_data::CredentialsFile;

use crate::{ARG_ACCESS_KEY, ARG_TOKEN, CliError};

/// Connection options after configuration layering, before the credentials
/// file fallback is applied.
#[derive(Debug, Clone, Default)]
pub(crate) struct ConnectionArgs {
    pub(crate) access_key: Option<String>,
    pub(crate) token: Option<String>,
    pub(crate) credentials_file: Option<Utf8PathBuf>,
    pub(crate) base_url: Option<String>,
    pub(crate) user_agent: Option<String>,
}

/// Whether a command needs the daily token in addition to the access key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenRequirement {
    Required,
    NotNeeded,
}

/// Fully resolved connection settings.
#[derive(Debug, Clone)]
pub(crate) struct ConnectionConfig {
    pub(crate) credentials_file: CredentialsFile,
    pub(crate) credentials: FeedCredentials,
    pub(crate) source: HttpFeedSourceConfig,
}

impl ConnectionArgs {
    /// Fill missing credentials from the credentials file and build the
    /// source configuration.
    pub(crate) fn resolve(self, token: TokenRequirement) -> Result<ConnectionConfig, CliError> {
        let credentials_file = CredentialsFile::new(
            self.credentials_file
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_CREDENTIALS_FILE)),
        );
        let stored = credentials_file.load()?;
        let missing = |field, key| CliError::MissingCredential {
            field,
            key,
            path: credentials_file.path().to_path_buf(),
        };

        let access_key = non_blank(self.access_key)
            .or_else(|| non_blank(stored.access_key))
            .ok_or_else(|| missing(ARG_ACCESS_KEY, ACCESS_KEY_VAR))?;
        let resolved_token = match token {
            TokenRequirement::Required => Some(
                non_blank(self.token)
                    .or_else(|| non_blank(stored.token))
                    .ok_or_else(|| missing(ARG_TOKEN, TOKEN_VAR))?,
            ),
            TokenRequirement::NotNeeded => None,
        };

        let mut source = self
            .base_url
            .map_or_else(HttpFeedSourceConfig::default, HttpFeedSourceConfig::new);
        if let Some(user_agent) = self.user_agent {
            source = source.with_user_agent(user_agent);
        }

        Ok(ConnectionConfig {
            credentials_file,
            credentials: FeedCredentials {
                access_key,
                token: resolved_token,
            },
            source,
        })
    }
}

/// Builds the feed source used by one command invocation.
pub(crate) trait FeedSourceBuilder {
    fn build(&self, connection: &ConnectionConfig) -> Result<Box<dyn FeedSource>, CliError>;
}

/// Builds [`HttpFeedSource`] instances against the live data service.
pub(crate) struct HttpFeedSourceBuilder;

impl FeedSourceBuilder for HttpFeedSourceBuilder {
    fn build(&self, connection: &ConnectionConfig) -> Result<Box<dyn FeedSource>, CliError> {
        let source =
            HttpFeedSource::with_config(connection.source.clone(), connection.credentials.clone())
                .map_err(|source| CliError::BuildFeedSource {
                    base_url: connection.source.base_url.clone(),
                    source,
                })?;
        Ok(Box::new(source))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}
