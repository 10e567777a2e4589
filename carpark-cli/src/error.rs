//! Error types emitted by the car-park sync CLI.
//!
//! Only failures that should end the process with a non-zero status are
//! represented here. Feed outages and per-facility write failures are logged
//! by the pipelines and do not surface as `CliError`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use carpark_core::DocumentStoreError;
use carpark_data::{AuthError, CredentialsError};
use thiserror::Error;

/// Errors emitted by the car-park sync CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A credential was supplied neither as an option nor in the credentials file.
    #[error("missing {field}: pass --{field} or set {key} in {path}")]
    MissingCredential {
        field: &'static str,
        key: &'static str,
        path: Utf8PathBuf,
    },
    /// The credentials file could not be read.
    #[error(transparent)]
    Credentials(#[from] CredentialsError),
    /// The async runtime could not be started.
    #[error("failed to start the async runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// The HTTP client could not be configured.
    #[error("failed to configure HTTP client for {base_url}: {source}")]
    BuildFeedSource {
        base_url: String,
        #[source]
        source: carpark_data::feed::SourceBuildError,
    },
    /// The database directory could not be created.
    #[error("failed to prepare the directory for {path}: {source}")]
    PrepareDatabase {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The document store could not be opened.
    #[error("failed to open document store at {path}: {source}")]
    OpenStore {
        path: Utf8PathBuf,
        #[source]
        source: DocumentStoreError,
    },
    /// Token renewal failed.
    #[error("token renewal failed: {0}")]
    Auth(#[from] AuthError),
}
