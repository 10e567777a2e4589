//! HTTP access to the URA data service.

use std::{fmt, io, time::Duration};

use async_trait::async_trait;
use log::debug;
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;

use super::{SourceBuildError, TransportError};

/// Default URA data service endpoint.
pub const DEFAULT_BASE_URL: &str = "https://www.ura.gov.sg/uraDataService";

/// Default user agent for URA requests.
pub const DEFAULT_USER_AGENT: &str = "carpark-sync/0.1";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

const ACCESS_KEY_HEADER: &str = "AccessKey";
const TOKEN_HEADER: &str = "Token";
const INVOKE_PATH: &str = "invokeUraDS";
const TOKEN_PATH: &str = "insertNewToken.action";

/// Datasets published by the URA data service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedService {
    /// Static facility attributes and rate line items.
    FacilityDetails,
    /// Current lot availability per facility and lot type.
    Availability,
}

impl FeedService {
    /// Value of the `service` query parameter.
    #[must_use]
    pub const fn as_query(self) -> &'static str {
        match self {
            Self::FacilityDetails => "Car_Park_Details",
            Self::Availability => "Car_Park_Availability",
        }
    }
}

impl fmt::Display for FeedService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_query())
    }
}

/// Source of raw URA payloads.
///
/// Both calls return the decoded JSON envelope untouched; interpreting the
/// `Result` field is left to the callers.
#[async_trait(?Send)]
pub trait FeedSource {
    /// Fetch the payload for `service`.
    async fn fetch(&self, service: FeedService) -> Result<Value, TransportError>;
    /// Exchange the access key for a fresh token.
    async fn request_token(&self) -> Result<Value, TransportError>;
}

/// Configuration for [`HttpFeedSource`].
#[derive(Debug, Clone)]
pub struct HttpFeedSourceConfig {
    /// Base URL of the data service.
    pub base_url: String,
    /// Request timeout duration.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for HttpFeedSourceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl HttpFeedSourceConfig {
    /// Create a configuration with the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.trim_end_matches('/'))
    }
}

/// Credentials presented to the data service.
#[derive(Clone)]
pub struct FeedCredentials {
    /// Long-lived access key issued by URA.
    pub access_key: String,
    /// Daily token; required for dataset calls, not for renewal.
    pub token: Option<String>,
}

impl fmt::Debug for FeedCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedCredentials")
            .field("access_key", &"<redacted>")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// [`FeedSource`] backed by `reqwest`.
#[derive(Debug)]
pub struct HttpFeedSource {
    client: Client,
    config: HttpFeedSourceConfig,
    credentials: FeedCredentials,
}

impl HttpFeedSource {
    /// Build a source with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SourceBuildError`] when the HTTP client cannot be built.
    pub fn with_config(
        config: HttpFeedSourceConfig,
        credentials: FeedCredentials,
    ) -> Result<Self, SourceBuildError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            client,
            config,
            credentials,
        })
    }

    fn authorised(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder
            .header(ACCEPT, "*/*")
            .header(ACCESS_KEY_HEADER, self.credentials.access_key.as_str());
        match &self.credentials.token {
            Some(token) => builder.header(TOKEN_HEADER, token.as_str()),
            None => builder,
        }
    }

    async fn get_json(&self, builder: RequestBuilder, url: &str) -> Result<Value, TransportError> {
        let response = builder
            .send()
            .await
            .map_err(|err| convert_reqwest_error(err, url))?
            .error_for_status()
            .map_err(|err| convert_reqwest_error(err, url))?;
        response
            .json::<Value>()
            .await
            .map_err(|err| TransportError::Decode {
                url: url.to_owned(),
                message: err.to_string(),
            })
    }
}

#[async_trait(?Send)]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self, service: FeedService) -> Result<Value, TransportError> {
        let url = self.config.endpoint(INVOKE_PATH);
        debug!("fetching {service} from {url}");
        let builder = self
            .authorised(self.client.get(&url))
            .query(&[("service", service.as_query())]);
        self.get_json(builder, &url).await
    }

    async fn request_token(&self) -> Result<Value, TransportError> {
        let url = self.config.endpoint(TOKEN_PATH);
        debug!("requesting a new token from {url}");
        let builder = self
            .client
            .get(&url)
            .header(ACCEPT, "*/*")
            .header(ACCESS_KEY_HEADER, self.credentials.access_key.as_str());
        self.get_json(builder, &url).await
    }
}

fn convert_reqwest_error(error: reqwest::Error, url: &str) -> TransportError {
    if let Some(status) = error.status() {
        return TransportError::Http {
            url: url.to_owned(),
            status: status.as_u16(),
            message: error.to_string(),
        };
    }

    let kind = if error.is_timeout() {
        io::ErrorKind::TimedOut
    } else {
        io::ErrorKind::Other
    };
    TransportError::Network {
        url: url.to_owned(),
        source: io::Error::new(kind, error),
    }
}
