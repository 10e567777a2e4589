//! Error types produced by the URA feed source.

use std::io;

use thiserror::Error;

/// Transport-level errors encountered while issuing HTTP requests.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    /// The server returned an HTTP error status.
    #[error("request to {url} failed with status {status}: {message}")]
    Http {
        /// Fully qualified request URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Short error description supplied by the server.
        message: String,
    },
    /// The request failed due to an I/O error.
    #[error("network error contacting {url}: {source}")]
    Network {
        /// Fully qualified request URL.
        url: String,
        /// I/O error reported by the transport.
        source: io::Error,
    },
    /// The response body was not valid JSON.
    #[error("failed to decode response from {url}: {message}")]
    Decode {
        /// Fully qualified request URL.
        url: String,
        /// Decoder error description.
        message: String,
    },
}

/// A single feed row that could not be interpreted.
#[derive(Debug, Error)]
#[error("row {index} of the {service} feed is malformed: {source}")]
pub struct FeedRowError {
    /// Zero-based position of the row in the `Result` array.
    pub index: usize,
    /// Service the row was fetched from.
    pub service: super::FeedService,
    /// Deserialisation failure.
    #[source]
    pub source: serde_json::Error,
}

/// The HTTP client backing [`super::HttpFeedSource`] could not be built.
#[derive(Debug, Error)]
#[error("failed to build HTTP client: {0}")]
pub struct SourceBuildError(#[from] reqwest::Error);
