//! Fetching and decoding the URA car-park feeds.
#![forbid(unsafe_code)]

mod error;
mod payload;
mod source;

#[cfg(any(test, feature = "test-support"))]
mod test_support;
#[cfg(any(test, feature = "test-support"))]
pub use test_support::{StubFeedSource, block_on_for_tests};

pub use error::{FeedRowError, SourceBuildError, TransportError};
pub use payload::{FeedBatch, decode_rows, fetch_availability_rows, fetch_facility_rows};
pub use source::{
    DEFAULT_BASE_URL, DEFAULT_USER_AGENT, FeedCredentials, FeedService, FeedSource,
    HttpFeedSource, HttpFeedSourceConfig,
};
