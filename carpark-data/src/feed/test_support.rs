//! Shared fixtures for feed tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;

use async_trait::async_trait;
use serde_json::Value;

use super::{FeedService, FeedSource, TransportError};

const STUB_URL: &str = "https://example.org/uraDataService";

#[derive(Debug, Clone)]
enum StubResponse {
    Payload(Value),
    Status(u16),
}

impl StubResponse {
    fn resolve(&self, url: &str) -> Result<Value, TransportError> {
        match self {
            Self::Payload(payload) => Ok(payload.clone()),
            Self::Status(status) => Err(TransportError::Http {
                url: url.to_owned(),
                status: *status,
                message: format!("stub responded with {status}"),
            }),
        }
    }
}

/// Stub [`FeedSource`] serving canned payloads from memory.
///
/// Services without a configured response answer with an empty envelope.
#[derive(Debug, Default)]
pub struct StubFeedSource {
    services: HashMap<FeedService, StubResponse>,
    token: Option<StubResponse>,
    calls: RefCell<Vec<FeedService>>,
}

impl StubFeedSource {
    /// Serve `payload` for `service`.
    #[must_use]
    pub fn with_payload(mut self, service: FeedService, payload: Value) -> Self {
        self.services
            .insert(service, StubResponse::Payload(payload));
        self
    }

    /// Serve `{"Status": "Success", "Result": rows}` for `service`.
    #[must_use]
    pub fn with_rows(self, service: FeedService, rows: Vec<Value>) -> Self {
        self.with_payload(
            service,
            serde_json::json!({"Status": "Success", "Result": rows}),
        )
    }

    /// Fail requests for `service` with an HTTP status.
    #[must_use]
    pub fn failing_with_status(mut self, service: FeedService, status: u16) -> Self {
        self.services.insert(service, StubResponse::Status(status));
        self
    }

    /// Serve `payload` for token requests.
    #[must_use]
    pub fn with_token_payload(mut self, payload: Value) -> Self {
        self.token = Some(StubResponse::Payload(payload));
        self
    }

    /// Fail token requests with an HTTP status.
    #[must_use]
    pub fn failing_token_with_status(mut self, status: u16) -> Self {
        self.token = Some(StubResponse::Status(status));
        self
    }

    /// Data services fetched so far, in call order. Token requests are not
    /// recorded.
    #[must_use]
    pub fn calls(&self) -> Vec<FeedService> {
        self.calls.borrow().clone()
    }
}

#[async_trait(?Send)]
impl FeedSource for StubFeedSource {
    async fn fetch(&self, service: FeedService) -> Result<Value, TransportError> {
        self.calls.borrow_mut().push(service);
        self.services.get(&service).map_or_else(
            || Ok(serde_json::json!({"Status": "Success", "Result": []})),
            |response| response.resolve(STUB_URL),
        )
    }

    async fn request_token(&self) -> Result<Value, TransportError> {
        self.token.as_ref().map_or_else(
            || Ok(serde_json::json!({"Status": "Success", "Result": "stub-token"})),
            |response| response.resolve(STUB_URL),
        )
    }
}

/// Drive `future` to completion on a fresh current-thread runtime.
///
/// # Panics
///
/// Panics when the runtime cannot be built.
pub fn block_on_for_tests<F: Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("build test runtime")
        .block_on(future)
}
