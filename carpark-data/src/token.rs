//! Token renewal against the URA data service.

use std::fmt;

use log::info;
use serde_json::Value;
use thiserror::Error;

use crate::credentials::{CredentialsError, CredentialsFile};
use crate::feed::{FeedSource, TransportError};

/// Errors raised while renewing the API token.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The token endpoint could not be reached.
    #[error("token request failed: {0}")]
    Transport(#[from] TransportError),
    /// The response did not carry a token.
    #[error("token response carried no token (status: {status})")]
    MissingToken {
        /// `Status` field of the response, when present.
        status: String,
    },
    /// The token could not be stored.
    #[error(transparent)]
    Persist(#[from] CredentialsError),
}

/// A freshly issued API token.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    /// The token text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(<redacted>)")
    }
}

fn extract_token(payload: &Value) -> Result<Token, AuthError> {
    payload
        .get("Result")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| Token(token.to_owned()))
        .ok_or_else(|| AuthError::MissingToken {
            status: payload
                .get("Status")
                .and_then(Value::as_str)
                .unwrap_or("absent")
                .to_owned(),
        })
}

/// Request a new token using the source's access key.
///
/// # Examples
/// ```
/// # #[cfg(feature = "test-support")]
/// # fn main() {
/// use carpark_data::feed::{StubFeedSource, block_on_for_tests};
/// use carpark_data::token::renew_token;
/// use serde_json::json;
///
/// let source = StubFeedSource::default()
///     .with_token_payload(json!({"Status": "Success", "Result": "abc123"}));
/// let token = block_on_for_tests(renew_token(&source)).expect("token issued");
/// assert_eq!(token.as_str(), "abc123");
/// # }
/// # #[cfg(not(feature = "test-support"))]
/// # fn main() {}
/// ```
pub async fn renew_token<S: FeedSource + ?Sized>(source: &S) -> Result<Token, AuthError> {
    let payload = source.request_token().await?;
    let token = extract_token(&payload)?;
    info!("received a new token");
    Ok(token)
}

/// Renew the token and store it in `file`.
pub async fn renew_and_persist<S: FeedSource + ?Sized>(
    source: &S,
    file: &CredentialsFile,
) -> Result<Token, AuthError> {
    let token = renew_token(source).await?;
    file.persist_token(token.as_str())?;
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{StubFeedSource, block_on_for_tests};
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!({"Status": "Success", "Result": ""}))]
    #[case(json!({"Status": "Error", "Message": "Invalid access key"}))]
    #[case(json!({"Result": ["not", "a", "token"]}))]
    fn responses_without_token_are_rejected(#[case] payload: Value) {
        let source = StubFeedSource::default().with_token_payload(payload);
        let err = block_on_for_tests(renew_token(&source)).expect_err("no token");
        assert!(matches!(err, AuthError::MissingToken { .. }));
    }

    #[rstest]
    fn transport_failures_are_reported() {
        let source = StubFeedSource::default().failing_token_with_status(401);
        let err = block_on_for_tests(renew_token(&source)).expect_err("transport");
        assert!(matches!(
            err,
            AuthError::Transport(TransportError::Http { status: 401, .. })
        ));
    }

    #[rstest]
    fn renewal_does_not_touch_the_data_feeds() {
        let source = StubFeedSource::default()
            .with_token_payload(json!({"Status": "Success", "Result": "fresh"}));
        let token = block_on_for_tests(renew_token(&source)).expect("token issued");
        assert_eq!(token.as_str(), "fresh");
        assert!(source.calls().is_empty());
    }

    #[rstest]
    fn token_debug_is_redacted() {
        let token = Token("secret".into());
        assert_eq!(format!("{token:?}"), "Token(<redacted>)");
    }
}
