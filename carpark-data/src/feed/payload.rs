//! Interpretation of URA response envelopes.

use log::{error, info, warn};
use serde::de::DeserializeOwned;
use serde_json::Value;

use carpark_core::{RawAvailabilityRow, RawFacilityRow};

use super::{FeedRowError, FeedService, FeedSource};

/// Rows decoded from one feed call.
#[derive(Debug)]
pub struct FeedBatch<T> {
    /// Service the rows came from.
    pub service: FeedService,
    /// Rows that deserialised, in source order.
    pub rows: Vec<T>,
    /// Rows that could not be interpreted.
    pub malformed: Vec<FeedRowError>,
    /// Whether the fetch itself failed and the batch is empty as a result.
    pub fetch_failed: bool,
}

impl<T> FeedBatch<T> {
    fn empty(service: FeedService, fetch_failed: bool) -> Self {
        Self {
            service,
            rows: Vec::new(),
            malformed: Vec::new(),
            fetch_failed,
        }
    }

    /// Whether the batch holds no usable rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Decode the `Result` array of a URA envelope.
///
/// A missing or non-array `Result` is treated as no data. Rows that fail to
/// deserialise are collected separately so the remaining rows still flow.
///
/// # Examples
/// ```
/// use carpark_core::RawAvailabilityRow;
/// use carpark_data::feed::{FeedService, decode_rows};
/// use serde_json::json;
///
/// let payload = json!({
///     "Status": "Success",
///     "Result": [
///         {"carparkNo": "A0004", "lotType": "C", "lotsAvailable": "12"},
///         "not a row"
///     ]
/// });
/// let batch = decode_rows::<RawAvailabilityRow>(FeedService::Availability, &payload);
/// assert_eq!(batch.rows.len(), 1);
/// assert_eq!(batch.malformed.len(), 1);
/// ```
pub fn decode_rows<T: DeserializeOwned>(service: FeedService, payload: &Value) -> FeedBatch<T> {
    let status = payload.get("Status").and_then(Value::as_str);
    if let Some(status) = status.filter(|status| !status.eq_ignore_ascii_case("success")) {
        let message = payload
            .get("Message")
            .and_then(Value::as_str)
            .unwrap_or_default();
        warn!("{service} responded with status {status}: {message}");
    }

    let Some(entries) = payload.get("Result").and_then(Value::as_array) else {
        warn!("{service} payload carried no Result array; treating as no data");
        return FeedBatch::empty(service, false);
    };

    let mut batch = FeedBatch::empty(service, false);
    for (index, entry) in entries.iter().enumerate() {
        match T::deserialize(entry) {
            Ok(row) => batch.rows.push(row),
            Err(source) => {
                let err = FeedRowError {
                    index,
                    service,
                    source,
                };
                warn!("{err}");
                batch.malformed.push(err);
            }
        }
    }
    batch
}

async fn fetch_rows<T, S>(source: &S, service: FeedService) -> FeedBatch<T>
where
    T: DeserializeOwned,
    S: FeedSource + ?Sized,
{
    match source.fetch(service).await {
        Ok(payload) => {
            let batch = decode_rows(service, &payload);
            info!(
                "fetched {} rows from {service} ({} malformed)",
                batch.rows.len(),
                batch.malformed.len()
            );
            batch
        }
        Err(err) => {
            error!("failed to fetch {service}: {err}");
            FeedBatch::empty(service, true)
        }
    }
}

/// Fetch and decode the facility feed.
///
/// Transport failures are logged and yield an empty batch.
pub async fn fetch_facility_rows<S: FeedSource + ?Sized>(source: &S) -> FeedBatch<RawFacilityRow> {
    fetch_rows(source, FeedService::FacilityDetails).await
}

/// Fetch and decode the availability feed.
///
/// Transport failures are logged and yield an empty batch.
pub async fn fetch_availability_rows<S: FeedSource + ?Sized>(
    source: &S,
) -> FeedBatch<RawAvailabilityRow> {
    fetch_rows(source, FeedService::Availability).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::test_support::{StubFeedSource, block_on_for_tests};
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!({}))]
    #[case(json!({"Result": "none"}))]
    #[case(json!({"Status": "Error", "Message": "Invalid token"}))]
    fn missing_result_is_no_data(#[case] payload: Value) {
        let batch = decode_rows::<RawFacilityRow>(FeedService::FacilityDetails, &payload);
        assert!(batch.is_empty());
        assert!(batch.malformed.is_empty());
        assert!(!batch.fetch_failed);
    }

    #[rstest]
    fn rows_without_code_are_malformed() {
        let payload = json!({"Result": [
            {"ppName": "NO CODE"},
            {"ppCode": "A0001"},
            {"ppCode": " ", "ppName": "BLANK CODE"}
        ]});
        let batch = decode_rows::<RawFacilityRow>(FeedService::FacilityDetails, &payload);
        assert_eq!(batch.rows.len(), 1);
        let indices: Vec<usize> = batch.malformed.iter().map(|err| err.index).collect();
        assert_eq!(indices, vec![0, 2]);
    }

    #[rstest]
    fn transport_failure_yields_empty_batch() {
        let source = StubFeedSource::default().failing_with_status(FeedService::Availability, 503);
        let batch = block_on_for_tests(fetch_availability_rows(&source));
        assert!(batch.is_empty());
        assert!(batch.fetch_failed);
    }

    #[rstest]
    fn successful_fetch_decodes_rows() {
        let source = StubFeedSource::default().with_payload(
            FeedService::Availability,
            json!({"Result": [{"carparkNo": "A0004", "lotType": "C", "lotsAvailable": "7"}]}),
        );
        let batch = block_on_for_tests(fetch_availability_rows(&source));
        assert_eq!(batch.rows.len(), 1);
        assert_eq!(batch.rows[0].carpark_no(), Some("A0004"));
    }
}
