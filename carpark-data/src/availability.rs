//! Availability reconciliation: merge live lot counts into facility documents.
//!
//! Each availability row touches exactly one nested field,
//! `availability.<lotType>.lotsAvailable`, on an existing facility document.
//! Rows for facilities that were never ingested fail individually without
//! creating documents.

use carpark_core::{CAR_PARKS, DocumentStore, FieldPath, LotCount, RawAvailabilityRow};
use log::{debug, error, info, warn};
use serde_json::Value;

use crate::feed::{FeedSource, fetch_availability_rows};
use crate::report::{ItemError, ItemFailure};

/// Outcome of one availability update run.
#[derive(Debug, Default)]
pub struct AvailabilityReport {
    /// Whether the feed could not be fetched at all.
    pub fetch_failed: bool,
    /// Rows decoded from the feed.
    pub fetched_rows: usize,
    /// Rows that could not be decoded.
    pub malformed_rows: usize,
    /// Lot counts written.
    pub updated: usize,
    /// Rows skipped for lacking a facility code or lot type.
    pub skipped: usize,
    /// Rows whose write failed.
    pub failures: Vec<ItemFailure>,
}

impl AvailabilityReport {
    /// Number of rows whose write failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Emit the summary through `log`.
    pub fn log_summary(&self) {
        if self.fetch_failed {
            warn!("availability feed could not be fetched; nothing was updated");
        }
        info!(
            "availability update: {} rows fetched ({} malformed), {} updated, {} skipped, \
             {} failed",
            self.fetched_rows,
            self.malformed_rows,
            self.updated,
            self.skipped,
            self.failed()
        );
    }
}

fn lots_available(code: &str, row: &RawAvailabilityRow) -> i64 {
    match row.lots_available() {
        LotCount::Count(count) => count,
        LotCount::Absent => 0,
        LotCount::Unparsable(raw) => {
            warn!("facility {code} reported unparsable lotsAvailable {raw}; recording 0");
            0
        }
    }
}

fn apply_row<S>(store: &mut S, code: &str, lot_type: &str, lots: i64) -> Result<(), ItemError>
where
    S: DocumentStore + ?Sized,
{
    let path = FieldPath::lots_available(lot_type)?;
    store.update_field(CAR_PARKS, code, &path, Value::from(lots))?;
    Ok(())
}

/// Apply availability `rows` to existing facility documents.
///
/// Rows missing `carparkNo` or `lotType` are skipped. Every other row is
/// attempted independently; failures are collected rather than aborting
/// the batch.
///
/// # Examples
/// ```
/// use carpark_core::test_support::MemoryDocumentStore;
/// use carpark_core::{CAR_PARKS, Document, DocumentStore, RawAvailabilityRow};
/// use carpark_data::availability::reconcile_availability;
/// use serde_json::json;
///
/// let mut store = MemoryDocumentStore::default();
/// let mut fields = Document::new();
/// fields.insert("carpark".into(), json!({"code": "A0004"}));
/// store.set_document(CAR_PARKS, "A0004", &fields).expect("seed");
///
/// let rows: Vec<RawAvailabilityRow> = serde_json::from_value(json!([
///     {"lotType": "C", "lotsAvailable": "3"},
///     {"carparkNo": "A0004", "lotType": "C", "lotsAvailable": "12"}
/// ]))
/// .expect("valid rows");
///
/// let report = reconcile_availability(&rows, &mut store);
/// assert_eq!((report.updated, report.skipped), (1, 1));
/// let stored = store.get_document(CAR_PARKS, "A0004").expect("read").expect("exists");
/// assert_eq!(stored["availability"]["C"]["lotsAvailable"], 12);
/// ```
pub fn reconcile_availability<S>(rows: &[RawAvailabilityRow], store: &mut S) -> AvailabilityReport
where
    S: DocumentStore + ?Sized,
{
    let mut report = AvailabilityReport {
        fetched_rows: rows.len(),
        ..AvailabilityReport::default()
    };

    for row in rows {
        let Some(code) = row.carpark_no() else {
            warn!("skipping availability row without carparkNo");
            report.skipped += 1;
            continue;
        };
        let Some(lot_type) = row.lot_type() else {
            warn!("skipping availability row for {code} without lotType");
            report.skipped += 1;
            continue;
        };
        let lots = lots_available(code, row);

        match apply_row(store, code, lot_type, lots) {
            Ok(()) => {
                debug!("updated {code} lot type {lot_type}: {lots} available");
                report.updated += 1;
            }
            Err(err) => {
                error!("failed to update {code} lot type {lot_type}: {err}");
                report.failures.push(ItemFailure::new(code, err));
            }
        }
    }
    report
}

/// Fetch the availability feed and reconcile it into `store`.
pub async fn run_availability_update<F, S>(source: &F, store: &mut S) -> AvailabilityReport
where
    F: FeedSource + ?Sized,
    S: DocumentStore + ?Sized,
{
    let batch = fetch_availability_rows(source).await;
    let mut report = reconcile_availability(&batch.rows, store);
    report.fetch_failed = batch.fetch_failed;
    report.malformed_rows = batch.malformed.len();
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use carpark_core::Document;
    use carpark_core::test_support::MemoryDocumentStore;
    use rstest::{fixture, rstest};

    use crate::feed::{FeedService, StubFeedSource, block_on_for_tests};
    use serde_json::json;

    fn rows(value: Value) -> Vec<RawAvailabilityRow> {
        serde_json::from_value(value).expect("valid rows")
    }

    #[fixture]
    fn seeded() -> MemoryDocumentStore {
        let mut store = MemoryDocumentStore::default();
        for code in ["A0004", "B0001"] {
            let mut fields = Document::new();
            fields.insert(
                "carpark".into(),
                json!({
                    "code": code,
                    "vehicleCategories": {"Car": {"capacity": 10, "rateSlots": []}}
                }),
            );
            store.set_document(CAR_PARKS, code, &fields).expect("seed");
        }
        store
    }

    fn lots(store: &MemoryDocumentStore, code: &str, lot: &str) -> Value {
        let document = store
            .get_document(CAR_PARKS, code)
            .expect("read")
            .expect("document exists");
        document["availability"][lot]["lotsAvailable"].clone()
    }

    #[rstest]
    fn update_touches_only_availability(mut seeded: MemoryDocumentStore) {
        let before = seeded.get_document(CAR_PARKS, "A0004").expect("read");
        let report = reconcile_availability(
            &rows(json!([{"carparkNo": "A0004", "lotType": "C", "lotsAvailable": "12"}])),
            &mut seeded,
        );
        assert_eq!(report.updated, 1);
        let after = seeded
            .get_document(CAR_PARKS, "A0004")
            .expect("read")
            .expect("exists");
        assert_eq!(after["availability"]["C"]["lotsAvailable"], 12);
        assert_eq!(
            Some(&after["carpark"]),
            before.as_ref().and_then(|doc| doc.get("carpark"))
        );
    }

    #[rstest]
    fn missing_code_does_not_block_later_rows(mut seeded: MemoryDocumentStore) {
        let report = reconcile_availability(
            &rows(json!([
                {"lotType": "C", "lotsAvailable": "1"},
                {"carparkNo": "B0001", "lotType": "M", "lotsAvailable": 4}
            ])),
            &mut seeded,
        );
        assert_eq!((report.skipped, report.updated), (1, 1));
        assert_eq!(lots(&seeded, "B0001", "M"), 4);
    }

    #[rstest]
    fn missing_lot_type_is_skipped(mut seeded: MemoryDocumentStore) {
        let report = reconcile_availability(
            &rows(json!([{"carparkNo": "A0004", "lotsAvailable": "1"}])),
            &mut seeded,
        );
        assert_eq!(report.skipped, 1);
        assert_eq!(seeded.write_count(), 2, "only the seed writes happened");
    }

    #[rstest]
    #[case(json!("n/a"))]
    #[case(Value::Null)]
    fn unusable_counts_record_zero(mut seeded: MemoryDocumentStore, #[case] count: Value) {
        let report = reconcile_availability(
            &rows(json!([{"carparkNo": "A0004", "lotType": "C", "lotsAvailable": count}])),
            &mut seeded,
        );
        assert_eq!(report.updated, 1);
        assert_eq!(lots(&seeded, "A0004", "C"), 0);
    }

    #[rstest]
    fn unknown_facility_fails_without_creating(mut seeded: MemoryDocumentStore) {
        let report = reconcile_availability(
            &rows(json!([
                {"carparkNo": "Z9999", "lotType": "C", "lotsAvailable": "5"},
                {"carparkNo": "A0004", "lotType": "C", "lotsAvailable": "6"}
            ])),
            &mut seeded,
        );
        assert_eq!(report.failed(), 1);
        assert_eq!(report.failures[0].key, "Z9999");
        assert!(matches!(
            report.failures[0].error,
            ItemError::Store(ref err) if err.is_not_found()
        ));
        assert_eq!(report.updated, 1);
        assert!(seeded.get_document(CAR_PARKS, "Z9999").expect("read").is_none());
    }

    #[rstest]
    fn store_failures_are_isolated(seeded: MemoryDocumentStore) {
        let mut store = seeded.failing_on("A0004");
        let report = reconcile_availability(
            &rows(json!([
                {"carparkNo": "A0004", "lotType": "C", "lotsAvailable": "5"},
                {"carparkNo": "B0001", "lotType": "C", "lotsAvailable": "6"}
            ])),
            &mut store,
        );
        assert_eq!((report.updated, report.failed()), (1, 1));
        assert_eq!(lots(&store, "B0001", "C"), 6);
    }

    #[rstest]
    fn scalar_availability_is_replaced_by_lot_map() {
        let mut store = MemoryDocumentStore::default();
        let mut document = Document::new();
        document.insert("carpark".into(), json!({"code": "A0004"}));
        document.insert("availability".into(), json!("stale"));
        store.insert(CAR_PARKS, "A0004", document);

        let report = reconcile_availability(
            &rows(json!([{"carparkNo": "A0004", "lotType": "C", "lotsAvailable": 9}])),
            &mut store,
        );
        assert_eq!(report.updated, 1);
        assert_eq!(lots(&store, "A0004", "C"), 9);
    }

    #[rstest]
    fn update_reads_only_the_availability_feed(mut seeded: MemoryDocumentStore) {
        let source = StubFeedSource::default().with_rows(
            FeedService::Availability,
            vec![json!({"carparkNo": "B0001", "lotType": "C", "lotsAvailable": "3"})],
        );
        let report = block_on_for_tests(run_availability_update(&source, &mut seeded));
        assert_eq!(report.updated, 1);
        assert_eq!(source.calls(), vec![FeedService::Availability]);
    }
}
