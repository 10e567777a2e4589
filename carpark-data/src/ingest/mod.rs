//! Facility ingest: group the facility feed and upsert one document per code.
//!
//! Each facility is written as `{"carpark": FacilityDocument}` so sibling
//! top-level fields, notably `availability`, survive the overwrite.

use carpark_core::{CAR_PARKS, Document, DocumentStore, FacilityDocument, RawFacilityRow};
use log::{error, info, warn};

use crate::feed::{FeedSource, fetch_facility_rows};
use crate::report::{ItemError, ItemFailure};

mod geometry;
mod grouper;

pub use geometry::{GeometryError, LocatedGeometry, locate, parse_grid_coordinates};
pub use grouper::{
    DEFAULT_EXCLUDED_CODES, ExclusionSet, FacilityGrouper, GroupedFacilities, GroupingSummary,
    RowOutcome, group_facilities,
};

/// Top-level document field holding the facility attributes.
pub const CARPARK_FIELD: &str = "carpark";

/// Outcome of one facility ingest run.
#[derive(Debug, Default)]
pub struct IngestReport {
    /// Whether the feed could not be fetched at all.
    pub fetch_failed: bool,
    /// Rows decoded from the feed.
    pub fetched_rows: usize,
    /// Rows that could not be decoded.
    pub malformed_rows: usize,
    /// Row counts from grouping.
    pub grouping: GroupingSummary,
    /// Facility documents written.
    pub written: usize,
    /// Facilities whose write failed.
    pub failures: Vec<ItemFailure>,
}

impl IngestReport {
    /// Number of facilities whose write failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Emit the summary and each failure through `log`.
    pub fn log_summary(&self) {
        for failure in &self.failures {
            error!("facility {} was not written: {}", failure.key, failure.error);
        }
        if self.fetch_failed {
            warn!("facility feed could not be fetched; nothing was ingested");
        }
        info!(
            "facility ingest: {} rows fetched ({} malformed), {} accepted, {} excluded, \
             {} without code, {} without geometry, {} with invalid geometry, {} rejected; \
             {} facilities written, {} failed",
            self.fetched_rows,
            self.malformed_rows,
            self.grouping.accepted,
            self.grouping.excluded,
            self.grouping.missing_code,
            self.grouping.missing_geometry,
            self.grouping.invalid_geometry,
            self.grouping.rejected,
            self.written,
            self.failed()
        );
    }
}

/// Wrap `facility` as the top-level fields written to the store.
pub fn facility_fields(facility: &FacilityDocument) -> Result<Document, serde_json::Error> {
    let mut fields = Document::new();
    fields.insert(CARPARK_FIELD.to_owned(), serde_json::to_value(facility)?);
    Ok(fields)
}

fn write_facility<S>(store: &mut S, facility: &FacilityDocument) -> Result<(), ItemError>
where
    S: DocumentStore + ?Sized,
{
    let fields = facility_fields(facility)?;
    store.set_document(CAR_PARKS, &facility.code, &fields)?;
    Ok(())
}

/// Write grouped facilities, isolating failures per facility.
pub fn write_facilities<S>(grouped: GroupedFacilities, store: &mut S) -> IngestReport
where
    S: DocumentStore + ?Sized,
{
    let mut report = IngestReport {
        grouping: *grouped.summary(),
        ..IngestReport::default()
    };
    for facility in grouped.into_documents() {
        match write_facility(store, &facility) {
            Ok(()) => report.written += 1,
            Err(err) => report.failures.push(ItemFailure::new(facility.code, err)),
        }
    }
    report
}

/// Group `rows` and write the resulting facilities.
///
/// # Examples
/// ```
/// use carpark_core::test_support::MemoryDocumentStore;
/// use carpark_core::{CAR_PARKS, DocumentStore, RawFacilityRow};
/// use carpark_data::ingest::{ExclusionSet, ingest_rows};
/// use serde_json::json;
///
/// let rows: Vec<RawFacilityRow> = serde_json::from_value(json!([
///     {"ppCode": "A0004", "ppName": "ALIWAL STREET", "vehCat": "Car",
///      "parkCapacity": 69, "geometries": [{"coordinates": "31045.6165,31694.0055"}]},
///     {"ppCode": "K0025", "geometries": [{"coordinates": "30000,30000"}]}
/// ]))
/// .expect("valid rows");
///
/// let mut store = MemoryDocumentStore::default();
/// let report = ingest_rows(&rows, &ExclusionSet::default(), &mut store);
/// assert_eq!(report.written, 1);
///
/// let stored = store.get_document(CAR_PARKS, "A0004").expect("read").expect("written");
/// assert_eq!(stored["carpark"]["vehicleCategories"]["Car"]["capacity"], 69);
/// assert!(store.get_document(CAR_PARKS, "K0025").expect("read").is_none());
/// ```
pub fn ingest_rows<S>(
    rows: &[RawFacilityRow],
    exclusions: &ExclusionSet,
    store: &mut S,
) -> IngestReport
where
    S: DocumentStore + ?Sized,
{
    let grouped = group_facilities(rows, exclusions);
    let mut report = write_facilities(grouped, store);
    report.fetched_rows = rows.len();
    report
}

/// Fetch the facility feed and ingest it into `store`.
///
/// A failed fetch is logged and produces an empty report with
/// `fetch_failed` set; nothing is written.
pub async fn run_facility_ingest<F, S>(
    source: &F,
    exclusions: &ExclusionSet,
    store: &mut S,
) -> IngestReport
where
    F: FeedSource + ?Sized,
    S: DocumentStore + ?Sized,
{
    let batch = fetch_facility_rows(source).await;
    let mut report = ingest_rows(&batch.rows, exclusions, store);
    report.fetch_failed = batch.fetch_failed;
    report.malformed_rows = batch.malformed.len();
    report
}
