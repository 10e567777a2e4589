//! Facade crate for the car-park sync workspace.
//!
//! This crate re-exports the domain types and the document store seam from
//! `carpark-core`, and the feed pipelines from `carpark-data` behind the
//! `pipelines` feature.

#![forbid(unsafe_code)]

pub use carpark_core::{
    CAR_PARKS, Document, DocumentStore, DocumentStoreError, FacilityDocument, FieldPath,
    FieldPathError, Location, RateSlot, VehicleCategory,
};

#[cfg(feature = "store-sqlite")]
pub use carpark_core::SqliteDocumentStore;

#[cfg(feature = "pipelines")]
pub use carpark_data::{
    AuthError, AvailabilityReport, CredentialsFile, ExclusionSet, IngestReport, Token,
    reconcile_availability, renew_and_persist, run_availability_update, run_facility_ingest,
};
