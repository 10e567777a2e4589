//! Core domain types for the car-park sync pipelines.
//!
//! This crate holds the data model shared by the ingest and availability
//! pipelines, the SVY21 → WGS84 coordinate transform with its geohash
//! derivation, and the [`DocumentStore`] persistence seam.
//!
//! Raw feed rows ([`RawFacilityRow`], [`RawAvailabilityRow`]) mirror the URA
//! JSON payloads. The ingest pipeline folds facility rows into one
//! [`FacilityDocument`] per facility code; the availability pipeline writes
//! lot counts beside it through [`DocumentStore::update_field`].

#![cfg_attr(docsrs, feature(doc_cfg))]

mod facility;
mod raw;
pub mod spatial;
pub mod store;

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;

pub use facility::{FacilityDocument, Location, RateSlot, UNCATEGORISED, VehicleCategory};
pub use raw::{LotCount, RawAvailabilityRow, RawFacilityRow, RawGeometry, coerce_integer};
#[cfg(feature = "store-sqlite")]
pub use store::SqliteDocumentStore;
pub use store::{CAR_PARKS, Document, DocumentStore, DocumentStoreError, FieldPath, FieldPathError};
