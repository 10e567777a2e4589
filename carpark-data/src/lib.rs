//! Feed access and pipelines for car-park sync.
//!
//! Responsibilities:
//! - Fetch the URA facility and availability feeds behind the
//!   [`feed::FeedSource`] seam.
//! - Group facility rows into documents and upsert them ([`ingest`]).
//! - Merge live lot counts into existing documents ([`availability`]).
//! - Renew the API token and keep the credentials file current ([`token`],
//!   [`credentials`]).
//!
//! Boundaries:
//! - Domain types, the coordinate transform and the store seam live in
//!   `carpark-core`.
//! - Pipelines never abort on a single bad row; failures are collected in
//!   batch reports.
//!
//! Invariants:
//! - No global mutable state; sources and stores are passed in.

pub mod availability;
pub mod credentials;
pub mod feed;
pub mod ingest;
mod report;
pub mod token;


pub use availability::{AvailabilityReport, reconcile_availability, run_availability_update};
pub use credentials::{CredentialsError, CredentialsFile, StoredCredentials};
pub use ingest::{ExclusionSet, IngestReport, run_facility_ingest};
pub use report::{ItemError, ItemFailure};
pub use token::{AuthError, Token, renew_and_persist, renew_token};
