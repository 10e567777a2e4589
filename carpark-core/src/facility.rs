//! Normalised per-facility documents produced by the ingest pipeline.
//!
//! A [`FacilityDocument`] is the nested form of the flat URA facility feed:
//! one document per facility code, with rate slots grouped by vehicle
//! category. Maps are key-sorted so serialising the same document twice
//! yields identical bytes.

use std::collections::BTreeMap;

use geo::Coord;
use serde::{Deserialize, Serialize};

/// Bucket name used for rows that carry no vehicle category.
pub const UNCATEGORISED: &str = "null";

/// Geographic WGS84 position in degrees.
///
/// # Examples
/// ```
/// use carpark_core::Location;
/// use geo::Coord;
///
/// let location = Location::new(103.85, 1.29);
/// let coord: Coord<f64> = location.into();
/// assert_eq!(coord.x, 103.85);
/// assert_eq!(coord.y, 1.29);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub longitude: f64,
    pub latitude: f64,
}

impl Location {
    /// Construct a location from longitude and latitude in degrees.
    #[must_use]
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }
}

impl From<Location> for Coord<f64> {
    fn from(location: Location) -> Self {
        Self {
            x: location.longitude,
            y: location.latitude,
        }
    }
}

impl From<Coord<f64>> for Location {
    fn from(coord: Coord<f64>) -> Self {
        Self::new(coord.x, coord.y)
    }
}

/// One time-windowed pricing rule, copied verbatim from the source row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateSlot {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub weekday_rate: Option<String>,
    pub satday_rate: Option<String>,
    #[serde(rename = "sunPHRate")]
    pub sun_ph_rate: Option<String>,
    pub weekday_min: Option<String>,
    pub satday_min: Option<String>,
    #[serde(rename = "sunPHMin")]
    pub sun_ph_min: Option<String>,
}

/// Capacity and accumulated rate slots for one vehicle category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleCategory {
    /// Lot capacity; the last row seen for the category wins.
    pub capacity: Option<i64>,
    /// Rate slots in the order rows were encountered.
    pub rate_slots: Vec<RateSlot>,
}

/// Normalised car-park facility.
///
/// Identity fields (`code`, `name`, `parking_system`, `location`,
/// `spatial_hash`) are fixed when the document is created; only
/// `vehicle_categories` grows afterwards.
///
/// # Examples
/// ```
/// use carpark_core::{FacilityDocument, Location, RateSlot};
///
/// let mut facility = FacilityDocument::new(
///     "A0004",
///     "  ALIWAL STREET ",
///     Some("B".into()),
///     Location::new(103.859, 1.302),
///     "w21z8x",
/// );
/// facility.record_rate(Some("Car"), Some(42), RateSlot::default());
/// facility.record_rate(Some("Car"), Some(40), RateSlot::default());
///
/// assert_eq!(facility.name, "ALIWAL STREET");
/// let car = &facility.vehicle_categories["Car"];
/// assert_eq!(car.capacity, Some(40));
/// assert_eq!(car.rate_slots.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityDocument {
    pub code: String,
    pub name: String,
    pub parking_system: Option<String>,
    pub location: Location,
    pub spatial_hash: String,
    pub vehicle_categories: BTreeMap<String, VehicleCategory>,
}

impl FacilityDocument {
    /// Create a document with its identity fields and no vehicle categories.
    ///
    /// The name is trimmed of surrounding whitespace.
    pub fn new(
        code: impl Into<String>,
        name: &str,
        parking_system: Option<String>,
        location: Location,
        spatial_hash: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.trim().to_owned(),
            parking_system,
            location,
            spatial_hash: spatial_hash.into(),
            vehicle_categories: BTreeMap::new(),
        }
    }

    /// Record one rate row for `category`.
    ///
    /// Capacity is overwritten and the slot appended. Rows without a
    /// category are kept under [`UNCATEGORISED`].
    pub fn record_rate(&mut self, category: Option<&str>, capacity: Option<i64>, slot: RateSlot) {
        let key = category.unwrap_or(UNCATEGORISED);
        let entry = self.vehicle_categories.entry(key.to_owned()).or_default();
        entry.capacity = capacity;
        entry.rate_slots.push(slot);
    }

    /// Total number of rate slots across all categories.
    #[must_use]
    pub fn rate_slot_count(&self) -> usize {
        self.vehicle_categories
            .values()
            .map(|category| category.rate_slots.len())
            .sum()
    }
}
