//! Row shapes of the URA facility and availability feeds.
//!
//! The feeds are loosely typed: integers occasionally arrive as strings and
//! optional attributes are simply omitted. These types accept that shape and
//! leave validation to the pipelines.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::RateSlot;

/// Geometry entry attached to a facility row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawGeometry {
    /// Projected coordinates encoded as `"easting,northing"`.
    #[serde(default)]
    pub coordinates: Option<String>,
}

/// One row of the facility feed: facility × vehicle category × rate period.
///
/// # Examples
/// ```
/// use carpark_core::RawFacilityRow;
///
/// let row: RawFacilityRow = serde_json::from_str(
///     r#"{
///         "ppCode": "A0004",
///         "ppName": "ALIWAL STREET ",
///         "vehCat": "Car",
///         "parkCapacity": "69",
///         "geometries": [{"coordinates": "31045.6165,31694.0055"}],
///         "startTime": "08.30 AM",
///         "weekdayRate": "$0.50"
///     }"#,
/// )
/// .expect("valid row");
///
/// assert_eq!(row.pp_code, "A0004");
/// assert_eq!(row.park_capacity, Some(69));
/// assert_eq!(row.first_coordinates(), Some("31045.6165,31694.0055"));
/// assert_eq!(row.rate.weekday_rate.as_deref(), Some("$0.50"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFacilityRow {
    #[serde(deserialize_with = "required_code")]
    pub pp_code: String,
    #[serde(default)]
    pub pp_name: Option<String>,
    #[serde(default)]
    pub parking_system: Option<String>,
    #[serde(default)]
    pub geometries: Option<Vec<RawGeometry>>,
    #[serde(default)]
    pub veh_cat: Option<String>,
    #[serde(default, deserialize_with = "lenient_integer")]
    pub park_capacity: Option<i64>,
    #[serde(flatten)]
    pub rate: RateSlot,
}

impl RawFacilityRow {
    /// Coordinates of the first geometry, when present and non-blank.
    #[must_use]
    pub fn first_coordinates(&self) -> Option<&str> {
        self.geometries
            .as_deref()?
            .first()?
            .coordinates
            .as_deref()
            .map(str::trim)
            .filter(|coordinates| !coordinates.is_empty())
    }
}

/// One row of the availability feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAvailabilityRow {
    #[serde(default)]
    pub carpark_no: Option<String>,
    #[serde(default)]
    pub lot_type: Option<String>,
    #[serde(default)]
    pub lots_available: Option<Value>,
}

/// Interpretation of a raw `lotsAvailable` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LotCount {
    /// The value parsed as an integer.
    Count(i64),
    /// The field was missing or null.
    Absent,
    /// The field held something that is not an integer.
    Unparsable(String),
}

impl LotCount {
    /// Coerce to an integer, treating absent or unparsable values as zero.
    #[must_use]
    pub const fn or_zero(&self) -> i64 {
        match self {
            Self::Count(count) => *count,
            Self::Absent | Self::Unparsable(_) => 0,
        }
    }
}

impl RawAvailabilityRow {
    /// Facility code, ignoring blank values.
    #[must_use]
    pub fn carpark_no(&self) -> Option<&str> {
        non_blank(self.carpark_no.as_deref())
    }

    /// Lot type, ignoring blank values.
    #[must_use]
    pub fn lot_type(&self) -> Option<&str> {
        non_blank(self.lot_type.as_deref())
    }

    /// Classify the raw `lotsAvailable` value.
    ///
    /// # Examples
    /// ```
    /// use carpark_core::{LotCount, RawAvailabilityRow};
    /// use serde_json::json;
    ///
    /// let row = RawAvailabilityRow {
    ///     lots_available: Some(json!("42")),
    ///     ..RawAvailabilityRow::default()
    /// };
    /// assert_eq!(row.lots_available(), LotCount::Count(42));
    /// assert_eq!(RawAvailabilityRow::default().lots_available(), LotCount::Absent);
    /// ```
    #[must_use]
    pub fn lots_available(&self) -> LotCount {
        match &self.lots_available {
            None | Some(Value::Null) => LotCount::Absent,
            Some(value) => coerce_integer(value)
                .map_or_else(|| LotCount::Unparsable(value.to_string()), LotCount::Count),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.trim().is_empty())
}

/// Magnitude below which an integral `f64` converts to `i64` exactly enough.
const I64_FLOAT_LIMIT: f64 = 9.0e18;

/// Interpret a JSON value as an integer.
///
/// Accepts integral numbers and strings holding an integer, surrounding
/// whitespace allowed. Everything else yields `None`.
#[must_use]
pub fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|float| float.fract() == 0.0 && float.abs() < I64_FLOAT_LIMIT)
                .map(|float| float as i64)
        }),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn required_code<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let code = String::deserialize(deserializer)?;
    if code.trim().is_empty() {
        return Err(serde::de::Error::custom("facility code is blank"));
    }
    Ok(code)
}

fn lenient_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(coerce_integer))
}
