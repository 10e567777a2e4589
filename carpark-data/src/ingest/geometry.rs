//! Facility geometry: SVY21 coordinate strings to located, hashed positions.

use std::num::ParseFloatError;

use carpark_core::Location;
use carpark_core::spatial::{
    GeohashError, ProjectionError, project_to_geographic, spatial_hash,
};
use geo::Coord;
use thiserror::Error;

/// Errors raised while deriving a facility position from its geometry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// The coordinate string did not hold exactly two values.
    #[error("expected \"easting,northing\" but found {found} value(s) in {raw:?}")]
    WrongArity {
        /// Raw coordinate string.
        raw: String,
        /// Number of comma-separated values present.
        found: usize,
    },
    /// A value was not a number.
    #[error("coordinate {raw:?} is not numeric: {source}")]
    NotNumeric {
        /// Raw coordinate string.
        raw: String,
        /// Parser failure.
        #[source]
        source: ParseFloatError,
    },
    /// Reprojection failed.
    #[error(transparent)]
    Projection(#[from] ProjectionError),
    /// Spatial hashing failed.
    #[error(transparent)]
    Geohash(#[from] GeohashError),
}

/// Geographic position and spatial hash derived from one geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedGeometry {
    /// WGS84 position.
    pub location: Location,
    /// Geohash of `location`.
    pub spatial_hash: String,
}

/// Parse `"easting,northing"` into an SVY21 grid position in metres, with
/// `x` holding the easting and `y` the northing.
///
/// Surrounding whitespace on either value is ignored.
///
/// # Examples
/// ```
/// use carpark_data::ingest::parse_grid_coordinates;
///
/// let grid = parse_grid_coordinates(" 31045.6165, 31694.0055 ")?;
/// assert_eq!(grid.x, 31_045.6165);
/// assert_eq!(grid.y, 31_694.0055);
/// # Ok::<(), carpark_data::ingest::GeometryError>(())
/// ```
pub fn parse_grid_coordinates(raw: &str) -> Result<Coord<f64>, GeometryError> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    let [easting, northing] = parts.as_slice() else {
        return Err(GeometryError::WrongArity {
            raw: raw.to_owned(),
            found: parts.len(),
        });
    };
    let parse = |value: &str| {
        value
            .parse::<f64>()
            .map_err(|source| GeometryError::NotNumeric {
                raw: raw.to_owned(),
                source,
            })
    };
    Ok(Coord {
        x: parse(*easting)?,
        y: parse(*northing)?,
    })
}

/// Parse, reproject and hash a facility coordinate string.
pub fn locate(raw: &str) -> Result<LocatedGeometry, GeometryError> {
    let location = project_to_geographic(parse_grid_coordinates(raw)?)?;
    let spatial_hash = spatial_hash(location.latitude, location.longitude)?;
    Ok(LocatedGeometry {
        location,
        spatial_hash,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("31045.6165")]
    #[case("1,2,3")]
    #[case("")]
    fn wrong_arity_is_rejected(#[case] raw: &str) {
        let err = parse_grid_coordinates(raw).expect_err("arity");
        assert!(matches!(err, GeometryError::WrongArity { .. }));
    }

    #[rstest]
    #[case("abc,123")]
    #[case("123,")]
    fn non_numeric_values_are_rejected(#[case] raw: &str) {
        let err = parse_grid_coordinates(raw).expect_err("numeric");
        assert!(matches!(err, GeometryError::NotNumeric { .. }));
    }

    #[rstest]
    fn grid_position_keeps_easting_in_x() {
        let grid = parse_grid_coordinates("30000.5,40000.25").expect("parses");
        assert_eq!(grid, Coord { x: 30_000.5, y: 40_000.25 });
    }

    #[rstest]
    fn non_finite_values_fail_projection() {
        let err = locate("NaN,100").expect_err("non-finite");
        assert!(matches!(err, GeometryError::Projection(_)));
    }

    #[rstest]
    fn known_geometry_is_located() {
        let located = locate("31045.6165,31694.0055").expect("locates");
        assert!((located.location.longitude - 103.8607).abs() < 1.0e-3);
        assert!((located.location.latitude - 1.3029).abs() < 1.0e-3);
        assert!(located.spatial_hash.starts_with("w21z7"));
    }
}
