//! Geospatial derivations for facility locations.
//!
//! The URA feed reports positions on the SVY21 grid. [`project_to_geographic`]
//! converts them to WGS84 degrees and [`spatial_hash`] derives the geohash
//! stored alongside each facility.

mod geohash;
mod projection;

pub use geohash::{DEFAULT_PRECISION, GeohashError, MAX_PRECISION, encode_geohash, spatial_hash};
pub use projection::{
    ProjectionError, SVY21, TransverseMercator, project_to_geographic, project_to_grid,
};
