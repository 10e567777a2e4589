//! Transverse Mercator reprojection between SVY21 grid and WGS84 degrees.
//!
//! Uses the Snyder series expansions (USGS Professional Paper 1395), which
//! are accurate to well under a millimetre across Singapore's extent.

use geo::Coord;
use thiserror::Error;

use crate::Location;

/// Errors raised by [`TransverseMercator`] conversions.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ProjectionError {
    /// An input ordinate was NaN or infinite.
    #[error("coordinate ({first}, {second}) is not finite")]
    NonFinite { first: f64, second: f64 },
    /// The projected point fell outside valid geographic ranges.
    #[error("projected coordinate ({longitude}, {latitude}) is out of range")]
    OutOfRange { longitude: f64, latitude: f64 },
}

/// Ellipsoid and projection parameters for a transverse Mercator grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransverseMercator {
    /// Semi-major axis in metres.
    pub semi_major_axis: f64,
    /// Inverse flattening.
    pub inverse_flattening: f64,
    /// Latitude of origin in degrees.
    pub origin_latitude: f64,
    /// Central meridian in degrees.
    pub origin_longitude: f64,
    /// Scale factor on the central meridian.
    pub scale_factor: f64,
    /// False easting in metres.
    pub false_easting: f64,
    /// False northing in metres.
    pub false_northing: f64,
}

/// SVY21 grid on the WGS84 ellipsoid, as published by the Singapore Land
/// Authority (`+proj=tmerc +lat_0=1.366666 +lon_0=103.833333 +k=1
/// +x_0=28001.642 +y_0=38744.572 +ellps=WGS84`).
pub const SVY21: TransverseMercator = TransverseMercator {
    semi_major_axis: 6_378_137.0,
    inverse_flattening: 298.257_223_563,
    origin_latitude: 1.366_666,
    origin_longitude: 103.833_333,
    scale_factor: 1.0,
    false_easting: 28_001.642,
    false_northing: 38_744.572,
};

impl Default for TransverseMercator {
    fn default() -> Self {
        SVY21
    }
}

impl TransverseMercator {
    fn eccentricity_squared(&self) -> f64 {
        let flattening = 1.0 / self.inverse_flattening;
        2.0 * flattening - flattening * flattening
    }

    /// Meridian arc length from the equator to `latitude` (radians).
    fn meridian_arc(&self, latitude: f64) -> f64 {
        let e2 = self.eccentricity_squared();
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        self.semi_major_axis
            * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * latitude
                - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * latitude).sin()
                + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * latitude).sin()
                - (35.0 * e6 / 3072.0) * (6.0 * latitude).sin())
    }

    /// Convert a grid position (`x` easting, `y` northing, in metres) to
    /// geographic longitude and latitude.
    ///
    /// # Examples
    /// ```
    /// use carpark_core::spatial::SVY21;
    /// use geo::Coord;
    ///
    /// let origin = SVY21.to_geographic(Coord { x: 28_001.642, y: 38_744.572 })?;
    /// assert!((origin.longitude - 103.833_333).abs() < 1e-9);
    /// assert!((origin.latitude - 1.366_666).abs() < 1e-9);
    /// # Ok::<(), carpark_core::spatial::ProjectionError>(())
    /// ```
    pub fn to_geographic(&self, grid: Coord<f64>) -> Result<Location, ProjectionError> {
        let Coord {
            x: easting,
            y: northing,
        } = grid;
        if !easting.is_finite() || !northing.is_finite() {
            return Err(ProjectionError::NonFinite {
                first: easting,
                second: northing,
            });
        }

        let e2 = self.eccentricity_squared();
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        let ep2 = e2 / (1.0 - e2);
        let k0 = self.scale_factor;
        let a = self.semi_major_axis;

        let arc = self.meridian_arc(self.origin_latitude.to_radians())
            + (northing - self.false_northing) / k0;
        let mu = arc / (a * (1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));
        let root = (1.0 - e2).sqrt();
        let e1 = (1.0 - root) / (1.0 + root);
        let footpoint = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1.powi(2) / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

        let (sin_fp, cos_fp) = footpoint.sin_cos();
        let tan_fp = sin_fp / cos_fp;
        let c1 = ep2 * cos_fp * cos_fp;
        let t1 = tan_fp * tan_fp;
        let denominator = 1.0 - e2 * sin_fp * sin_fp;
        let n1 = a / denominator.sqrt();
        let r1 = a * (1.0 - e2) / denominator.powf(1.5);
        let d = (easting - self.false_easting) / (n1 * k0);

        let latitude = footpoint
            - (n1 * tan_fp / r1)
                * (d.powi(2) / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d.powi(4) / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                        - 252.0 * ep2
                        - 3.0 * c1 * c1)
                        * d.powi(6)
                        / 720.0);
        let longitude_offset = (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1)
                * d.powi(5)
                / 120.0)
            / cos_fp;

        let location = Location::from(Coord {
            x: self.origin_longitude + longitude_offset.to_degrees(),
            y: latitude.to_degrees(),
        });
        if (-180.0..=180.0).contains(&location.longitude)
            && (-90.0..=90.0).contains(&location.latitude)
        {
            Ok(location)
        } else {
            Err(ProjectionError::OutOfRange {
                longitude: location.longitude,
                latitude: location.latitude,
            })
        }
    }

    /// Convert a geographic location to a grid position.
    pub fn to_grid(&self, location: Location) -> Result<Coord<f64>, ProjectionError> {
        let Coord {
            x: longitude,
            y: latitude,
        } = Coord::from(location);
        if !longitude.is_finite() || !latitude.is_finite() {
            return Err(ProjectionError::NonFinite {
                first: longitude,
                second: latitude,
            });
        }

        let e2 = self.eccentricity_squared();
        let ep2 = e2 / (1.0 - e2);
        let k0 = self.scale_factor;
        let phi = latitude.to_radians();
        let (sin_phi, cos_phi) = phi.sin_cos();
        let n = self.semi_major_axis / (1.0 - e2 * sin_phi * sin_phi).sqrt();
        let t = (sin_phi / cos_phi).powi(2);
        let c = ep2 * cos_phi * cos_phi;
        let big_a = (longitude - self.origin_longitude).to_radians() * cos_phi;
        let arc = self.meridian_arc(phi);
        let arc_origin = self.meridian_arc(self.origin_latitude.to_radians());

        let easting = self.false_easting
            + k0 * n
                * (big_a
                    + (1.0 - t + c) * big_a.powi(3) / 6.0
                    + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * big_a.powi(5) / 120.0);
        let northing = self.false_northing
            + k0 * (arc - arc_origin
                + n * (sin_phi / cos_phi)
                    * (big_a.powi(2) / 2.0
                        + (5.0 - t + 9.0 * c + 4.0 * c * c) * big_a.powi(4) / 24.0
                        + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * big_a.powi(6)
                            / 720.0));
        Ok(Coord {
            x: easting,
            y: northing,
        })
    }
}

/// Reproject an SVY21 grid position to WGS84 using [`SVY21`].
pub fn project_to_geographic(grid: Coord<f64>) -> Result<Location, ProjectionError> {
    SVY21.to_geographic(grid)
}

/// Project a WGS84 location onto the SVY21 grid.
pub fn project_to_grid(location: Location) -> Result<Coord<f64>, ProjectionError> {
    SVY21.to_grid(location)
}
