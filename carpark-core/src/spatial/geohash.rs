//! Base-32 geohash encoding.

use thiserror::Error;

/// Character count produced by [`spatial_hash`].
pub const DEFAULT_PRECISION: usize = 12;

/// Longest supported hash; 60 interleaved bits fit comfortably in `u64`.
pub const MAX_PRECISION: usize = 12;

const ALPHABET: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";
const BITS_PER_CHAR: usize = 5;

/// Errors raised when encoding a geohash.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeohashError {
    /// Latitude or longitude fell outside the valid range or was not finite.
    #[error("coordinate (lat {latitude}, lon {longitude}) is outside the valid range")]
    InvalidCoordinate { latitude: f64, longitude: f64 },
    /// Requested precision was zero or above [`MAX_PRECISION`].
    #[error("geohash precision {0} must be between 1 and {MAX_PRECISION}")]
    InvalidPrecision(usize),
}

/// Geohash of a WGS84 position at [`DEFAULT_PRECISION`].
///
/// # Examples
/// ```
/// use carpark_core::spatial::spatial_hash;
///
/// let hash = spatial_hash(57.64911, 10.40744)?;
/// assert_eq!(hash, "u4pruydqqvj8");
/// # Ok::<(), carpark_core::spatial::GeohashError>(())
/// ```
pub fn spatial_hash(latitude: f64, longitude: f64) -> Result<String, GeohashError> {
    encode_geohash(latitude, longitude, DEFAULT_PRECISION)
}

/// Geohash of a WGS84 position with an explicit character count.
pub fn encode_geohash(
    latitude: f64,
    longitude: f64,
    precision: usize,
) -> Result<String, GeohashError> {
    if precision == 0 || precision > MAX_PRECISION {
        return Err(GeohashError::InvalidPrecision(precision));
    }
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(GeohashError::InvalidCoordinate {
            latitude,
            longitude,
        });
    }

    let mut latitude_range = (-90.0_f64, 90.0_f64);
    let mut longitude_range = (-180.0_f64, 180.0_f64);
    let mut hash = String::with_capacity(precision);
    let mut chunk = 0_usize;
    let mut even_bit = true;

    for bit_index in 0..precision * BITS_PER_CHAR {
        let (range, value) = if even_bit {
            (&mut longitude_range, longitude)
        } else {
            (&mut latitude_range, latitude)
        };
        let mid = (range.0 + range.1) / 2.0;
        chunk <<= 1;
        if value >= mid {
            chunk |= 1;
            range.0 = mid;
        } else {
            range.1 = mid;
        }
        even_bit = !even_bit;

        if bit_index % BITS_PER_CHAR == BITS_PER_CHAR - 1 {
            if let Some(symbol) = ALPHABET.get(chunk) {
                hash.push(char::from(*symbol));
            }
            chunk = 0;
        }
    }
    Ok(hash)
}
