//! Typed nested field paths.

use std::{fmt, str::FromStr};

use thiserror::Error;

/// Errors raised when building a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldPathError {
    /// No segments were supplied.
    #[error("field path must contain at least one segment")]
    Empty,
    /// A segment was empty.
    #[error("field path segment {index} is empty")]
    EmptySegment {
        /// Zero-based position of the empty segment.
        index: usize,
    },
}

/// Non-empty sequence of map keys addressing a nested field.
///
/// Segments are kept separately so keys containing dots (lot types come from
/// upstream data) are never re-split. [`FromStr`] accepts the dotted form for
/// configuration and tests.
///
/// # Examples
///
/// ```
/// use carpark_core::FieldPath;
///
/// let path: FieldPath = "availability.C.lotsAvailable".parse()?;
/// assert_eq!(path.segments(), ["availability", "C", "lotsAvailable"]);
/// assert_eq!(path.to_string(), "availability.C.lotsAvailable");
/// # Ok::<(), carpark_core::FieldPathError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Build a path from individual segments.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, FieldPathError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(FieldPathError::Empty);
        }
        if let Some(index) = segments.iter().position(String::is_empty) {
            return Err(FieldPathError::EmptySegment { index });
        }
        Ok(Self { segments })
    }

    /// Path of the availability count for `lot_type`.
    pub fn lots_available(lot_type: &str) -> Result<Self, FieldPathError> {
        Self::from_segments(["availability", lot_type, "lotsAvailable"])
    }

    /// The individual keys, outermost first.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl FromStr for FieldPath {
    type Err = FieldPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(FieldPathError::Empty);
        }
        Self::from_segments(s.split('.'))
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", FieldPathError::Empty)]
    #[case("availability..lotsAvailable", FieldPathError::EmptySegment { index: 1 })]
    #[case("availability.", FieldPathError::EmptySegment { index: 1 })]
    fn rejects_malformed_paths(#[case] input: &str, #[case] expected: FieldPathError) {
        assert_eq!(input.parse::<FieldPath>(), Err(expected));
    }

    #[rstest]
    fn lot_types_with_dots_stay_single_segments() {
        let path = FieldPath::lots_available("H.V").expect("valid path");
        assert_eq!(path.segments().len(), 3);
        assert_eq!(path.segments()[1], "H.V");
    }

    #[rstest]
    fn empty_segment_list_is_rejected() {
        let result = FieldPath::from_segments(Vec::<String>::new());
        assert_eq!(result, Err(FieldPathError::Empty));
    }
}
