use std::fmt;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A reason why a station snapshot cannot be turned into a trajectory.
///
/// Every variant that concerns a particular station carries that station's `index` in the
/// ordered input, so a caller can point the user at each offending row in one pass.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum ValidationError {
    #[error("not enough survey stations to compute a trajectory (got {found})")]
    InsufficientStations { found: usize },

    #[error("station {index}: measured depth {md} m is negative or not finite")]
    DepthOutOfRange { index: usize, md: f64 },

    #[error("station {index}: measured depth does not increase from the previous station")]
    NonIncreasingDepth { index: usize },

    #[error("station {index}: inclination {inc}° is outside [0°, 180°]")]
    InclinationOutOfRange { index: usize, inc: f64 },

    #[error("station {index}: azimuth {azi}° is outside [0°, 360°)")]
    AzimuthOutOfRange { index: usize, azi: f64 },

    /// The vertical-section reference azimuth is infinite or NaN.
    #[error("reference azimuth {azi}° is not a finite angle")]
    ReferenceAzimuthNotFinite { azi: f64 },

    /// The position the first station is seeded at has an infinite or NaN coordinate.
    #[error("tie-in position (TVD {tvd} m, N {north} m, E {east} m) is not finite")]
    TieInNotFinite { tvd: f64, north: f64, east: f64 },

    /// The course length into this station was not positive when the curvature step ran.
    ///
    /// Validation rules this out, so seeing it means a snapshot reached the step without
    /// having been validated.
    #[error("station {index}: course length from the previous station is not positive")]
    InvalidInterval { index: usize },
}

impl ValidationError {
    /// The index of the offending station, if the error concerns a single station.
    ///
    /// `None` for problems with the snapshot as a whole or with the calculation options.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        match *self {
            Self::InsufficientStations { .. }
            | Self::ReferenceAzimuthNotFinite { .. }
            | Self::TieInNotFinite { .. } => None,
            Self::DepthOutOfRange { index, .. }
            | Self::NonIncreasingDepth { index }
            | Self::InclinationOutOfRange { index, .. }
            | Self::AzimuthOutOfRange { index, .. }
            | Self::InvalidInterval { index } => Some(index),
        }
    }
}

/// Every problem found in one station snapshot.
///
/// Never empty: a snapshot without problems produces `Ok` instead.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    /// Wraps the collected errors, returning `None` if there are none.
    #[must_use]
    pub(crate) fn from_vec(errors: Vec<ValidationError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self(errors))
        }
    }

    pub(crate) fn single(error: ValidationError) -> Self {
        Self(vec![error])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; provided for symmetry with [`len`](Self::len).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[ValidationError] {
        &self.0
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<ValidationError> {
        self.0
    }

    /// Returns `true` if any error concerns the station at `index`.
    #[must_use]
    pub fn concerns(&self, index: usize) -> bool {
        self.0.iter().any(|e| e.index() == Some(index))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.0.len();
        write!(
            f,
            "{count} survey validation error{}",
            if count == 1 { "" } else { "s" }
        )?;
        for error in &self.0 {
            write!(f, "; {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        Self::single(error)
    }
}

/// The curvature step was handed two stations whose measured depths do not increase.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("course length {course_length} m is not positive")]
pub struct InvalidInterval {
    /// `curr.md - prev.md`, in meters.
    pub course_length: f64,
}

/// Result type for operations that validate a station snapshot.
pub type Result<T, E = ValidationErrors> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::{ValidationError, ValidationErrors};

    #[test]
    fn messages_name_the_station() {
        insta::assert_snapshot!(
            ValidationError::NonIncreasingDepth { index: 2 },
            @"station 2: measured depth does not increase from the previous station"
        );
        insta::assert_snapshot!(
            ValidationError::InclinationOutOfRange { index: 1, inc: 190. },
            @"station 1: inclination 190° is outside [0°, 180°]"
        );
        insta::assert_snapshot!(
            ValidationError::AzimuthOutOfRange { index: 0, azi: 400. },
            @"station 0: azimuth 400° is outside [0°, 360°)"
        );
    }

    #[test]
    fn collection_lists_every_error() {
        let errors = ValidationErrors::from_vec(vec![
            ValidationError::NonIncreasingDepth { index: 2 },
            ValidationError::AzimuthOutOfRange { index: 3, azi: 400. },
        ])
        .unwrap();

        assert_eq!(errors.len(), 2);
        assert!(errors.concerns(2));
        assert!(errors.concerns(3));
        assert!(!errors.concerns(0));
        insta::assert_snapshot!(
            errors,
            @"2 survey validation errors; station 2: measured depth does not increase from the previous station; station 3: azimuth 400° is outside [0°, 360°)"
        );
    }

    #[test]
    fn empty_collection_is_not_an_error() {
        assert_eq!(ValidationErrors::from_vec(Vec::new()), None);
    }

    #[test]
    fn insufficient_stations_has_no_index() {
        assert_eq!(
            ValidationError::InsufficientStations { found: 1 }.index(),
            None
        );
        assert_eq!(ValidationError::InvalidInterval { index: 4 }.index(), Some(4));
        assert_eq!(
            ValidationError::ReferenceAzimuthNotFinite { azi: f64::NAN }.index(),
            None
        );
    }

    #[test]
    fn option_messages() {
        insta::assert_snapshot!(
            ValidationError::ReferenceAzimuthNotFinite { azi: f64::INFINITY },
            @"reference azimuth inf° is not a finite angle"
        );
        insta::assert_snapshot!(
            ValidationError::TieInNotFinite { tvd: f64::NAN, north: 1.5, east: -2. },
            @"tie-in position (TVD NaN m, N 1.5 m, E -2 m) is not finite"
        );
    }
}
