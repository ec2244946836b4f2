use crate::error::{Result, ValidationError, ValidationErrors};
use crate::station::SurveyStation;

#[cfg(doc)]
use crate::CalculationOptions;

/// Checks that a station snapshot can be turned into a trajectory.
///
/// Every station is inspected and every problem collected, so a single call reports all of
/// them rather than stopping at the first.
///
/// The checks are:
///
/// - the snapshot contains at least one station (at least two with
///   [`TrajectoryValidator::requiring_interval`]);
/// - `md` is finite and non-negative;
/// - `md` strictly increases from one station to the next, reported at the later station;
/// - `inc` lies in [0°, 180°];
/// - `azi` lies in [0°, 360°).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrajectoryValidator {
    require_interval: bool,
}

impl TrajectoryValidator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a lone station is rejected with [`ValidationError::InsufficientStations`].
    ///
    /// By default a single station is valid and simply computes to the datum. See also
    /// [`CalculationOptions::require_interval`].
    #[must_use]
    pub fn requiring_interval(mut self, require_interval: bool) -> Self {
        self.require_interval = require_interval;
        self
    }

    /// Inspects `stations` without modifying them.
    pub fn validate(&self, stations: &[SurveyStation]) -> Result<()> {
        let minimum = if self.require_interval { 2 } else { 1 };
        let mut errors = Vec::new();

        if stations.len() < minimum {
            errors.push(ValidationError::InsufficientStations {
                found: stations.len(),
            });
        }

        for (index, station) in stations.iter().enumerate() {
            if !(station.md.is_finite() && station.md >= 0.) {
                errors.push(ValidationError::DepthOutOfRange {
                    index,
                    md: station.md,
                });
            }

            if index > 0 {
                let prev = &stations[index - 1];
                // a NaN depth on either side fails this too, which is what we want
                if !(station.md > prev.md) {
                    errors.push(ValidationError::NonIncreasingDepth { index });
                }
            }

            if !(0. ..=180.).contains(&station.inc) {
                errors.push(ValidationError::InclinationOutOfRange {
                    index,
                    inc: station.inc,
                });
            }

            if !(0. ..360.).contains(&station.azi) {
                errors.push(ValidationError::AzimuthOutOfRange {
                    index,
                    azi: station.azi,
                });
            }
        }

        match ValidationErrors::from_vec(errors) {
            None => Ok(()),
            Some(errors) => Err(errors),
        }
    }
}

/// Validates `stations` with the default [`TrajectoryValidator`].
pub fn validate(stations: &[SurveyStation]) -> Result<()> {
    TrajectoryValidator::default().validate(stations)
}
