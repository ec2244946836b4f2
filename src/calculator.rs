use crate::error::{Result, ValidationError, ValidationErrors};
use crate::minimum_curvature;
use crate::station::{Position, SurveyStation};
use crate::util::BoundedAngle;
use crate::validation::TrajectoryValidator;
use tracing::{debug, trace};
use uom::si::f64::{Angle, Length};
use uom::si::{angle::degree, length::meter};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Knobs for a trajectory computation.
///
/// Deserializable from any serde format with every field optional, eg in YAML:
///
/// ```yaml
/// reference_azimuth: 37.5
/// tie_in:
///   tvd: 1450.2
///   north: -12.0
///   east: 88.4
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CalculationOptions {
    /// Azimuth, in degrees, of the plane that vertical section is projected onto.
    ///
    /// Any finite value is accepted and wrapped into [0°, 360°) when computing.
    pub reference_azimuth: f64,

    /// Position of the first station. Every coordinate must be finite.
    ///
    /// Zero for a survey that starts at the datum; the last computed position of the previous
    /// section when continuing one.
    pub tie_in: Position,

    /// Reject snapshots with fewer than two stations instead of computing a lone station to the
    /// tie-in.
    pub require_interval: bool,
}

impl CalculationOptions {
    /// Sets the vertical-section reference azimuth, normalized into [0°, 360°).
    ///
    /// A non-finite angle is kept as NaN and rejected when computing.
    #[must_use]
    pub fn with_reference_azimuth(mut self, azimuth: impl Into<Angle>) -> Self {
        self.reference_azimuth = BoundedAngle::new(azimuth).degrees();
        self
    }

    #[must_use]
    pub fn with_tie_in(mut self, tie_in: Position) -> Self {
        self.tie_in = tie_in;
        self
    }

    #[must_use]
    pub fn requiring_interval(mut self, require_interval: bool) -> Self {
        self.require_interval = require_interval;
        self
    }

    #[must_use]
    pub fn reference_azimuth(&self) -> Angle {
        Angle::new::<degree>(self.reference_azimuth)
    }

    /// Everything that keeps these options from being computed with, in field order.
    fn problems(&self) -> Vec<ValidationError> {
        let mut problems = Vec::new();
        if !self.reference_azimuth.is_finite() {
            problems.push(ValidationError::ReferenceAzimuthNotFinite {
                azi: self.reference_azimuth,
            });
        }
        let Position { tvd, north, east } = self.tie_in;
        if !(tvd.is_finite() && north.is_finite() && east.is_finite()) {
            problems.push(ValidationError::TieInNotFinite { tvd, north, east });
        }
        problems
    }
}

/// Headline numbers of a computed trajectory.
///
/// The `tvd` through `dls` fields repeat the outputs of the last station.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrajectorySummary {
    /// Measured depth of the last station.
    pub final_md: f64,
    pub tvd: f64,
    pub north: f64,
    pub east: f64,
    pub hd: f64,
    pub vs: f64,
    pub dls: f64,
    /// The most severe dogleg over all intervals, in degrees per 30 m.
    pub max_dls: f64,
    /// Index of the station that ends the interval with [`max_dls`](Self::max_dls).
    ///
    /// 0 when the survey contains no curvature at all.
    pub max_dls_index: usize,
    /// Measured depth covered from the first to the last station.
    pub total_md: f64,
}

impl TrajectorySummary {
    fn of(stations: &[SurveyStation]) -> Option<Self> {
        let first = stations.first()?;
        let last = stations.last()?;
        let (max_dls_index, max_dls) = stations
            .iter()
            .enumerate()
            .fold((0, 0.), |(best_index, best), (index, station)| {
                if station.dls > best {
                    (index, station.dls)
                } else {
                    (best_index, best)
                }
            });
        Some(Self {
            final_md: last.md,
            tvd: last.tvd,
            north: last.north,
            east: last.east,
            hd: last.hd,
            vs: last.vs,
            dls: last.dls,
            max_dls,
            max_dls_index,
            total_md: last.md - first.md,
        })
    }
}

/// A station snapshot with all outputs filled in.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ComputedTrajectory {
    stations: Vec<SurveyStation>,
    summary: TrajectorySummary,
    reference_azimuth: f64,
}

impl ComputedTrajectory {
    /// The input stations, in input order, with outputs populated.
    #[must_use]
    pub fn stations(&self) -> &[SurveyStation] {
        &self.stations
    }

    #[must_use]
    pub fn into_stations(self) -> Vec<SurveyStation> {
        self.stations
    }

    #[must_use]
    pub fn summary(&self) -> &TrajectorySummary {
        &self.summary
    }

    /// The azimuth vertical section was projected onto.
    #[must_use]
    pub fn reference_azimuth(&self) -> Angle {
        Angle::new::<degree>(self.reference_azimuth)
    }

    /// `(east, north)` of every station, for a plan-view plot.
    #[must_use]
    pub fn plan_view(&self) -> Vec<(f64, f64)> {
        self.stations
            .iter()
            .map(SurveyStation::plan_view_point)
            .collect()
    }

    /// `(hd, tvd)` of every station, for a side-view plot.
    #[must_use]
    pub fn section_view(&self) -> Vec<(f64, f64)> {
        self.stations
            .iter()
            .map(SurveyStation::section_view_point)
            .collect()
    }

    /// Stations whose incoming interval is more severe than `limit` degrees per 30 m.
    pub fn stations_exceeding_dls(
        &self,
        limit: f64,
    ) -> impl Iterator<Item = (usize, &SurveyStation)> + '_ {
        self.stations
            .iter()
            .enumerate()
            .filter(move |(_, station)| station.dls > limit)
    }

    /// A synthetic station at measured depth `md`, placed on the arc between the two stations
    /// that bracket it.
    ///
    /// Returns a copy of the surveyed station if `md` hits one exactly, and `None` if `md` lies
    /// outside the surveyed range. The synthetic station has no id, tool, or remarks, and
    /// reports the dogleg severity of the interval it lies in.
    #[must_use]
    pub fn interpolate_at(&self, md: impl Into<Length>) -> Option<SurveyStation> {
        let md = md.into().get::<meter>();
        let first = self.stations.first()?;
        let last = self.stations.last()?;
        if !(md >= first.md && md <= last.md) {
            return None;
        }

        let upper = self.stations.partition_point(|station| station.md < md);
        let next = self.stations.get(upper)?;
        if next.md == md {
            return Some(next.clone());
        }
        let prev = self.stations.get(upper.checked_sub(1)?)?;

        let fraction = (md - prev.md) / (next.md - prev.md);
        let along = minimum_curvature::along_arc(&prev.observation(), &next.observation(), fraction);
        let mut station = SurveyStation::builder()
            .measured_depth(Length::new::<meter>(md))
            .inclination(along.inclination)
            .azimuth(along.azimuth)
            .build();
        let step = minimum_curvature::step(&prev.observation(), &station.observation()).ok()?;

        station.set_outputs(
            Position::from_ned(prev.position().to_ned() + step.delta().to_ned()),
            self.reference_azimuth(),
            step.dls,
        );
        Some(station)
    }
}

/// Turns station snapshots into trajectories using the minimum curvature method.
///
/// The calculator holds only its [`CalculationOptions`]; every call recomputes the whole
/// snapshot from the tie-in, since each position depends on all the stations before it.
///
/// ```rust
/// use wellpath::{CalculationOptions, SurveyStation, TrajectoryCalculator, station::Components};
/// use uom::si::f64::{Angle, Length};
/// use uom::si::{angle::degree, length::meter};
///
/// let at = |md: f64, inc: f64, azi: f64| SurveyStation::build(Components {
///     measured_depth: Length::new::<meter>(md),
///     inclination: Angle::new::<degree>(inc),
///     azimuth: Angle::new::<degree>(azi),
/// });
///
/// let calculator = TrajectoryCalculator::new(
///     CalculationOptions::default().with_reference_azimuth(Angle::new::<degree>(45.)),
/// );
/// let trajectory = calculator
///     .compute(&[at(1000., 5.2, 45.3), at(1100., 6.5, 48.2), at(1200., 8.1, 52.4)])
///     .expect("survey is valid");
///
/// let bottom = trajectory.stations().last().unwrap();
/// assert!((bottom.tvd - 198.664).abs() < 1e-3);
/// assert!(trajectory.summary().max_dls > 0.5);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TrajectoryCalculator {
    options: CalculationOptions,
}

impl TrajectoryCalculator {
    #[must_use]
    pub fn new(options: CalculationOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn options(&self) -> &CalculationOptions {
        &self.options
    }

    /// The validator this calculator runs before computing.
    #[must_use]
    pub fn validator(&self) -> TrajectoryValidator {
        TrajectoryValidator::new().requiring_interval(self.options.require_interval)
    }

    /// Validates the options and `stations` and computes every station's outputs.
    ///
    /// On any validation error, all errors are returned and nothing is computed. Problems with
    /// the options are listed before problems with the stations.
    pub fn compute(&self, stations: &[SurveyStation]) -> Result<ComputedTrajectory> {
        let mut errors = self.options.problems();
        if let Err(station_errors) = self.validator().validate(stations) {
            errors.extend(station_errors);
        }
        if let Some(errors) = ValidationErrors::from_vec(errors) {
            debug!(
                stations = stations.len(),
                errors = errors.len(),
                "rejected survey snapshot"
            );
            return Err(errors);
        }

        let reference_azimuth = BoundedAngle::wrap_degrees(self.options.reference_azimuth);
        let reference = Angle::new::<degree>(reference_azimuth);
        let mut computed = stations.to_vec();
        let mut position = self.options.tie_in.to_ned();

        if let Some(first) = computed.first_mut() {
            first.set_outputs(Position::from_ned(position), reference, 0.);
        }
        for index in 1..computed.len() {
            let prev = computed[index - 1].observation();
            let curr = computed[index].observation();
            let step = minimum_curvature::step(&prev, &curr).map_err(|invalid| {
                debug!(index, course_length = invalid.course_length, "{invalid}");
                ValidationErrors::from(ValidationError::InvalidInterval { index })
            })?;

            position += step.delta().to_ned();
            trace!(
                index,
                md = computed[index].md,
                dogleg = step.dogleg.get::<degree>(),
                dls = step.dls,
                "accumulated survey interval"
            );
            computed[index].set_outputs(Position::from_ned(position), reference, step.dls);
        }

        let summary = TrajectorySummary::of(&computed).ok_or_else(|| {
            ValidationErrors::from(ValidationError::InsufficientStations { found: 0 })
        })?;
        debug!(
            stations = computed.len(),
            final_md = summary.final_md,
            max_dls = summary.max_dls,
            "computed trajectory"
        );

        Ok(ComputedTrajectory {
            stations: computed,
            summary,
            reference_azimuth,
        })
    }

    /// Like [`compute`](Self::compute), but writes the outputs back into `stations`.
    ///
    /// `stations` is only touched if the computation succeeds, so on error it still holds
    /// whatever outputs it had before.
    pub fn compute_in_place(&self, stations: &mut [SurveyStation]) -> Result<TrajectorySummary> {
        let computed = self.compute(stations)?;
        let summary = computed.summary;
        for (station, updated) in stations.iter_mut().zip(computed.stations) {
            *station = updated;
        }
        Ok(summary)
    }
}

/// Computes `stations` with the vertical section projected onto `reference_azimuth` and the
/// first station at the datum.
pub fn compute(
    stations: &[SurveyStation],
    reference_azimuth: impl Into<Angle>,
) -> Result<ComputedTrajectory> {
    TrajectoryCalculator::new(CalculationOptions::default().with_reference_azimuth(reference_azimuth))
        .compute(stations)
}
