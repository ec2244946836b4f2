use crate::calculator::{CalculationOptions, TrajectoryCalculator, TrajectorySummary};
use crate::error::Result;
use crate::station::{Position, SurveyStation};
use chrono::{DateTime, Utc};
use std::fmt::{self, Display, Formatter};
use tracing::debug;
use uom::si::f64::Angle;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The survey calculation method used to place stations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CalculationMethod {
    #[default]
    MinimumCurvature,
}

impl Display for CalculationMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::MinimumCurvature => f.write_str("Minimum Curvature"),
        }
    }
}

/// Whether the outputs stored on a [`TrajectoryCalculation`] can be trusted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CalculationState {
    /// Never successfully computed.
    #[default]
    Draft,
    /// Outputs match the current stations.
    Computed,
    /// Stations or settings changed since the last successful computation.
    Stale,
}

/// A named computation run over the stations of one well section.
///
/// This is the record a storage layer keeps: the inputs, the settings they were computed with,
/// the last successful outputs, and audit timestamps. Every edit goes through a method here so
/// that the [`CalculationState`] always says whether the outputs still match the inputs:
///
/// ```rust
/// use wellpath::{CalculationState, SurveyStation, TrajectoryCalculation, station::Components};
/// use uom::si::f64::{Angle, Length};
/// use uom::si::{angle::degree, length::meter};
///
/// let at = |md: f64, inc: f64, azi: f64| SurveyStation::build(Components {
///     measured_depth: Length::new::<meter>(md),
///     inclination: Angle::new::<degree>(inc),
///     azimuth: Angle::new::<degree>(azi),
/// });
///
/// let mut calculation = TrajectoryCalculation::new("WELL-7 / 8.5in");
/// calculation.push_station(at(1000., 5.2, 45.3));
/// calculation.push_station(at(1100., 6.5, 48.2));
/// calculation.recompute().expect("stations are valid");
/// assert!(calculation.is_current());
///
/// calculation.push_station(at(1200., 8.1, 52.4));
/// assert_eq!(calculation.state(), CalculationState::Stale);
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrajectoryCalculation {
    /// Opaque reference to the well or section this run belongs to.
    pub well_section: String,
    method: CalculationMethod,
    reference_azimuth: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    tie_in: Position,
    stations: Vec<SurveyStation>,
    #[cfg_attr(feature = "serde", serde(default))]
    description: String,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    created_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[cfg_attr(feature = "serde", serde(default))]
    computed_at: Option<DateTime<Utc>>,
    #[cfg_attr(feature = "serde", serde(default))]
    state: CalculationState,
    #[cfg_attr(feature = "serde", serde(default))]
    summary: Option<TrajectorySummary>,
}

impl TrajectoryCalculation {
    /// An empty [`CalculationState::Draft`] calculation for `well_section`.
    #[must_use]
    pub fn new(well_section: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            well_section: well_section.into(),
            method: CalculationMethod::default(),
            reference_azimuth: 0.,
            tie_in: Position::zero(),
            stations: Vec::new(),
            description: String::new(),
            created_by: None,
            created_at: now,
            updated_at: now,
            computed_at: None,
            state: CalculationState::Draft,
            summary: None,
        }
    }

    /// Records who created this calculation.
    #[must_use]
    pub fn with_created_by(mut self, created_by: impl Into<String>) -> Self {
        self.created_by = Some(created_by.into());
        self
    }

    /// Seeds the first station at `tie_in` instead of the datum.
    #[must_use]
    pub fn with_tie_in(mut self, tie_in: Position) -> Self {
        self.tie_in = tie_in;
        self
    }

    #[must_use]
    pub fn method(&self) -> CalculationMethod {
        self.method
    }

    #[must_use]
    pub fn reference_azimuth(&self) -> Angle {
        self.options().reference_azimuth()
    }

    #[must_use]
    pub fn tie_in(&self) -> Position {
        self.tie_in
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn created_by(&self) -> Option<&str> {
        self.created_by.as_deref()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When the inputs were last changed.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// When the last successful computation ran.
    #[must_use]
    pub fn computed_at(&self) -> Option<DateTime<Utc>> {
        self.computed_at
    }

    #[must_use]
    pub fn state(&self) -> CalculationState {
        self.state
    }

    /// Returns `true` if the stored outputs belong to the current stations and settings.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.state == CalculationState::Computed
    }

    /// The stations in their stored order.
    ///
    /// Their outputs are only meaningful while [`is_current`](Self::is_current) holds.
    #[must_use]
    pub fn stations(&self) -> &[SurveyStation] {
        &self.stations
    }

    /// The summary of the last successful computation, even if it has since gone stale.
    #[must_use]
    pub fn summary(&self) -> Option<&TrajectorySummary> {
        self.summary.as_ref()
    }

    /// The options a [`recompute`](Self::recompute) will run with.
    #[must_use]
    pub fn options(&self) -> CalculationOptions {
        CalculationOptions {
            reference_azimuth: self.reference_azimuth,
            tie_in: self.tie_in,
            require_interval: false,
        }
    }

    pub fn push_station(&mut self, station: SurveyStation) {
        self.stations.push(station);
        self.touch();
    }

    /// Inserts `station` before the station at `index`.
    ///
    /// Returns `false`, and changes nothing, if `index` is past the end.
    pub fn insert_station(&mut self, index: usize, station: SurveyStation) -> bool {
        if index > self.stations.len() {
            return false;
        }
        self.stations.insert(index, station);
        self.touch();
        true
    }

    /// Replaces the station at `index`, returning the one it replaced.
    pub fn update_station(&mut self, index: usize, station: SurveyStation) -> Option<SurveyStation> {
        let slot = self.stations.get_mut(index)?;
        let previous = std::mem::replace(slot, station);
        self.touch();
        Some(previous)
    }

    pub fn remove_station(&mut self, index: usize) -> Option<SurveyStation> {
        if index >= self.stations.len() {
            return None;
        }
        let removed = self.stations.remove(index);
        self.touch();
        Some(removed)
    }

    /// Orders the stations by measured depth, for lists that were entered out of order.
    ///
    /// Stations with equal depth keep their relative order, and will still fail validation.
    pub fn sort_by_depth(&mut self) {
        self.stations.sort_by(|a, b| a.md.total_cmp(&b.md));
        self.touch();
    }

    pub fn set_reference_azimuth(&mut self, azimuth: impl Into<Angle>) {
        self.reference_azimuth = self
            .options()
            .with_reference_azimuth(azimuth)
            .reference_azimuth;
        self.touch();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
        self.touch();
    }

    /// Recomputes every station from scratch.
    ///
    /// On success the outputs, summary, and `computed_at` are replaced and the calculation
    /// becomes [`CalculationState::Computed`]. On failure nothing changes, so a stale
    /// calculation stays stale with its previous outputs.
    pub fn recompute(&mut self) -> Result<&TrajectorySummary> {
        let calculator = TrajectoryCalculator::new(self.options());
        let summary = calculator.compute_in_place(&mut self.stations).map_err(|errors| {
            debug!(
                well_section = %self.well_section,
                state = ?self.state,
                errors = errors.len(),
                "recompute rejected"
            );
            errors
        })?;

        self.computed_at = Some(Utc::now());
        self.transition(CalculationState::Computed);
        let summary: &TrajectorySummary = self.summary.insert(summary);
        Ok(summary)
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
        if self.state == CalculationState::Computed {
            self.transition(CalculationState::Stale);
        }
    }

    fn transition(&mut self, to: CalculationState) {
        debug!(
            well_section = %self.well_section,
            from = ?self.state,
            to = ?to,
            "calculation state changed"
        );
        self.state = to;
    }
}
