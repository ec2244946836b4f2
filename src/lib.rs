//! This library turns directional survey measurements into a well path using the minimum
//! curvature method.
//!
//! A survey is an ordered list of [`SurveyStation`]s, each recording where along the hole it was
//! taken (measured depth, `md`) and which way the hole pointed there (inclination `inc` from
//! vertical and azimuth `azi` clockwise from North). From those, a [`TrajectoryCalculator`]
//! works out every station's true vertical depth, north and east displacement, horizontal
//! displacement, vertical section, and dogleg severity.
//!
//! The engine is deliberately stateless: it takes a snapshot of stations, validates all of it,
//! and either returns every computed station or every problem it found, never a partially
//! computed list. Keeping track of which results are still valid after an edit is what
//! [`TrajectoryCalculation`] is for.
//!
//! Lengths are in meters and angles in decimal degrees on the data model, which is what storage
//! and export see. Everywhere a value goes in or comes out through the API it is typed with
//! [`uom`] so that feet and radians convert rather than silently corrupt the result.
//!
//! # Examples
//!
//! ```
//! use wellpath::{compute, SurveyStation, ValidationError, station::Components};
//! use uom::si::f64::{Angle, Length};
//! use uom::si::{angle::degree, length::meter};
//!
//! let at = |md: f64, inc: f64, azi: f64| SurveyStation::build(Components {
//!     measured_depth: Length::new::<meter>(md),
//!     inclination: Angle::new::<degree>(inc),
//!     azimuth: Angle::new::<degree>(azi),
//! });
//!
//! let survey = [at(1000., 5.2, 45.3), at(1100., 6.5, 48.2), at(1200., 8.1, 52.4)];
//!
//! // project the vertical section onto due North
//! let trajectory = compute(&survey, Angle::new::<degree>(0.)).expect("survey is valid");
//! for station in trajectory.stations() {
//!     println!("{station}");
//! }
//! let summary = trajectory.summary();
//! assert!((summary.tvd - 198.664).abs() < 1e-3);
//! assert!((summary.hd - 22.875).abs() < 1e-3);
//!
//! // a station entered out of order is reported with its position in the list
//! let typo = [at(1000., 0., 0.), at(1100., 0., 0.), at(1050., 0., 0.)];
//! let errors = compute(&typo, Angle::new::<degree>(0.)).unwrap_err();
//! assert_eq!(
//!     errors.into_vec(),
//!     vec![ValidationError::NonIncreasingDepth { index: 2 }],
//! );
//! ```
//!
//! The arithmetic of a single interval is available on its own in [`minimum_curvature`].

mod calculation;
mod calculator;
mod error;
mod util;
mod validation;

pub mod minimum_curvature;
pub mod station;

pub(crate) type Vector3 = nalgebra::Vector3<f64>;

pub use calculation::{CalculationMethod, CalculationState, TrajectoryCalculation};
pub use calculator::{
    compute, CalculationOptions, ComputedTrajectory, TrajectoryCalculator, TrajectorySummary,
};
pub use error::{InvalidInterval, Result, ValidationError, ValidationErrors};
pub use station::{Observation, Position, StationId, SurveyStation};
pub use validation::{validate, TrajectoryValidator};
