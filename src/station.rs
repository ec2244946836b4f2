use crate::util::BoundedAngle;
use crate::Vector3;
use std::fmt::{self, Display, Formatter};
use std::marker::PhantomData;
use uom::si::f64::{Angle, Length};
use uom::si::{angle::degree, length::meter};

#[cfg(any(test, feature = "approx"))]
use approx::{AbsDiffEq, RelativeEq};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg(doc)]
use crate::{TrajectoryCalculator, TrajectoryValidator};

/// Identifier of a station as assigned by whoever stores it.
///
/// The engine never creates or interprets these; it only carries them through so computed
/// stations can be matched back to their stored rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct StationId(pub u64);

/// One directional survey measurement and the well-path position computed for it.
///
/// The measured inputs are `md`, `inc`, and `azi` (plus the free-text `tool` and `remarks`).
/// The remaining fields are outputs: [`TrajectoryCalculator`] overwrites all of them every time
/// it computes a snapshot, so they are only meaningful for a station that came out of a
/// successful computation.
///
/// All lengths are in meters and all angles in decimal degrees. These are the units, and the
/// field names, that storage and export see. For unit-safe access use the [`uom`]-typed
/// accessors like [`SurveyStation::measured_depth`], and construct stations through
/// [`SurveyStation::builder`] or [`SurveyStation::build`]:
///
/// ```rust
/// use wellpath::{SurveyStation, station::Components};
/// use uom::si::f64::{Angle, Length};
/// use uom::si::{angle::degree, length::meter};
///
/// let a = SurveyStation::builder()
///     .measured_depth(Length::new::<meter>(1000.))
///     .inclination(Angle::new::<degree>(5.2))
///     .azimuth(Angle::new::<degree>(45.3))
///     .tool("MWD")
///     .build();
///
/// let b = SurveyStation::build(Components {
///     measured_depth: Length::new::<meter>(1000.),
///     inclination: Angle::new::<degree>(5.2),
///     azimuth: Angle::new::<degree>(45.3),
/// });
///
/// assert_eq!(a.md, b.md);
/// assert_eq!(a.tool, "MWD");
/// ```
///
/// The typed constructors convert through [`uom`], which stores angles in radians, so a value
/// entered in degrees may come back off by an ulp. Rows that are already in meters and degrees,
/// like user input or stored records, should go through [`SurveyStation::new`], which keeps them
/// exactly as given.
///
/// Construction never rejects values. Ranges and ordering are checked by
/// [`TrajectoryValidator`] over a whole snapshot, so that every problem is reported at once.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SurveyStation {
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub id: Option<StationId>,

    /// Measured depth along the wellbore, in meters.
    pub md: f64,
    /// Inclination from vertical, in degrees.
    pub inc: f64,
    /// Azimuth clockwise from North, in degrees.
    pub azi: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub tool: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub remarks: String,

    /// True vertical depth below the datum, in meters.
    #[cfg_attr(feature = "serde", serde(default))]
    pub tvd: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub north: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub east: f64,
    /// Vertical section: horizontal displacement projected onto the reference azimuth.
    #[cfg_attr(feature = "serde", serde(default))]
    pub vs: f64,
    /// Horizontal displacement, `sqrt(north² + east²)`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub hd: f64,
    /// Dogleg severity of the interval ending at this station, in degrees per 30 m.
    #[cfg_attr(feature = "serde", serde(default))]
    pub dls: f64,
}

impl SurveyStation {
    /// Constructs a station from measured depth in meters and inclination and azimuth in
    /// degrees, storing the values untouched.
    ///
    /// `tool` and `remarks` are left empty.
    #[must_use]
    pub fn new(md: f64, inc: f64, azi: f64) -> Self {
        Self {
            md,
            inc,
            azi,
            ..Self::default()
        }
    }

    /// Constructs a station from its measured inputs, with empty `tool` and `remarks`.
    ///
    /// Values are converted into meters and degrees, see the note on [`SurveyStation`].
    #[must_use]
    pub fn build(
        Components {
            measured_depth,
            inclination,
            azimuth,
        }: Components,
    ) -> Self {
        Self::builder()
            .measured_depth(measured_depth)
            .inclination(inclination)
            .azimuth(azimuth)
            .build()
    }

    /// Provides a constructor for a [`SurveyStation`].
    pub fn builder() -> Builder<MissingDepth, MissingInclination, MissingAzimuth> {
        Builder {
            under_construction: Self::default(),
            has: (PhantomData, PhantomData, PhantomData),
        }
    }

    #[must_use]
    pub fn measured_depth(&self) -> Length {
        Length::new::<meter>(self.md)
    }

    #[must_use]
    pub fn inclination(&self) -> Angle {
        Angle::new::<degree>(self.inc)
    }

    #[must_use]
    pub fn azimuth(&self) -> Angle {
        Angle::new::<degree>(self.azi)
    }

    /// The measured inputs of this station, as consumed by the curvature step.
    #[must_use]
    pub fn observation(&self) -> Observation {
        Observation {
            measured_depth: self.measured_depth(),
            inclination: self.inclination(),
            azimuth: self.azimuth(),
        }
    }

    /// The computed position of this station.
    #[must_use]
    pub fn position(&self) -> Position {
        Position {
            tvd: self.tvd,
            north: self.north,
            east: self.east,
        }
    }

    /// Direction from the datum to this station as seen from above, in [0°, 360°).
    ///
    /// Returns `None` for a station directly below (or at) the datum, where the direction is
    /// undefined.
    #[doc(alias = "closure direction")]
    #[must_use]
    pub fn closure_azimuth(&self) -> Option<Angle> {
        if self.hd == 0. {
            return None;
        }
        let azimuth = BoundedAngle::new(Angle::new::<uom::si::angle::radian>(
            self.east.atan2(self.north),
        ));
        Some(Angle::new::<degree>(azimuth.degrees()))
    }

    /// `(east, north)` in meters, for plan-view plots.
    #[must_use]
    pub fn plan_view_point(&self) -> (f64, f64) {
        (self.east, self.north)
    }

    /// `(hd, tvd)` in meters, for side-view plots.
    #[must_use]
    pub fn section_view_point(&self) -> (f64, f64) {
        (self.hd, self.tvd)
    }

    /// Overwrites every computed field.
    pub(crate) fn set_outputs(&mut self, position: Position, reference_azimuth: Angle, dls: f64) {
        self.tvd = position.tvd;
        self.north = position.north;
        self.east = position.east;
        self.hd = position.horizontal_displacement();
        self.vs = position.vertical_section(reference_azimuth);
        self.dls = dls;
    }
}

impl Display for SurveyStation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MD {} m, inc {}°, azi {}° -> TVD {:.3} m, N {:.3} m, E {:.3} m, DLS {:.3}°/30m",
            self.md, self.inc, self.azi, self.tvd, self.north, self.east, self.dls
        )
    }
}

/// The measured inputs of a station, with units attached.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Observation {
    pub measured_depth: Length,
    pub inclination: Angle,
    pub azimuth: Angle,
}

/// A point on the well path relative to the survey datum.
///
/// `tvd` is positive downwards, `north` and `east` are horizontal offsets, all in meters. A
/// `Position` is also how a caller seeds a computation that continues from a previous section
/// (see [`CalculationOptions::with_tie_in`](crate::CalculationOptions::with_tie_in)).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Position {
    #[cfg_attr(feature = "serde", serde(default))]
    pub tvd: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub north: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub east: f64,
}

impl Position {
    /// The survey datum itself.
    #[must_use]
    pub fn zero() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn horizontal_displacement(&self) -> f64 {
        self.north.hypot(self.east)
    }

    /// Projects the horizontal offset onto the vertical plane at `reference_azimuth`.
    #[must_use]
    pub fn vertical_section(&self, reference_azimuth: impl Into<Angle>) -> f64 {
        let reference = BoundedAngle::new(reference_azimuth).get_bounded();
        self.north * reference.cos() + self.east * reference.sin()
    }

    /// North, east, down.
    pub(crate) fn to_ned(self) -> Vector3 {
        Vector3::new(self.north, self.east, self.tvd)
    }

    pub(crate) fn from_ned(ned: Vector3) -> Self {
        Self {
            tvd: ned.z,
            north: ned.x,
            east: ned.y,
        }
    }
}

#[cfg(any(test, feature = "approx"))]
impl AbsDiffEq<Self> for Position {
    type Epsilon = <f64 as AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        // a micrometer is well below survey tool accuracy
        1e-6
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.to_ned().abs_diff_eq(&other.to_ned(), epsilon)
    }
}

#[cfg(any(test, feature = "approx"))]
impl RelativeEq for Position {
    fn default_max_relative() -> Self::Epsilon {
        f64::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        self.to_ned()
            .relative_eq(&other.to_ned(), epsilon, max_relative)
    }
}

/// Argument type for [`SurveyStation::build`].
#[derive(Debug, Default)]
#[must_use]
pub struct Components {
    /// Measured depth of the proposed [`SurveyStation`].
    pub measured_depth: Length,

    /// Inclination from vertical of the proposed [`SurveyStation`].
    ///
    /// Must be in [0°, 180°] for the station to pass validation.
    pub inclination: Angle,

    /// Azimuth clockwise from North of the proposed [`SurveyStation`].
    ///
    /// Must be in [0°, 360°) for the station to pass validation.
    pub azimuth: Angle,
}

/// Used to indicate that a partially-constructed [`SurveyStation`] is missing its measured depth.
pub struct MissingDepth;
/// Used to indicate that a partially-constructed [`SurveyStation`] has its measured depth set.
pub struct HasDepth;
/// Used to indicate that a partially-constructed [`SurveyStation`] is missing its inclination.
pub struct MissingInclination;
/// Used to indicate that a partially-constructed [`SurveyStation`] has its inclination set.
pub struct HasInclination;
/// Used to indicate that a partially-constructed [`SurveyStation`] is missing its azimuth.
pub struct MissingAzimuth;
/// Used to indicate that a partially-constructed [`SurveyStation`] has its azimuth set.
pub struct HasAzimuth;

/// [Builder] for a [`SurveyStation`].
///
/// Construct one through [`SurveyStation::builder`], and finalize with [`Builder::build`] once
/// measured depth, inclination, and azimuth have all been set.
///
/// [Builder]: https://rust-unofficial.github.io/patterns/patterns/creational/builder.html
#[derive(Debug)]
#[must_use]
pub struct Builder<Depth, Inclination, Azimuth> {
    under_construction: SurveyStation,
    has: (
        PhantomData<Depth>,
        PhantomData<Inclination>,
        PhantomData<Azimuth>,
    ),
}

// manual impl of Clone to avoid requiring the marker types to be Clone
impl<D, I, A> Clone for Builder<D, I, A> {
    fn clone(&self) -> Self {
        Self {
            under_construction: self.under_construction.clone(),
            has: (PhantomData, PhantomData, PhantomData),
        }
    }
}

impl<D, I, A> Builder<D, I, A> {
    /// Sets the measured depth of the [`SurveyStation`]-to-be.
    pub fn measured_depth(mut self, md: impl Into<Length>) -> Builder<HasDepth, I, A> {
        self.under_construction.md = md.into().get::<meter>();
        Builder {
            under_construction: self.under_construction,
            has: (PhantomData::<HasDepth>, self.has.1, self.has.2),
        }
    }

    /// Sets the inclination of the [`SurveyStation`]-to-be.
    pub fn inclination(mut self, inc: impl Into<Angle>) -> Builder<D, HasInclination, A> {
        self.under_construction.inc = inc.into().get::<degree>();
        Builder {
            under_construction: self.under_construction,
            has: (self.has.0, PhantomData::<HasInclination>, self.has.2),
        }
    }

    /// Sets the azimuth of the [`SurveyStation`]-to-be.
    pub fn azimuth(mut self, azi: impl Into<Angle>) -> Builder<D, I, HasAzimuth> {
        self.under_construction.azi = azi.into().get::<degree>();
        Builder {
            under_construction: self.under_construction,
            has: (self.has.0, self.has.1, PhantomData::<HasAzimuth>),
        }
    }

    /// Tags the [`SurveyStation`]-to-be with the survey tool that measured it.
    pub fn tool(mut self, tool: impl Into<String>) -> Self {
        self.under_construction.tool = tool.into();
        self
    }

    pub fn remarks(mut self, remarks: impl Into<String>) -> Self {
        self.under_construction.remarks = remarks.into();
        self
    }

    /// Carries a storage-assigned identifier on the [`SurveyStation`]-to-be.
    pub fn id(mut self, id: StationId) -> Self {
        self.under_construction.id = Some(id);
        self
    }
}

impl Builder<HasDepth, HasInclination, HasAzimuth> {
    #[must_use]
    pub fn build(self) -> SurveyStation {
        self.under_construction
    }
}
