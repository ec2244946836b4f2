//! The curvature mathematics of the [minimum curvature method].
//!
//! The method models the wellbore between two survey stations as a circular arc that is tangent
//! to the measured direction at both ends. [`step`] is the only place where that arc is turned
//! into position deltas; everything that accumulates positions over a survey builds on it.
//!
//! Directions are handled in a north-east-down frame: a station with inclination `i` and
//! azimuth `a` points along the unit vector `(sin i·cos a, sin i·sin a, cos i)`.
//!
//! [minimum curvature method]: https://petrowiki.spe.org/Calculation_methods_for_directional_survey

use crate::error::InvalidInterval;
use crate::station::{Observation, Position};
use crate::util::{BoundedAngle, DOGLEG_TOLERANCE};
use crate::Vector3;
use uom::si::f64::{Angle, Length};
use uom::si::{
    angle::{degree, radian},
    length::meter,
};

/// Course length, in meters, that dogleg severity is normalized to.
pub const DLS_COURSE_LENGTH: f64 = 30.;

#[doc(alias = "100 ft")]
const METERS_PER_100_FEET: f64 = 30.48;

/// The change in position between two adjacent stations.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Step {
    /// Measured depth between the two stations.
    pub course_length: Length,
    /// Change in true vertical depth, positive downwards.
    pub delta_tvd: Length,
    /// Change in northing.
    pub delta_north: Length,
    /// Change in easting.
    pub delta_east: Length,
    /// Total change of direction over the interval.
    pub dogleg: Angle,
    /// Correction applied to the average-angle estimate to place it on the arc.
    ///
    /// Exactly 1 for a straight interval.
    pub ratio_factor: f64,
    /// Dogleg severity in degrees per [`DLS_COURSE_LENGTH`] meters.
    pub dls: f64,
}

impl Step {
    /// The deltas of this step as a [`Position`] offset.
    #[must_use]
    pub fn delta(&self) -> Position {
        Position {
            tvd: self.delta_tvd.get::<meter>(),
            north: self.delta_north.get::<meter>(),
            east: self.delta_east.get::<meter>(),
        }
    }
}

/// Computes the position change from `prev` to `curr` along a circular arc.
///
/// The step knows nothing about where `prev` is; callers add the returned deltas to their own
/// running position. The only failure is a non-positive course length, which a validated
/// snapshot never contains.
///
/// ```rust
/// use wellpath::{minimum_curvature, SurveyStation, station::Components};
/// use uom::si::f64::{Angle, Length};
/// use uom::si::{angle::degree, length::meter};
///
/// let at = |md: f64, inc: f64| SurveyStation::build(Components {
///     measured_depth: Length::new::<meter>(md),
///     inclination: Angle::new::<degree>(inc),
///     azimuth: Angle::new::<degree>(0.),
/// }).observation();
///
/// let step = minimum_curvature::step(&at(1000., 0.), &at(1100., 0.))
///     .expect("depth increases");
/// assert_eq!(step.delta_tvd.get::<meter>(), 100.);
/// assert_eq!(step.dls, 0.);
/// ```
pub fn step(prev: &Observation, curr: &Observation) -> Result<Step, InvalidInterval> {
    let course_length = (curr.measured_depth - prev.measured_depth).get::<meter>();
    // also catches NaN
    if !(course_length > 0.) {
        return Err(InvalidInterval { course_length });
    }

    let dogleg = dogleg(prev, curr);
    let rf = ratio_factor(dogleg);

    let (sin_i1, cos_i1) = prev.inclination.get::<radian>().sin_cos();
    let (sin_i2, cos_i2) = curr.inclination.get::<radian>().sin_cos();
    let (sin_a1, cos_a1) = prev.azimuth.get::<radian>().sin_cos();
    let (sin_a2, cos_a2) = curr.azimuth.get::<radian>().sin_cos();

    let half_course = 0.5 * course_length;
    let delta_tvd = half_course * (cos_i1 + cos_i2) * rf;
    let delta_north = half_course * (sin_i1 * cos_a1 + sin_i2 * cos_a2) * rf;
    let delta_east = half_course * (sin_i1 * sin_a1 + sin_i2 * sin_a2) * rf;

    let dogleg_degrees = dogleg.get::<degree>();

    Ok(Step {
        course_length: Length::new::<meter>(course_length),
        delta_tvd: Length::new::<meter>(delta_tvd),
        delta_north: Length::new::<meter>(delta_north),
        delta_east: Length::new::<meter>(delta_east),
        dogleg,
        ratio_factor: rf,
        dls: dogleg_degrees / course_length * DLS_COURSE_LENGTH,
    })
}

/// The angle between the wellbore directions at two stations.
///
/// This is the spherical law of cosines,
/// `cos β = sin i1·sin i2·cos(a2 − a1) + cos i1·cos i2`, evaluated in its haversine form
/// `sin²(β/2) = sin²((i2 − i1)/2) + sin i1·sin i2·sin²((a2 − a1)/2)`. The two are the same
/// identity, but the haversine form stays exact for identical directions, where `acos` of a
/// value a rounding error below 1 would report a dogleg of ~1e-8 rad.
#[must_use]
pub fn dogleg(prev: &Observation, curr: &Observation) -> Angle {
    let i1 = prev.inclination.get::<radian>();
    let i2 = curr.inclination.get::<radian>();
    let a1 = prev.azimuth.get::<radian>();
    let a2 = curr.azimuth.get::<radian>();

    let half_inc = ((i2 - i1) / 2.).sin();
    let half_azi = ((a2 - a1) / 2.).sin();
    let haversine = half_inc.powi(2) + i1.sin() * i2.sin() * half_azi.powi(2);
    // rounding can push this a hair outside the domain of the inverse
    let haversine = haversine.clamp(0., 1.);

    Angle::new::<radian>(2. * haversine.sqrt().atan2((1. - haversine).sqrt()))
}

/// The ratio factor `(2/β)·tan(β/2)` for a dogleg of `β`.
///
/// Tends to 1 as `β` goes to 0, which is what is returned for doglegs within `1e-10` rad of 0.
#[doc(alias = "RF")]
#[must_use]
pub fn ratio_factor(dogleg: Angle) -> f64 {
    let beta = dogleg.get::<radian>();
    if beta.abs() < DOGLEG_TOLERANCE {
        1.
    } else {
        2. / beta * (beta / 2.).tan()
    }
}

/// Converts a dogleg severity in degrees per 30 m to degrees per 100 ft.
#[must_use]
pub fn dls_per_100ft(dls_per_30m: f64) -> f64 {
    dls_per_30m / DLS_COURSE_LENGTH * METERS_PER_100_FEET
}

/// Unit vector along the wellbore in north-east-down.
pub(crate) fn tangent(observation: &Observation) -> Vector3 {
    let (sin_i, cos_i) = observation.inclination.get::<radian>().sin_cos();
    let (sin_a, cos_a) = observation.azimuth.get::<radian>().sin_cos();
    Vector3::new(sin_i * cos_a, sin_i * sin_a, cos_i)
}

/// The station that lies `fraction` of the way along the arc from `prev` to `curr`.
///
/// The direction is found by spherical interpolation between the two tangents, which is exactly
/// the direction of the circular arc at that point. `fraction` is expected in [0, 1].
pub(crate) fn along_arc(prev: &Observation, curr: &Observation, fraction: f64) -> Observation {
    let measured_depth =
        prev.measured_depth + (curr.measured_depth - prev.measured_depth) * fraction;

    let beta = dogleg(prev, curr).get::<radian>();
    let t1 = tangent(prev);
    let t2 = tangent(curr);
    let direction = if beta < DOGLEG_TOLERANCE {
        t1
    } else if beta.sin() < DOGLEG_TOLERANCE {
        // a complete reversal has no unique plane to turn in
        if fraction < 0.5 {
            t1
        } else {
            t2
        }
    } else {
        (t1 * ((1. - fraction) * beta).sin() + t2 * (fraction * beta).sin()) / beta.sin()
    };

    let horizontal = direction.x.hypot(direction.y);
    let inclination = horizontal.atan2(direction.z);
    let azimuth = if horizontal < DOGLEG_TOLERANCE {
        // vertical: keep whichever azimuth the nearer station reported
        if fraction < 0.5 {
            prev.azimuth
        } else {
            curr.azimuth
        }
    } else {
        let bounded = BoundedAngle::new(Angle::new::<radian>(direction.y.atan2(direction.x)));
        Angle::new::<degree>(bounded.degrees())
    };

    Observation {
        measured_depth,
        inclination: Angle::new::<radian>(inclination),
        azimuth,
    }
}

#[cfg(test)]
mod tests {
    use super::{along_arc, dls_per_100ft, dogleg, ratio_factor, step, tangent};
    use crate::station::Observation;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use quickcheck::{quickcheck, TestResult};
    use rstest::rstest;
    use uom::si::f64::{Angle, Length};
    use uom::si::{
        angle::{degree, radian},
        length::meter,
    };

    fn m(meters: f64) -> Length {
        Length::new::<meter>(meters)
    }
    fn d(degrees: f64) -> Angle {
        Angle::new::<degree>(degrees)
    }
    fn obs(md: f64, inc: f64, azi: f64) -> Observation {
        Observation {
            measured_depth: m(md),
            inclination: d(inc),
            azimuth: d(azi),
        }
    }

    /// The textbook formulas, written out independently of the implementation.
    fn reference_step(a: (f64, f64, f64), b: (f64, f64, f64)) -> (f64, f64, f64, f64) {
        let (md1, i1, a1) = (a.0, a.1.to_radians(), a.2.to_radians());
        let (md2, i2, a2) = (b.0, b.1.to_radians(), b.2.to_radians());
        let cos_beta = (i1.sin() * i2.sin() * (a2 - a1).cos() + i1.cos() * i2.cos()).clamp(-1., 1.);
        let beta = cos_beta.acos();
        let rf = if beta < 1e-10 {
            1.
        } else {
            2. / beta * (beta / 2.).tan()
        };
        let dmd = md2 - md1;
        (
            0.5 * dmd * (i1.cos() + i2.cos()) * rf,
            0.5 * dmd * (i1.sin() * a1.cos() + i2.sin() * a2.cos()) * rf,
            0.5 * dmd * (i1.sin() * a1.sin() + i2.sin() * a2.sin()) * rf,
            beta.to_degrees() / dmd * 30.,
        )
    }

    #[test]
    fn straight_vertical_hold() {
        let step = step(&obs(1000., 0., 0.), &obs(1100., 0., 0.)).unwrap();
        assert_eq!(step.delta_tvd.get::<meter>(), 100.);
        assert_eq!(step.delta_north.get::<meter>(), 0.);
        assert_eq!(step.delta_east.get::<meter>(), 0.);
        assert_eq!(step.dogleg.get::<radian>(), 0.);
        assert_eq!(step.dls, 0.);
        assert_eq!(step.ratio_factor, 1.);
    }

    #[rstest]
    #[case(12.5, 45.3)]
    #[case(30., 0.)]
    #[case(60., 359.9)]
    #[case(90., 180.)]
    #[case(135., 271.)]
    fn straight_deviated_hold(#[case] inc: f64, #[case] azi: f64) {
        let step = step(&obs(2000., inc, azi), &obs(2150., inc, azi)).unwrap();
        assert_eq!(step.ratio_factor, 1.);
        assert_eq!(step.dls, 0.);
        assert_relative_eq!(
            step.delta_tvd.get::<meter>(),
            150. * inc.to_radians().cos(),
            epsilon = 1e-9
        );
        assert_relative_eq!(
            step.delta().north.hypot(step.delta().east),
            150. * inc.to_radians().sin(),
            epsilon = 1e-9
        );
    }

    #[rstest]
    #[case((1000., 5.2, 45.3), (1100., 6.5, 48.2))]
    #[case((1100., 6.5, 48.2), (1200., 8.1, 52.4))]
    #[case((500., 0., 0.), (530., 3., 120.))]
    #[case((3000., 88., 350.), (3030., 91., 10.))]
    #[case((100., 10., 10.), (100.001, 10.1, 10.1))]
    #[case((0., 0., 0.), (1000., 150., 200.))]
    fn matches_law_of_cosines(#[case] a: (f64, f64, f64), #[case] b: (f64, f64, f64)) {
        let (tvd, north, east, dls) = reference_step(a, b);
        let step = step(&obs(a.0, a.1, a.2), &obs(b.0, b.1, b.2)).unwrap();
        assert_abs_diff_eq!(step.delta_tvd.get::<meter>(), tvd, epsilon = 1e-6);
        assert_abs_diff_eq!(step.delta_north.get::<meter>(), north, epsilon = 1e-6);
        assert_abs_diff_eq!(step.delta_east.get::<meter>(), east, epsilon = 1e-6);
        assert_abs_diff_eq!(step.dls, dls, epsilon = 1e-4);
    }

    #[test]
    fn build_only_is_a_circular_arc() {
        // 0° to 90° over a quarter circle of radius R: tvd = east-west offset = R
        let radius = 600. / std::f64::consts::FRAC_PI_2;
        let step = step(&obs(0., 0., 90.), &obs(600., 90., 90.)).unwrap();
        assert_relative_eq!(step.delta_tvd.get::<meter>(), radius, epsilon = 1e-9);
        assert_relative_eq!(step.delta_east.get::<meter>(), radius, epsilon = 1e-9);
        assert_abs_diff_eq!(step.delta_north.get::<meter>(), 0., epsilon = 1e-9);
        assert_relative_eq!(step.dogleg.get::<degree>(), 90., epsilon = 1e-9);
        assert_relative_eq!(step.dls, 4.5, epsilon = 1e-9);
    }

    #[rstest]
    #[case(100., 100.)]
    #[case(100., 99.)]
    #[case(100., f64::NAN)]
    fn rejects_non_positive_course_length(#[case] md1: f64, #[case] md2: f64) {
        let err = step(&obs(md1, 1., 1.), &obs(md2, 2., 2.)).unwrap_err();
        assert!(!(err.course_length > 0.));
    }

    #[test]
    fn tiny_course_length_is_not_an_error() {
        let step = step(&obs(100., 10., 10.), &obs(100. + 1e-9, 10., 10.)).unwrap();
        assert_eq!(step.ratio_factor, 1.);
        assert_eq!(step.dls, 0.);
    }

    #[test]
    fn dogleg_across_north() {
        let beta = dogleg(&obs(0., 90., 359.), &obs(30., 90., 1.));
        assert_relative_eq!(beta.get::<degree>(), 2., epsilon = 1e-9);
    }

    #[rstest]
    #[case(0., 1.)]
    #[case(1e-11, 1.)]
    #[case(90., 4. / std::f64::consts::PI)]
    fn ratio_factor_limits(#[case] dogleg_degrees: f64, #[case] expected: f64) {
        assert_relative_eq!(ratio_factor(d(dogleg_degrees)), expected, epsilon = 1e-12);
    }

    #[test]
    fn ratio_factor_is_continuous_near_zero() {
        assert_relative_eq!(
            ratio_factor(Angle::new::<radian>(1e-6)),
            1.,
            epsilon = 1e-12
        );
    }

    #[test]
    fn converts_dls_to_oilfield_units() {
        assert_relative_eq!(dls_per_100ft(3.), 3.048, epsilon = 1e-12);
        assert_eq!(dls_per_100ft(0.), 0.);
    }

    #[test]
    fn tangent_points_along_the_hole() {
        assert_relative_eq!(tangent(&obs(0., 0., 123.)), crate::Vector3::new(0., 0., 1.));
        assert_relative_eq!(
            tangent(&obs(0., 90., 90.)),
            crate::Vector3::new(0., 1., 0.),
            epsilon = 1e-12
        );
    }

    #[test]
    fn along_arc_halfway_through_a_build() {
        let mid = along_arc(&obs(0., 0., 90.), &obs(600., 90., 90.), 0.5);
        assert_relative_eq!(mid.measured_depth.get::<meter>(), 300.);
        assert_relative_eq!(mid.inclination.get::<degree>(), 45., epsilon = 1e-9);
        assert_relative_eq!(mid.azimuth.get::<degree>(), 90., epsilon = 1e-9);
    }

    #[test]
    fn along_arc_keeps_azimuth_when_vertical() {
        let start = along_arc(&obs(0., 0., 77.), &obs(30., 3., 10.), 0.);
        assert_relative_eq!(start.inclination.get::<degree>(), 0., epsilon = 1e-9);
        assert_eq!(start.azimuth, d(77.));
    }

    fn arbitrary_interval(
        inc1: u16,
        azi1: u16,
        inc2: u16,
        azi2: u16,
        length: u16,
    ) -> Option<(Observation, Observation)> {
        if length == 0 {
            return None;
        }
        let a = obs(1000., f64::from(inc1 % 1800) / 10., f64::from(azi1 % 3600) / 10.);
        let b = obs(
            1000. + f64::from(length) / 10.,
            f64::from(inc2 % 1800) / 10.,
            f64::from(azi2 % 3600) / 10.,
        );
        // a full reversal has no defined arc
        if dogleg(&a, &b).get::<degree>() > 170. {
            return None;
        }
        Some((a, b))
    }

    quickcheck! {
        fn splitting_an_interval_on_its_arc_preserves_position(
            inc1: u16, azi1: u16, inc2: u16, azi2: u16, length: u16, split: u8
        ) -> TestResult {
            let Some((a, b)) = arbitrary_interval(inc1, azi1, inc2, azi2, length) else {
                return TestResult::discard();
            };
            let fraction = (f64::from(split) + 1.) / 257.;
            let mid = along_arc(&a, &b, fraction);

            let whole = step(&a, &b).unwrap();
            let first = step(&a, &mid).unwrap();
            let second = step(&mid, &b).unwrap();

            let joined = crate::Vector3::new(
                first.delta().north + second.delta().north,
                first.delta().east + second.delta().east,
                first.delta().tvd + second.delta().tvd,
            );
            assert_abs_diff_eq!(joined, whole.delta().to_ned(), epsilon = 1e-6);
            // the arc has constant curvature
            if whole.dls > 1e-6 {
                assert_relative_eq!(first.dls, whole.dls, max_relative = 1e-6);
                assert_relative_eq!(second.dls, whole.dls, max_relative = 1e-6);
            }
            TestResult::passed()
        }

        fn dogleg_is_symmetric_and_bounded(
            inc1: u16, azi1: u16, inc2: u16, azi2: u16, length: u16
        ) -> TestResult {
            let Some((a, b)) = arbitrary_interval(inc1, azi1, inc2, azi2, length) else {
                return TestResult::discard();
            };
            let there = dogleg(&a, &b).get::<radian>();
            let back = dogleg(&b, &a).get::<radian>();
            assert_relative_eq!(there, back, epsilon = 1e-12);
            TestResult::from_bool((0. ..=std::f64::consts::PI).contains(&there))
        }
    }
}
