use uom::si::angle::{degree, radian};
use uom::si::f64::Angle;

/// Below this magnitude (in radians) a dogleg is treated as a straight hold.
pub(crate) const DOGLEG_TOLERANCE: f64 = 1e-10;

/// A compass direction normalized into [0°, 360°).
///
/// Used wherever the engine produces or consumes an azimuth that may have wrapped around North,
/// such as closure azimuths, interpolated stations, and the vertical-section reference.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct BoundedAngle {
    angle: Angle,
}

impl BoundedAngle {
    pub(crate) fn new(angle: impl Into<Angle>) -> Self {
        Self {
            // NOTE: uom may store the value differently-normalized than we hand it in, so
            // accessors normalize again on the way out.
            angle: Angle::new::<radian>(Self::into_bounds(angle.into())),
        }
    }

    /// Returns the angle in [0°, 360°) in radians.
    pub(crate) fn get_bounded(self) -> f64 {
        Self::into_bounds(self.angle)
    }

    /// Returns the angle in [0°, 360°) in degrees.
    pub(crate) fn degrees(self) -> f64 {
        let degrees = Angle::new::<radian>(self.get_bounded()).get::<degree>();
        // 359.9999999999999° can round up to exactly 360° on the way through uom.
        if degrees >= 360. {
            0.
        } else {
            degrees
        }
    }

    /// Wraps an azimuth given in degrees into [0°, 360°) without a trip through radians.
    ///
    /// Non-finite input stays non-finite.
    pub(crate) fn wrap_degrees(degrees: f64) -> f64 {
        let wrapped = degrees.rem_euclid(360.);
        // a tiny negative input wraps to exactly 360.
        if wrapped >= 360. {
            0.
        } else {
            wrapped
        }
    }

    fn into_bounds(angle: Angle) -> f64 {
        let out_of_bounds: f64 = angle.get::<radian>();
        out_of_bounds.rem_euclid(Angle::FULL_TURN.get::<radian>())
    }
}

#[cfg(test)]
mod tests {
    use crate::util::BoundedAngle;
    use approx::assert_relative_eq;
    use rstest::rstest;
    use uom::si::angle::{degree, radian};
    use uom::si::f64::Angle;

    fn d(degrees: f64) -> Angle {
        Angle::new::<degree>(degrees)
    }

    #[rstest]
    #[case(0., 0.)]
    #[case(45.3, 45.3)]
    #[case(360., 0.)]
    #[case(400., 40.)]
    #[case(-90., 270.)]
    #[case(-390., 330.)]
    #[case(720. + 12.5, 12.5)]
    fn azimuth_is_normalized_onto_the_compass(#[case] input: f64, #[case] expected: f64) {
        let bounded = BoundedAngle::new(d(input));
        assert_relative_eq!(bounded.degrees(), expected, epsilon = 1e-9);
        assert!((0. ..360.).contains(&bounded.degrees()));
    }

    #[test]
    fn bounded_radians_stay_below_a_full_turn() {
        let sut = BoundedAngle::new(Angle::FULL_TURN + Angle::new::<radian>(0.9));
        assert_relative_eq!(sut.get_bounded(), 0.9, epsilon = 0.000_000_001);
    }

    #[rstest]
    #[case(0., 0.)]
    #[case(48., 48.)]
    #[case(400., 40.)]
    #[case(-90., 270.)]
    #[case(360., 0.)]
    #[case(-1e-20, 0.)]
    fn degrees_wrap_exactly(#[case] input: f64, #[case] expected: f64) {
        assert_eq!(BoundedAngle::wrap_degrees(input), expected);
    }

    #[rstest]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    #[case(f64::NEG_INFINITY)]
    fn non_finite_degrees_stay_non_finite(#[case] input: f64) {
        assert!(!BoundedAngle::wrap_degrees(input).is_finite());
    }
}
