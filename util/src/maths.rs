//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where
    T: Float
{
    target_range.0
        + ((value - source_range.0)
        * (target_range.1 - target_range.0)
        / (source_range.1 - source_range.0))
}

/// Clamp a value into `[min, max]`.
///
/// Unlike `f64::clamp` this never panics if `min > max`, the upper bound is
/// applied first and then the lower one. A NaN value is passed through.
pub fn clamp<T>(value: T, min: T, max: T) -> T
where
    T: Float
{
    let mut ret = value;

    if ret > max {
        ret = max
    }
    if ret < min {
        ret = min
    }

    ret
}

/// Clamp a value into `[-limit, limit]`.
pub fn bound_abs<T>(value: T, limit: T) -> T
where
    T: Float
{
    clamp(value, -limit, limit)
}

/// Linearly blend between `a` and `b`.
///
/// A `rho` of 1 gives `a`, a `rho` of 0 gives `b`.
pub fn blend<T>(a: T, b: T, rho: T) -> T
where
    T: Float
{
    rho * a + (T::one() - rho) * b
}

/// Normalise an angle in radians into the range (-pi, pi].
///
/// An angle of exactly -pi (or any odd multiple of pi) maps to +pi, as does
/// any angle for which round-off lands the result on -pi.
pub fn norm_rad_angle<T>(angle: T) -> T
where
    T: Float
{
    let pi_t: T = T::from(std::f64::consts::PI).unwrap();
    let tau_t: T = T::from(std::f64::consts::TAU).unwrap();

    let norm = pi_t - rem_euclid(pi_t - angle, tau_t);

    if norm <= -pi_t {
        pi_t
    }
    else {
        norm
    }
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it. Due to
/// floating point round-off the result can equal `rhs.abs()` when `lhs` is a
/// tiny negative number.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}

#[cfg(test)]
mod test {
    use super::*;

    const PI: f64 = std::f64::consts::PI;

    #[test]
    fn test_norm_rad_angle() {
        assert_eq!(norm_rad_angle(0f64), 0f64);
        assert!((norm_rad_angle(1f64) - 1f64).abs() < 1e-12);
        assert!((norm_rad_angle(-1f64) + 1f64).abs() < 1e-12);
        assert_eq!(norm_rad_angle(PI), PI);
        assert_eq!(norm_rad_angle(-PI), PI);

        // Wraparound from several turns away
        let wrapped = norm_rad_angle(3.0 * PI);
        assert!(wrapped > -PI && wrapped <= PI);
        assert!((wrapped.abs() - PI).abs() < 1e-9);

        assert!((norm_rad_angle(1.5 * PI) + 0.5 * PI).abs() < 1e-12);
        assert!((norm_rad_angle(-1.5 * PI) - 0.5 * PI).abs() < 1e-12);
        assert!((norm_rad_angle(7.0 * PI + 0.25) - (-PI + 0.25)).abs() < 1e-9);

        for i in -100..100 {
            let a = norm_rad_angle(i as f64 * 0.37);
            assert!(a > -PI && a <= PI, "{} out of range", a);
        }
    }

    #[test]
    fn test_norm_rad_angle_just_above_pi() {
        // Smallest f64 larger than pi, where the remainder rounds up to 2 pi
        let above_pi = f64::from_bits(PI.to_bits() + 1);
        assert_eq!(norm_rad_angle(above_pi), PI);

        for &a in &[
            above_pi,
            f64::from_bits((3.0 * PI).to_bits() + 1),
            f64::from_bits((-PI).to_bits() - 1),
            -3.0 * PI,
            5.0 * PI,
            7.0 * PI
        ] {
            let n = norm_rad_angle(a);
            assert!(n > -PI && n <= PI, "norm_rad_angle({}) = {}", a, n);
        }
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(2.0, -1.0, 1.0), 1.0);
        assert_eq!(clamp(-2.0, -1.0, 1.0), -1.0);
        assert_eq!(clamp(0.5, -1.0, 1.0), 0.5);
        assert_eq!(bound_abs(-7.0, 3.0), -3.0);
        assert!(clamp(f64::NAN, -1.0, 1.0).is_nan());
    }

    #[test]
    fn test_blend() {
        assert_eq!(blend(10.0, 2.0, 1.0), 10.0);
        assert_eq!(blend(10.0, 2.0, 0.0), 2.0);
        assert_eq!(blend(10.0, 2.0, 0.5), 6.0);
    }

    #[test]
    fn test_lin_map() {
        assert_eq!(lin_map((0.0, 1.0), (0.0, 10.0), 0.5), 5.0);
        assert!((lin_map((0.6, 0.4), (0.0, 8.0), 0.5) - 4.0).abs() < 1e-12);
    }
}
