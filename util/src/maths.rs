//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Linearly interpolate between `a` and `b`.
///
/// `t` is clamped to [0, 1], so the result never overshoots `b`.
pub fn lerp<T>(a: T, b: T, t: T) -> T
where
    T: Float
{
    let t = t.max(T::zero()).min(T::one());
    a + (b - a) * t
}

/// Sign of a value, with exactly zero mapping to zero (unlike `f64::signum`, which maps +0.0 to
/// 1.0).
pub fn sign_or_zero<T>(value: T) -> T
where
    T: Float
{
    if value > T::zero() {
        T::one()
    }
    else if value < T::zero() {
        -T::one()
    }
    else {
        T::zero()
    }
}

/// Wrap an angle into the range [-pi, pi).
pub fn wrap_pi<T>(angle: T) -> T
where
    T: Float
{
    let pi_t: T = T::from(std::f64::consts::PI).unwrap();
    let tau_t: T = T::from(std::f64::consts::TAU).unwrap();

    rem_euclid(angle + pi_t, tau_t) - pi_t
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// Same semantics as `f64::rem_euclid`, available here for any `Float`.
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
    use std::f64::consts::PI;

    #[test]
    fn test_lerp() {
        assert_eq!(lerp(0f64, 10f64, 0.25), 2.5);
        assert_eq!(lerp(0f64, 10f64, 2.0), 10.0);
        assert_eq!(lerp(4f64, -4f64, -1.0), 4.0);
    }

    #[test]
    fn test_sign_or_zero() {
        assert_eq!(sign_or_zero(0.0f64), 0.0);
        assert_eq!(sign_or_zero(-0.5f64), -1.0);
        assert_eq!(sign_or_zero(1e-12f64), 1.0);
    }

    #[test]
    fn test_wrap_pi() {
        assert!((wrap_pi(3.0 * PI / 2.0) - (-PI / 2.0)).abs() < 1e-12);
        assert!((wrap_pi(-3.0 * PI / 2.0) - (PI / 2.0)).abs() < 1e-12);
        assert!((wrap_pi(0.5f64) - 0.5).abs() < 1e-12);
        assert!((wrap_pi(PI) - (-PI)).abs() < 1e-12);
    }
}
