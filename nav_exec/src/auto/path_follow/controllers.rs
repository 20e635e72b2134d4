//! # Path following controllers
//!
//! Pure steering and torque laws used by the [`PathFollower`](super::PathFollower), plus the
//! first order filter which smooths the applied steering angle.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector3;
use serde::Serialize;

// Internal
use util::maths::{lerp, sign_or_zero};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Exponential smoothing filter for the applied steering angle.
#[derive(Debug, Clone, Copy, Serialize, Default)]
pub struct SteerFilter {
    /// Response rate in 1/s
    responsiveness: f64,

    /// Currently applied angle
    applied_rad: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SteerFilter {
    pub fn new(responsiveness: f64) -> Self {
        Self {
            responsiveness,
            applied_rad: 0.0,
        }
    }

    /// Move the applied angle towards the demand and return the new applied angle.
    pub fn update(&mut self, demand_rad: f64, dt_s: f64) -> f64 {
        self.applied_rad = lerp(self.applied_rad, demand_rad, self.responsiveness * dt_s);
        self.applied_rad
    }

    pub fn get_applied(&self) -> f64 {
        self.applied_rad
    }

    pub fn reset(&mut self) {
        self.applied_rad = 0.0;
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Calculate the steering demand towards a point expressed in the rover's local frame.
///
/// For points ahead of or level with the rover the demand is `max_steer_rad * lateral / distance`
/// using the ground plane components of the point, which saturates at the maximum for a point
/// directly to the side.
///
/// Points behind the rover (negative longitudinal component) do not follow that law. They give the
/// full `max_steer_rad` towards their side, and a point dead astern turns right. The proportional
/// law would give almost no steer for a point just behind, e.g. about 0.02 rad for `(-0.1, 0, -3)`
/// where this returns `-max_steer_rad`.
pub fn steer_demand(local_point_m: &Vector3<f64>, max_steer_rad: f64) -> f64 {
    let lat = local_point_m[0];
    let long = local_point_m[2];
    let dist = (lat.powi(2) + long.powi(2)).sqrt();

    if dist <= std::f64::EPSILON {
        return 0.0;
    }

    if long < 0.0 {
        let side = if lat == 0.0 { 1.0 } else { sign_or_zero(lat) };
        return max_steer_rad * side;
    }

    (max_steer_rad * lat / dist).max(-max_steer_rad).min(max_steer_rad)
}

/// Calculate the drive torque demand for a given distance to the target.
///
/// Full torque is demanded outside the slowing distance, inside it the torque is scaled by
/// `(dist / slowing_dist)^2` so it reaches zero at the target.
pub fn torque_demand(dist_to_target_m: f64, slowing_dist_m: f64, max_torque_nm: f64) -> f64 {
    let dist = dist_to_target_m.max(0.0);

    if slowing_dist_m <= 0.0 || dist >= slowing_dist_m {
        max_torque_nm
    } else {
        max_torque_nm * (dist / slowing_dist_m).powi(2)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    const MAX_STEER: f64 = 0.6;

    fn point_at(bearing_rad: f64, dist: f64) -> Vector3<f64> {
        Vector3::new(dist * bearing_rad.sin(), 0.0, dist * bearing_rad.cos())
    }

    #[test]
    fn test_steer_sign() {
        assert!(steer_demand(&Vector3::new(1.0, 0.0, 5.0), MAX_STEER) > 0.0);
        assert!(steer_demand(&Vector3::new(-1.0, 0.0, 5.0), MAX_STEER) < 0.0);
        assert_eq!(steer_demand(&Vector3::new(0.0, 3.0, 5.0), MAX_STEER), 0.0);
        assert_eq!(steer_demand(&Vector3::zeros(), MAX_STEER), 0.0);
    }

    #[test]
    fn test_steer_behind_saturates() {
        assert_eq!(steer_demand(&Vector3::new(-0.1, 0.0, -3.0), MAX_STEER), -MAX_STEER);
        assert_eq!(steer_demand(&Vector3::new(0.1, 0.0, -3.0), MAX_STEER), MAX_STEER);
        assert_eq!(steer_demand(&Vector3::new(0.0, 0.0, -3.0), MAX_STEER), MAX_STEER);
    }

    #[test]
    fn test_steer_monotonic_and_saturating() {
        let mut prev = 0.0;
        for i in 1..=90 {
            let bearing = (i as f64).to_radians();
            let s = steer_demand(&point_at(bearing, 4.0), MAX_STEER);
            let s_mirror = steer_demand(&point_at(-bearing, 4.0), MAX_STEER);

            assert!(s >= prev);
            assert!(s <= MAX_STEER + 1e-12);
            assert!((s + s_mirror).abs() < 1e-12);
            prev = s;
        }

        // Directly to the side gives the maximum
        assert!((steer_demand(&point_at(FRAC_PI_2, 2.0), MAX_STEER) - MAX_STEER).abs() < 1e-12);

        // Behind saturates to the side the point is on
        assert_eq!(steer_demand(&Vector3::new(-0.1, 0.0, -3.0), MAX_STEER), -MAX_STEER);
        assert_eq!(steer_demand(&Vector3::new(0.0, 0.0, -3.0), MAX_STEER), MAX_STEER);
    }

    #[test]
    fn test_torque_monotonic() {
        let slow = 5.0;
        let max = 80.0;

        assert_eq!(torque_demand(0.0, slow, max), 0.0);
        assert_eq!(torque_demand(slow, slow, max), max);
        assert_eq!(torque_demand(50.0, slow, max), max);
        assert!((torque_demand(2.5, slow, max) - 20.0).abs() < 1e-12);

        let mut prev = 0.0;
        for i in 0..=100 {
            let t = torque_demand(slow * i as f64 / 100.0, slow, max);
            assert!(t >= prev);
            prev = t;
        }
    }

    #[test]
    fn test_steer_filter() {
        let mut filt = SteerFilter::new(5.0);

        // Half way there in one 0.1 s tick
        assert!((filt.update(0.4, 0.1) - 0.2).abs() < 1e-12);

        // Large steps never overshoot
        assert!((filt.update(0.4, 10.0) - 0.4).abs() < 1e-12);

        filt.reset();
        assert_eq!(filt.get_applied(), 0.0);

        // Zero elapsed time holds the angle
        assert_eq!(filt.update(0.4, 0.0), 0.0);
    }
}
