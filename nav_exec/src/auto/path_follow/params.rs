//! Path following parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for path following
#[derive(Deserialize, Debug, Clone)]
pub struct PathFollowParams {
    /// Maximum magnitude of the steering demand
    pub max_steer_rad: f64,

    /// Drive torque demanded when far from the target
    pub max_torque_nm: f64,

    /// Brake torque applied when stopping
    pub brake_torque_nm: f64,

    /// Distance along the path to the point the rover steers towards
    pub look_ahead_m: f64,

    /// Below this distance to the target the torque demand is reduced with the square of the
    /// remaining distance.
    pub slowing_dist_m: f64,

    /// Distance within which the target is considered reached
    pub arrival_dist_m: f64,

    /// Rate (1/s) at which the applied steering angle follows the demand.
    ///
    /// Each tick the applied angle moves `clamp(steer_responsiveness * dt, 0, 1)` of the way
    /// towards the demand.
    pub steer_responsiveness: f64,
}

impl Default for PathFollowParams {
    fn default() -> Self {
        Self {
            max_steer_rad: 0.6,
            max_torque_nm: 80.0,
            brake_torque_nm: 300.0,
            look_ahead_m: 3.0,
            slowing_dist_m: 5.0,
            arrival_dist_m: 1.0,
            steer_responsiveness: 8.0,
        }
    }
}
