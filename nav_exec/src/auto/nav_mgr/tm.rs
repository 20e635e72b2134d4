//! # Navigation telemetry
//!
//! One flat record per tick, written to the session's CSV archive by the executable.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use serde::Serialize;

use crate::auto::{loc::Pose, mission::MissionState, obst_avoid::AvoidState};

// -----------------------------------------------------------------------------------------------
// STRUCTS
// -----------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Default)]
pub struct NavTm {
    /// Navigation time, the sum of every tick's elapsed time
    pub time_s: f64,

    pub raw_x_m: f64,
    pub raw_y_m: f64,
    pub raw_z_m: f64,
    pub raw_heading_rad: f64,

    pub est_x_m: f64,
    pub est_y_m: f64,
    pub est_z_m: f64,
    pub est_heading_rad: f64,

    pub target_x_m: Option<f64>,
    pub target_z_m: Option<f64>,
    pub dist_to_target_m: Option<f64>,

    pub mission_state: MissionState,
    pub avoid_state: AvoidState,
    pub accumulator: f64,
    pub blocked_ahead: bool,

    pub steer_demand_rad: f64,
    pub steer_rad: f64,
    pub throttle_nm: f64,
    pub brake_nm: f64,

    pub loc_rms_residual_m: f64,
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl NavTm {
    pub(super) fn set_poses(&mut self, raw: &Pose, est: &Pose) {
        self.raw_x_m = raw.position_m[0];
        self.raw_y_m = raw.position_m[1];
        self.raw_z_m = raw.position_m[2];
        self.raw_heading_rad = raw.heading_rad;

        self.est_x_m = est.position_m[0];
        self.est_y_m = est.position_m[1];
        self.est_z_m = est.position_m[2];
        self.est_heading_rad = est.heading_rad;
    }
}
