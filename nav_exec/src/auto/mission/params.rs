//! Mission coordination parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Deserialize, Debug, Clone)]
pub struct MissionParams {
    /// Tag of the colliders the detector looks for
    pub detect_tag: String,

    /// Radius of the detector's volume query around the rover
    pub detect_radius_m: f64,

    /// Time between detector scans
    pub detect_period_s: f64,

    /// Pause between reaching a target with an area grid and issuing its first sweep point
    pub sweep_start_delay_s: f64,

    /// Time the rover waits at a reached target or detected object before moving on
    pub arrival_settle_s: f64,
}

impl Default for MissionParams {
    fn default() -> Self {
        Self {
            detect_tag: String::from("Detectable"),
            detect_radius_m: 8.0,
            detect_period_s: 0.5,
            sweep_start_delay_s: 1.0,
            arrival_settle_s: 1.0,
        }
    }
}
