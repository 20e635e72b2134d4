//! Obstacle avoidance parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Deserialize, Debug, Clone)]
pub struct ObstAvoidParams {
    /// Only colliders with this tag are treated as obstacles
    pub obstacle_tag: String,

    /// Maximum range of every sensor ray
    pub sensor_range_m: f64,

    /// Longitudinal offset of the sensor bar from the rover's reference point
    pub sensor_forward_offset_m: f64,

    /// Height of the sensor bar above the rover's reference point
    pub sensor_height_m: f64,

    /// Lateral offset of the left and right sensors from the centreline
    pub side_sensor_offset_m: f64,

    /// Angle the angled sensors are turned outwards from straight ahead
    pub angled_sensor_rad: f64,

    /// Total width spanned by the centre fan
    pub centre_fan_width_m: f64,

    /// Number of parallel rays in the centre fan
    pub centre_fan_num_rays: usize,

    /// Below this speed the rover counts as not moving for stuck detection
    pub min_speed_ms: f64,

    /// Time the rover must be blocked and not moving before it reverses
    pub stuck_time_s: f64,

    /// Magnitude of the (negative) drive torque while reversing
    pub reverse_torque_nm: f64,
}

impl Default for ObstAvoidParams {
    fn default() -> Self {
        Self {
            obstacle_tag: String::from("Obstacle"),
            sensor_range_m: 6.0,
            sensor_forward_offset_m: 1.0,
            sensor_height_m: 0.5,
            side_sensor_offset_m: 0.6,
            angled_sensor_rad: 0.5236,
            centre_fan_width_m: 1.0,
            centre_fan_num_rays: 5,
            min_speed_ms: 0.1,
            stuck_time_s: 2.0,
            reverse_torque_nm: 60.0,
        }
    }
}
