//! # Simulated rover
//!
//! A kinematic bicycle model driven by steering, drive torque and brake torque.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use serde::Deserialize;
use util::maths::{sign_or_zero, wrap_pi};

use super::SimWorld;
use crate::auto::loc::Pose;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct RoverParams {
    /// Distance between the front and rear axles
    pub wheelbase_m: f64,

    pub wheel_radius_m: f64,

    pub mass_kg: f64,

    /// Linear drag coefficient, force opposing motion per unit speed
    ///
    /// Units: Newton seconds per meter
    pub drag_coeff: f64,

    /// Radius of the rover's footprint, used for collisions
    pub body_radius_m: f64,

    /// Tag of the spheres the rover collides with
    pub obstacle_tag: String,
}

pub struct SimRover {
    params: RoverParams,
    pose: Pose,
    speed_ms: f64,

    /// Number of steps in which the rover was blocked by an obstacle
    num_collisions: usize,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for RoverParams {
    fn default() -> Self {
        Self {
            wheelbase_m: 1.5,
            wheel_radius_m: 0.3,
            mass_kg: 20.0,
            drag_coeff: 60.0,
            body_radius_m: 0.5,
            obstacle_tag: String::from("Obstacle"),
        }
    }
}

impl SimRover {
    pub fn new(params: RoverParams, pose: Pose) -> Self {
        Self {
            params,
            pose,
            speed_ms: 0.0,
            num_collisions: 0,
        }
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Forward speed, negative when reversing
    pub fn speed_ms(&self) -> f64 {
        self.speed_ms
    }

    pub fn num_collisions(&self) -> usize {
        self.num_collisions
    }

    /// Advance the rover by `dt_s` under the given commands.
    pub fn step(
        &mut self,
        steer_rad: f64,
        throttle_nm: f64,
        brake_nm: f64,
        dt_s: f64,
        world: &SimWorld,
    ) {
        let p = &self.params;
        if dt_s <= 0.0 || p.mass_kg <= 0.0 || p.wheel_radius_m <= 0.0 {
            return;
        }

        // ---- SPEED ----

        let drive_n = throttle_nm / p.wheel_radius_m;
        let drag_n = p.drag_coeff * self.speed_ms;
        self.speed_ms += (drive_n - drag_n) / p.mass_kg * dt_s;

        // Brakes slow the rover down but never push it backwards
        let brake_dv = brake_nm.abs() / p.wheel_radius_m / p.mass_kg * dt_s;
        if brake_dv >= self.speed_ms.abs() {
            self.speed_ms = 0.0;
        } else {
            self.speed_ms -= sign_or_zero(self.speed_ms) * brake_dv;
        }

        // ---- POSE ----

        let heading_rate = if p.wheelbase_m > 0.0 {
            self.speed_ms * steer_rad.tan() / p.wheelbase_m
        } else {
            0.0
        };

        let heading_rad = wrap_pi(self.pose.heading_rad + heading_rate * dt_s);
        let next = Pose::new(self.pose.position_m, heading_rad);
        let position_m = self.pose.position_m + next.forward() * self.speed_ms * dt_s;

        if world.is_blocked(&position_m, p.body_radius_m, &p.obstacle_tag) {
            trace!("Rover blocked at {:?}", position_m.as_slice());
            self.num_collisions += 1;
            self.speed_ms = 0.0;
            self.pose.heading_rad = heading_rad;
        } else {
            self.pose = Pose::new(position_m, heading_rad);
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
