//! Obstacle avoidance module state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::{convert::Infallible, fmt::Display, rc::Rc};

// Internal
use super::{
    sensors::{self, Sensor, SensorReading},
    ObstAvoidParams,
};
use crate::auto::{ext::RayQuery, loc::Pose};
use util::{maths::sign_or_zero, module::State};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Reactive obstacle avoidance.
pub struct ObstAvoid {
    params: ObstAvoidParams,

    query: Rc<dyn RayQuery>,

    state: AvoidState,

    /// Accumulated time the rover has been blocked ahead and not moving
    stuck_timer_s: f64,
}

/// Input data to obstacle avoidance.
#[derive(Debug, Clone, Copy)]
pub struct ObstAvoidInput {
    /// Physical pose of the rover, the sensors are cast from here
    pub pose: Pose,

    /// Measured speed of the rover
    pub speed_ms: f64,

    pub dt_s: f64,

    /// True if the rover is being asked to drive. Stuck detection only runs while driving.
    pub drive_requested: bool,
}

/// Output of obstacle avoidance.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ObstAvoidOutput {
    pub state: AvoidState,
    pub cmd: AvoidCmd,

    /// Sum of the avoidance weights of this tick's hits, positive to steer right
    pub accumulator: f64,
}

/// Status report of obstacle avoidance.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ObstAvoidReport {
    /// Every ray cast this tick
    pub readings: Vec<SensorReading>,

    /// True if any centre fan ray hit an obstacle
    pub blocked_ahead: bool,

    pub stuck_timer_s: f64,
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// The state of obstacle avoidance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AvoidState {
    /// No obstacle, the path follower's demands are used
    Following,

    /// An obstacle has been sensed and the rover is steering away from it
    Avoiding,

    /// The rover was stuck and is backing away until its sensors are clear
    Reversing,
}

/// Override demanded by obstacle avoidance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum AvoidCmd {
    /// No override, follow the path
    None,

    /// Steer fully to one side, +1 for right, -1 for left
    SteerAway(f64),

    /// Drive backwards with straight steering, the contained torque is negative
    Reverse(f64),

    /// Hold the rover still for this tick
    Stop,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for AvoidState {
    fn default() -> Self {
        AvoidState::Following
    }
}

impl Display for AvoidState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AvoidState::Following => write!(f, "AvoidState::Following"),
            AvoidState::Avoiding => write!(f, "AvoidState::Avoiding"),
            AvoidState::Reversing => write!(f, "AvoidState::Reversing"),
        }
    }
}

impl ObstAvoid {
    pub fn new(params: ObstAvoidParams, query: Rc<dyn RayQuery>) -> Self {
        Self {
            params,
            query,
            state: AvoidState::Following,
            stuck_timer_s: 0.0,
        }
    }

    pub fn get_state(&self) -> AvoidState {
        self.state
    }

    /// Return to following, abandoning any recovery.
    pub fn reset(&mut self) {
        self.set_state(AvoidState::Following);
        self.stuck_timer_s = 0.0;
    }

    fn set_state(&mut self, state: AvoidState) {
        if state != self.state {
            info!("Obstacle avoidance state change to: {}", state);
            self.state = state;
        }
    }

    /// Cast the side sensors, each angled sensor only if its side sensor is clear, and sum their
    /// weights.
    fn side_sweep(&self, pose: &Pose, readings: &mut Vec<SensorReading>) -> f64 {
        let mut accumulator = 0.0;

        for (side, angled) in [
            (Sensor::RightSide, Sensor::RightAngled),
            (Sensor::LeftSide, Sensor::LeftAngled),
        ]
        .iter()
        {
            let reading = sensors::cast(&*self.query, pose, &self.params, *side);
            readings.push(reading);

            if reading.is_hit() {
                accumulator += side.weight();
            } else {
                let reading = sensors::cast(&*self.query, pose, &self.params, *angled);
                readings.push(reading);

                if reading.is_hit() {
                    accumulator += angled.weight();
                }
            }
        }

        accumulator
    }

    /// Cast every sensor, returning true if none of them hit.
    fn full_sweep_clear(&self, pose: &Pose, readings: &mut Vec<SensorReading>) -> bool {
        let all = [
            Sensor::RightSide,
            Sensor::RightAngled,
            Sensor::LeftSide,
            Sensor::LeftAngled,
        ];

        readings.extend(
            all.iter()
                .map(|s| sensors::cast(&*self.query, pose, &self.params, *s)),
        );
        readings.extend(sensors::cast_centre_fan(&*self.query, pose, &self.params));

        readings.iter().all(|r| !r.is_hit())
    }

    fn proc_reversing(
        &mut self,
        input: &ObstAvoidInput,
        report: &mut ObstAvoidReport,
    ) -> ObstAvoidOutput {
        if self.full_sweep_clear(&input.pose, &mut report.readings) {
            info!("Sensors clear, stopping before resuming");
            self.reset();

            return ObstAvoidOutput {
                state: self.state,
                cmd: AvoidCmd::Stop,
                accumulator: 0.0,
            };
        }

        ObstAvoidOutput {
            state: self.state,
            cmd: AvoidCmd::Reverse(-self.params.reverse_torque_nm.abs()),
            accumulator: 0.0,
        }
    }

    fn proc_driving(
        &mut self,
        input: &ObstAvoidInput,
        report: &mut ObstAvoidReport,
    ) -> ObstAvoidOutput {
        let mut accumulator = self.side_sweep(&input.pose, &mut report.readings);

        // The centre fan is always cast as it is also the blocked-ahead signal
        let centre = sensors::cast_centre_fan(&*self.query, &input.pose, &self.params);
        let nearest_centre = centre
            .iter()
            .filter_map(|r| r.hit)
            .min_by_key(|h| OrderedFloat(h.distance_m));
        report.readings.extend(centre.iter().copied());

        report.blocked_ahead = nearest_centre.is_some();

        // Exact cancellation of the sides leaves the decision to the centre fan
        if accumulator == 0.0 {
            if let Some(hit) = nearest_centre {
                accumulator = sensors::centre_weight(&input.pose, &hit);
            }
        }

        // ---- STUCK DETECTION ----

        if input.drive_requested
            && report.blocked_ahead
            && input.speed_ms.abs() < self.params.min_speed_ms
        {
            self.stuck_timer_s += input.dt_s.max(0.0);
        } else {
            self.stuck_timer_s = 0.0;
        }
        report.stuck_timer_s = self.stuck_timer_s;

        if report.blocked_ahead && self.stuck_timer_s >= self.params.stuck_time_s {
            info!("Rover stuck for {:.2} s, reversing", self.stuck_timer_s);
            self.stuck_timer_s = 0.0;
            self.set_state(AvoidState::Reversing);

            return ObstAvoidOutput {
                state: self.state,
                cmd: AvoidCmd::Reverse(-self.params.reverse_torque_nm.abs()),
                accumulator,
            };
        }

        // ---- AVOIDANCE ----

        if accumulator != 0.0 {
            self.set_state(AvoidState::Avoiding);
            debug!("Avoiding obstacle, accumulator {}", accumulator);

            ObstAvoidOutput {
                state: self.state,
                cmd: AvoidCmd::SteerAway(sign_or_zero(accumulator)),
                accumulator,
            }
        } else {
            self.set_state(AvoidState::Following);

            ObstAvoidOutput {
                state: self.state,
                cmd: AvoidCmd::None,
                accumulator,
            }
        }
    }
}

impl State for ObstAvoid {
    type InputData = ObstAvoidInput;
    type OutputData = ObstAvoidOutput;
    type StatusReport = ObstAvoidReport;
    type ProcError = Infallible;

    fn proc(
        &mut self,
        input: &ObstAvoidInput,
    ) -> Result<(ObstAvoidOutput, ObstAvoidReport), Infallible> {
        let mut report = ObstAvoidReport::default();

        let output = match self.state {
            AvoidState::Reversing => self.proc_reversing(input, &mut report),
            AvoidState::Following | AvoidState::Avoiding => self.proc_driving(input, &mut report),
        };

        Ok((output, report))
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
