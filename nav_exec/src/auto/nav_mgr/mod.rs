//! # Navigation manager
//!
//! The [`NavMgr`] is the only type a host needs. It owns one instance of every navigation
//! component, along with the injected path and ray query collaborators, and runs them in
//! dependency order once per control tick:
//!
//! 1. `Localizer` - estimate the pose from the raw pose.
//! 2. `ObstAvoid` - scan the sensors from the raw (physical) pose.
//! 3. `PathFollower` - steer towards the mission's active target using the estimated pose.
//! 4. `MissionCoord` - observe the arrival event and choose the next active target.
//!
//! The drive commands are then arbitrated. In order of priority:
//!
//! 1. Stopped, or no active target - brake.
//! 2. Obstacle avoidance reversing - straight steering, negative torque.
//! 3. Obstacle avoidance stop - brake.
//! 4. Obstacle avoidance steering away - full steering to one side, follower's torque.
//! 5. The follower's demands.
//!
//! Finally the steering demand is smoothed by the [`SteerFilter`].

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod params;
pub mod tm;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{info, warn};
use nalgebra::Vector3;
use serde::Serialize;
use std::{convert::Infallible, rc::Rc};

use super::{
    ext::{PathProvider, RayQuery},
    loc::{self, Landmark, LocError, Localizer, Pose},
    mission::{MissionCoord, MissionError, MissionInput, MissionState, Target},
    obst_avoid::{AvoidCmd, AvoidState, ObstAvoid, ObstAvoidInput},
    path_follow::{PathFollower, SteerFilter},
    route_opt::{Route, RouteOptimizer},
};
use util::module::State;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use self::{params::NavMgrParams, tm::NavTm};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Navigation manager
pub struct NavMgr {
    params: NavMgrParams,

    loc: Localizer,

    /// The configuration error which disabled the localizer, if any
    loc_error: Option<LocError>,

    obst_avoid: ObstAvoid,

    follower: PathFollower,

    mission: MissionCoord,

    steer_filter: SteerFilter,

    /// Last mission waypoint handed to the follower
    waypoint_seq: u64,

    /// Set by [`NavMgr::stop`], cleared when a new mission starts
    stopped: bool,

    time_s: f64,
}

/// Builds a [`NavMgr`], checking that every collaborator has been supplied.
pub struct NavMgrBuilder {
    params: NavMgrParams,
    landmarks: Vec<Landmark>,
    path_provider: Option<Rc<dyn PathProvider>>,
    ray_query: Option<Rc<dyn RayQuery>>,
    initial_pose: Pose,
}

/// Input to a navigation tick.
#[derive(Debug, Clone, Copy)]
pub struct NavInput {
    /// The true pose of the rover, as given by the host
    pub raw_pose: Pose,

    /// Measured forward speed of the rover
    pub speed_ms: f64,

    /// Time elapsed since the previous tick
    pub dt_s: f64,
}

/// Commands and observable state produced by a navigation tick.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct NavOutput {
    /// Smoothed steering angle to apply, positive turns right
    pub steer_rad: f64,

    /// Steering demand before smoothing
    pub steer_demand_rad: f64,

    /// Drive torque, negative when reversing
    pub throttle_nm: f64,

    /// Brake torque
    pub brake_nm: f64,

    pub mission_state: MissionState,

    pub avoid_state: AvoidState,

    pub estimated_pose: Pose,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum NavMgrError {
    #[error("No {0} was provided to the navigation manager")]
    MissingCollaborator(&'static str),

    #[error("Mission error: {0}")]
    MissionError(#[from] MissionError),
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl NavMgrBuilder {
    pub fn new(params: NavMgrParams) -> Self {
        Self {
            params,
            landmarks: Vec::new(),
            path_provider: None,
            ray_query: None,
            initial_pose: Pose::default(),
        }
    }

    pub fn landmarks(mut self, landmarks: Vec<Landmark>) -> Self {
        self.landmarks = landmarks;
        self
    }

    pub fn path_provider(mut self, provider: Rc<dyn PathProvider>) -> Self {
        self.path_provider = Some(provider);
        self
    }

    pub fn ray_query(mut self, query: Rc<dyn RayQuery>) -> Self {
        self.ray_query = Some(query);
        self
    }

    /// Pose reported by the localizer before its first estimate.
    pub fn initial_pose(mut self, pose: Pose) -> Self {
        self.initial_pose = pose;
        self
    }

    /// Build the manager.
    ///
    /// A missing collaborator is an error. A localizer configuration error is not, the localizer
    /// is disabled and keeps reporting the initial pose.
    pub fn build(self) -> Result<NavMgr, NavMgrError> {
        let provider = self
            .path_provider
            .ok_or(NavMgrError::MissingCollaborator("path provider"))?;
        let query = self
            .ray_query
            .ok_or(NavMgrError::MissingCollaborator("ray query provider"))?;

        let params = self.params;

        let (mut loc, loc_error) = loc::init_or_disable(params.loc.clone(), self.landmarks);
        loc.set_initial_pose(self.initial_pose);

        let obst_avoid = ObstAvoid::new(params.obst_avoid.clone(), query.clone());
        let follower = PathFollower::new(params.path_follow.clone(), provider.clone());
        let optimiser = RouteOptimizer::new(params.route_opt.clone(), provider);
        let mission = MissionCoord::new(params.mission.clone(), optimiser, query);
        let steer_filter = SteerFilter::new(params.path_follow.steer_responsiveness);

        info!("NavMgr initialised");

        Ok(NavMgr {
            params,
            loc,
            loc_error,
            obst_avoid,
            follower,
            mission,
            steer_filter,
            waypoint_seq: 0,
            stopped: false,
            time_s: 0.0,
        })
    }
}

impl NavMgr {
    /// Start a new mission from the current estimated position.
    ///
    /// Returns the computed route.
    pub fn start_mission(&mut self, targets: Vec<Target>, return_to_start: bool) -> Route {
        let pose = self.loc.get_pose();

        self.stopped = false;
        self.obst_avoid.reset();

        let route = self.mission.start_mission(targets, return_to_start, &pose);
        self.sync_follower_target();

        route
    }

    /// Recompute the order of the remaining targets from the current estimated position.
    pub fn reoptimise_route(&mut self) -> Result<Route, NavMgrError> {
        let route = self.mission.reoptimise(&self.loc.get_pose())?;
        self.sync_follower_target();
        Ok(route)
    }

    /// Stop navigating. The active target is cleared and the rover is braked from the next tick,
    /// any pending mission waits are abandoned.
    pub fn stop(&mut self) {
        info!("Navigation stopped");

        self.mission.stop();
        self.follower.set_target(None);
        self.obst_avoid.reset();
        self.stopped = true;
    }

    /// Run one navigation tick.
    pub fn step(&mut self, input: &NavInput) -> (NavOutput, NavTm) {
        infallible(self.proc(input))
    }

    pub fn get_estimated_position(&self) -> Vector3<f64> {
        self.loc.get_pose().position_m
    }

    pub fn get_estimated_pose(&self) -> Pose {
        self.loc.get_pose()
    }

    pub fn get_mission_state(&self) -> MissionState {
        self.mission.get_state()
    }

    pub fn get_avoid_state(&self) -> AvoidState {
        self.obst_avoid.get_state()
    }

    pub fn get_route(&self) -> Option<&Route> {
        self.mission.get_route()
    }

    pub fn get_active_target(&self) -> Option<Vector3<f64>> {
        self.mission.get_active_target()
    }

    pub fn num_targets_handled(&self) -> usize {
        self.mission.num_handled()
    }

    pub fn is_localiser_enabled(&self) -> bool {
        self.loc.is_enabled()
    }

    /// The configuration error which disabled the localizer, if any.
    pub fn localiser_error(&self) -> Option<&LocError> {
        self.loc_error.as_ref()
    }

    pub fn params(&self) -> &NavMgrParams {
        &self.params
    }

    /// Hand the mission's active target to the follower, re-arming its arrival event whenever the
    /// mission has issued a new waypoint.
    fn sync_follower_target(&mut self) {
        let seq = self.mission.get_waypoint_seq();
        if seq != self.waypoint_seq {
            self.follower.rearm();
            self.waypoint_seq = seq;
        }
        self.follower.set_target(self.mission.get_active_target());
    }
}

impl State for NavMgr {
    type InputData = NavInput;
    type OutputData = NavOutput;
    type StatusReport = NavTm;
    type ProcError = Infallible;

    fn proc(&mut self, input: &NavInput) -> Result<(NavOutput, NavTm), Infallible> {
        let dt_s = input.dt_s.max(0.0);
        self.time_s += dt_s;

        let mut tm = NavTm {
            time_s: self.time_s,
            ..Default::default()
        };

        // ---- LOCALISATION ----

        let est_pose = match self.loc.proc(&input.raw_pose) {
            Ok((pose, report)) => {
                tm.loc_rms_residual_m = report.rms_residual_m;
                pose
            }
            Err(e) => {
                warn!("Localisation failed, using the previous estimate: {}", e);
                self.loc.get_pose()
            }
        };
        tm.set_poses(&input.raw_pose, &est_pose);

        // ---- OBSTACLE AVOIDANCE ----

        let (avoid, avoid_report) = infallible(self.obst_avoid.proc(&ObstAvoidInput {
            pose: input.raw_pose,
            speed_ms: input.speed_ms,
            dt_s,
            drive_requested: !self.stopped && self.follower.get_target().is_some(),
        }));
        tm.accumulator = avoid.accumulator;
        tm.blocked_ahead = avoid_report.blocked_ahead;

        // ---- PATH FOLLOWING ----

        let (follow, follow_report) = infallible(self.follower.proc(&est_pose));
        tm.dist_to_target_m = follow_report.dist_to_target_m;

        // ---- MISSION ----

        let (mission, _) = infallible(self.mission.proc(&MissionInput {
            pose: est_pose,
            target_reached: follow.target_reached,
            dt_s,
        }));
        self.sync_follower_target();

        if let Some(t) = mission.active_target_m {
            tm.target_x_m = Some(t[0]);
            tm.target_z_m = Some(t[2]);
        }

        // ---- ARBITRATION ----

        let brake_nm = self.params.path_follow.brake_torque_nm;
        let max_steer_rad = self.params.path_follow.max_steer_rad;

        let (steer_demand_rad, throttle_nm, brake_nm) =
            if self.stopped || mission.active_target_m.is_none() {
                (0.0, 0.0, brake_nm)
            } else {
                match avoid.cmd {
                    AvoidCmd::Reverse(torque_nm) => (0.0, torque_nm, 0.0),
                    AvoidCmd::Stop => (0.0, 0.0, brake_nm),
                    AvoidCmd::SteerAway(side) => {
                        (max_steer_rad * side, follow.torque_nm, follow.brake_nm)
                    }
                    AvoidCmd::None => (follow.steer_rad, follow.torque_nm, follow.brake_nm),
                }
            };

        let steer_rad = self.steer_filter.update(steer_demand_rad, dt_s);

        tm.mission_state = mission.state;
        tm.avoid_state = avoid.state;
        tm.steer_demand_rad = steer_demand_rad;
        tm.steer_rad = steer_rad;
        tm.throttle_nm = throttle_nm;
        tm.brake_nm = brake_nm;

        Ok((
            NavOutput {
                steer_rad,
                steer_demand_rad,
                throttle_nm,
                brake_nm,
                mission_state: mission.state,
                avoid_state: avoid.state,
                estimated_pose: est_pose,
            },
            tm,
        ))
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn infallible<T>(result: Result<T, Infallible>) -> T {
    match result {
        Ok(v) => v,
        Err(e) => match e {},
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
