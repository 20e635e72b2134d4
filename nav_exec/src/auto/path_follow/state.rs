//! Path following module state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace};
use nalgebra::Vector3;
use serde::Serialize;
use std::{convert::Infallible, rc::Rc};

// Internal
use super::{controllers, PathFollowParams};
use crate::auto::{ext::PathProvider, loc::Pose, path::Path};
use util::module::State;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Steers the rover along a path towards its active target.
pub struct PathFollower {
    params: PathFollowParams,

    provider: Rc<dyn PathProvider>,

    /// The point currently being driven to
    target_m: Option<Vector3<f64>>,

    /// Set once the arrival event has fired for the current approach.
    arrival_latched: bool,
}

/// Drive demands produced by the follower.
#[derive(Debug, Default, Copy, Clone, Serialize)]
pub struct PathFollowOutput {
    /// Steering demand, positive turns right
    pub steer_rad: f64,

    /// Drive torque demand, never negative
    pub torque_nm: f64,

    /// Brake torque demand
    pub brake_nm: f64,

    /// True on the single tick in which the target is first reached.
    pub target_reached: bool,

    /// True while the rover is within the arrival distance of the target.
    pub arrived: bool,
}

/// Monitoring quantities of the follower.
#[derive(Debug, Default, Clone, Serialize)]
pub struct PathFollowReport {
    /// Ground plane distance to the target, if there is one
    pub dist_to_target_m: Option<f64>,

    /// Look-ahead point being steered towards
    pub look_ahead_m: Option<Vector3<f64>>,

    /// False if the provider had no path and a straight line was used
    pub path_found: bool,

    /// Number of points in the followed path
    pub num_path_points: usize,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PathFollower {
    pub fn new(params: PathFollowParams, provider: Rc<dyn PathProvider>) -> Self {
        Self {
            params,
            provider,
            target_m: None,
            arrival_latched: false,
        }
    }

    /// Set (or clear) the active target.
    ///
    /// A different target starts a new approach, re-arming the arrival event.
    pub fn set_target(&mut self, target_m: Option<Vector3<f64>>) {
        if target_m != self.target_m {
            if let Some(t) = target_m {
                debug!("PathFollower target set to {:?}", t.as_slice());
            }
            self.arrival_latched = false;
        }
        self.target_m = target_m;
    }

    /// Treat the next arrival at the current target as a new approach.
    ///
    /// Needed when the same point is issued twice in a row, which [`Self::set_target`] cannot tell
    /// apart from no change.
    pub fn rearm(&mut self) {
        self.arrival_latched = false;
    }

    pub fn get_target(&self) -> Option<Vector3<f64>> {
        self.target_m
    }

    pub fn params(&self) -> &PathFollowParams {
        &self.params
    }

    /// Demands which hold the rover still.
    pub fn stop_output(&self) -> PathFollowOutput {
        PathFollowOutput {
            steer_rad: 0.0,
            torque_nm: 0.0,
            brake_nm: self.params.brake_torque_nm,
            target_reached: false,
            arrived: false,
        }
    }

    /// Get the path to follow, falling back to a straight line if there is no walkable path.
    fn get_path(&self, from: &Vector3<f64>, to: &Vector3<f64>) -> (Path, bool) {
        match self.provider.path(from, to) {
            Some(p) if !p.is_empty() => (p, true),
            _ => {
                trace!("No path to {:?}, using a straight line", to.as_slice());
                (Path::direct(*from, *to), false)
            }
        }
    }
}

impl State for PathFollower {
    type InputData = Pose;
    type OutputData = PathFollowOutput;
    type StatusReport = PathFollowReport;
    type ProcError = Infallible;

    /// Calculate the drive demands for the (estimated) pose of the rover.
    fn proc(
        &mut self,
        pose: &Pose,
    ) -> Result<(PathFollowOutput, PathFollowReport), Infallible> {
        let mut report = PathFollowReport::default();

        let target_m = match self.target_m {
            Some(t) => t,
            None => return Ok((self.stop_output(), report)),
        };

        let dist_m = pose.ground_dist_to(&target_m);
        report.dist_to_target_m = Some(dist_m);

        // ---- ARRIVAL ----

        if dist_m <= self.params.arrival_dist_m {
            let mut output = self.stop_output();
            output.arrived = true;

            if !self.arrival_latched {
                info!("Target {:?} reached", target_m.as_slice());
                self.arrival_latched = true;
                output.target_reached = true;
            }

            return Ok((output, report));
        }

        // Outside the arrival radius a later return is a new approach
        self.arrival_latched = false;

        // ---- STEERING ----

        let (path, path_found) = self.get_path(&pose.position_m, &target_m);
        report.path_found = path_found;
        report.num_path_points = path.get_num_points();

        let look_ahead_m = path
            .look_ahead_point(self.params.look_ahead_m)
            .unwrap_or(target_m);
        report.look_ahead_m = Some(look_ahead_m);

        let steer_rad =
            controllers::steer_demand(&pose.to_local(&look_ahead_m), self.params.max_steer_rad);

        // ---- TORQUE ----

        let torque_nm = controllers::torque_demand(
            dist_m,
            self.params.slowing_dist_m,
            self.params.max_torque_nm,
        );

        Ok((
            PathFollowOutput {
                steer_rad,
                torque_nm,
                brake_nm: 0.0,
                target_reached: false,
                arrived: false,
            },
            report,
        ))
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::cell::Cell;

    /// Provider which never finds a path, counting how often it is asked.
    struct NoPaths {
        calls: Cell<usize>,
    }

    impl PathProvider for NoPaths {
        fn path(&self, _: &Vector3<f64>, _: &Vector3<f64>) -> Option<Path> {
            self.calls.set(self.calls.get() + 1);
            None
        }
    }

    /// Provider which routes via a fixed waypoint.
    struct ViaPoint(Vector3<f64>);

    impl PathProvider for ViaPoint {
        fn path(&self, from: &Vector3<f64>, to: &Vector3<f64>) -> Option<Path> {
            Some(Path::new(vec![*from, self.0, *to]))
        }
    }

    fn follower(provider: Rc<dyn PathProvider>) -> PathFollower {
        PathFollower::new(PathFollowParams::default(), provider)
    }

    #[test]
    fn test_no_target_stops() {
        let mut pf = follower(Rc::new(NoPaths { calls: Cell::new(0) }));
        let (out, report) = pf.proc(&Pose::default()).unwrap();

        assert_eq!(out.torque_nm, 0.0);
        assert_eq!(out.brake_nm, pf.params().brake_torque_nm);
        assert!(report.dist_to_target_m.is_none());
    }

    #[test]
    fn test_straight_line_fallback() {
        let provider = Rc::new(NoPaths { calls: Cell::new(0) });
        let mut pf = follower(provider.clone());
        pf.set_target(Some(Vector3::new(10.0, 0.0, 10.0)));

        let (out, report) = pf.proc(&Pose::default()).unwrap();

        assert_eq!(provider.calls.get(), 1);
        assert!(!report.path_found);
        assert_eq!(report.num_path_points, 2);

        // Target is ahead and to the right at 45 degrees
        assert!(out.steer_rad > 0.0);
        let expected = pf.params().max_steer_rad * std::f64::consts::FRAC_1_SQRT_2;
        assert!((out.steer_rad - expected).abs() < 1e-9);
        assert_eq!(out.torque_nm, pf.params().max_torque_nm);
        assert_eq!(out.brake_nm, 0.0);
    }

    #[test]
    fn test_follows_provider_path() {
        // The path detours to the left before reaching a target straight ahead
        let mut pf = follower(Rc::new(ViaPoint(Vector3::new(-2.0, 0.0, 2.0))));
        pf.set_target(Some(Vector3::new(0.0, 0.0, 20.0)));

        let (out, report) = pf.proc(&Pose::default()).unwrap();

        assert!(report.path_found);
        assert_eq!(report.num_path_points, 3);
        assert!(out.steer_rad < 0.0);
    }

    #[test]
    fn test_slowing() {
        let mut pf = follower(Rc::new(NoPaths { calls: Cell::new(0) }));
        pf.set_target(Some(Vector3::new(0.0, 0.0, 2.5)));

        let (out, _) = pf.proc(&Pose::default()).unwrap();

        let p = pf.params();
        let expected = p.max_torque_nm * (2.5 / p.slowing_dist_m).powi(2);
        assert!((out.torque_nm - expected).abs() < 1e-9);
    }

    #[test]
    fn test_arrival_latch() {
        let mut pf = follower(Rc::new(NoPaths { calls: Cell::new(0) }));
        let target = Vector3::new(0.0, 2.0, 5.0);
        pf.set_target(Some(target));

        // Arrival is measured in the ground plane, so the height difference is ignored
        let near = Pose::new(Vector3::new(0.0, 0.0, 4.5), 0.0);
        let far = Pose::new(Vector3::new(0.0, 0.0, 0.0), 0.0);

        let (out, _) = pf.proc(&near).unwrap();
        assert!(out.target_reached);
        assert!(out.arrived);
        assert_eq!(out.torque_nm, 0.0);
        assert!(out.brake_nm > 0.0);

        // Fires only once while inside the radius
        let (out, _) = pf.proc(&near).unwrap();
        assert!(!out.target_reached);
        assert!(out.arrived);

        // Setting the same target again does not re-arm
        pf.set_target(Some(target));
        let (out, _) = pf.proc(&near).unwrap();
        assert!(!out.target_reached);

        // Leaving and coming back re-arms
        let (out, _) = pf.proc(&far).unwrap();
        assert!(!out.arrived);
        let (out, _) = pf.proc(&near).unwrap();
        assert!(out.target_reached);

        // So does a new target
        pf.set_target(Some(Vector3::new(0.0, 0.0, 4.0)));
        let (out, _) = pf.proc(&near).unwrap();
        assert!(out.target_reached);
    }

    #[test]
    fn test_rearm_same_target() {
        let mut pf = follower(Rc::new(NoPaths { calls: Cell::new(0) }));
        let target = Vector3::new(3.0, 0.0, 10.0);
        let at_target = Pose::new(target, 0.0);
        pf.set_target(Some(target));

        let (out, _) = pf.proc(&at_target).unwrap();
        assert!(out.target_reached);

        // Issued again without moving away
        pf.rearm();
        pf.set_target(Some(target));
        let (out, _) = pf.proc(&at_target).unwrap();
        assert!(out.target_reached);

        let (out, _) = pf.proc(&at_target).unwrap();
        assert!(!out.target_reached);
        assert!(out.arrived);
    }
}
