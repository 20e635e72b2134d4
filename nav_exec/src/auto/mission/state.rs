//! Mission coordination module state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use nalgebra::Vector3;
use serde::Serialize;
use std::{collections::HashSet, convert::Infallible, rc::Rc};

// Internal
use super::{search, timer::Timers, MissionError, MissionParams, MissionState, Target};
use crate::auto::{
    ext::{Collider, RayQuery},
    loc::Pose,
    route_opt::{Route, RouteOptimizer},
};
use util::module::State;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Sequences a multi-target mission.
pub struct MissionCoord {
    params: MissionParams,

    optimiser: RouteOptimizer,

    query: Rc<dyn RayQuery>,

    state: MissionState,

    targets: Vec<Target>,

    route: Option<Route>,

    /// Position in the route's order of the target currently being handled
    route_index: usize,

    /// Rover position when the mission started
    start_m: Vector3<f64>,

    /// True once the route is exhausted and the rover is driving back to the start
    returning: bool,

    /// Index of the active sweep point while searching
    sweep_index: usize,

    /// Object being driven to
    tracked: Option<Collider>,

    /// Ids of objects already reached, these are never detected again
    handled_ids: HashSet<u64>,

    timers: Timers<MissionAction>,

    /// Time since the last detector scan
    detect_elapsed_s: f64,

    /// Point the path follower should drive to
    active_target_m: Option<Vector3<f64>>,

    /// Incremented every time a waypoint is issued, even one equal to the last
    waypoint_seq: u64,

    num_handled: usize,
}

/// Input data to the mission coordinator.
#[derive(Debug, Clone, Copy)]
pub struct MissionInput {
    /// Estimated pose of the rover
    pub pose: Pose,

    /// Arrival event from the path follower for the previously issued target
    pub target_reached: bool,

    pub dt_s: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MissionOutput {
    pub state: MissionState,

    /// Point the path follower should drive to, `None` to hold the rover still
    pub active_target_m: Option<Vector3<f64>>,

    /// Changes whenever a new waypoint is issued, so an approach to a repeated point is still a
    /// new approach
    pub waypoint_seq: u64,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct MissionReport {
    pub route_index: usize,
    pub sweep_index: usize,
    pub tracked_id: Option<u64>,
    pub timer_pending: bool,

    /// Number of route targets handled so far
    pub num_handled: usize,
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// Actions resumed by the mission timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MissionAction {
    /// Issue the first sweep point of the current area grid
    StartSweep,

    /// Mark the current route entry as handled
    FinishTarget,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MissionCoord {
    pub fn new(params: MissionParams, optimiser: RouteOptimizer, query: Rc<dyn RayQuery>) -> Self {
        Self {
            params,
            optimiser,
            query,
            state: MissionState::Idle,
            targets: Vec::new(),
            route: None,
            route_index: 0,
            start_m: Vector3::zeros(),
            returning: false,
            sweep_index: 0,
            tracked: None,
            handled_ids: HashSet::new(),
            timers: Timers::new(),
            detect_elapsed_s: 0.0,
            active_target_m: None,
            waypoint_seq: 0,
            num_handled: 0,
        }
    }

    /// Start a new mission from the given pose, computing the route over the targets.
    ///
    /// Any mission in progress is abandoned.
    pub fn start_mission(
        &mut self,
        targets: Vec<Target>,
        return_to_start: bool,
        pose: &Pose,
    ) -> Route {
        self.timers.cancel_all();

        self.start_m = pose.position_m;
        self.returning = false;
        self.route_index = 0;
        self.sweep_index = 0;
        self.tracked = None;
        self.handled_ids.clear();
        self.num_handled = 0;

        let positions: Vec<Vector3<f64>> = targets.iter().map(|t| t.position_m).collect();
        let finish_m = if return_to_start { Some(&self.start_m) } else { None };
        let route = self.optimiser.optimise(&self.start_m, &positions, finish_m);

        info!(
            "Mission started with {} targets, route {:?} ({:.2} m{})",
            targets.len(),
            route.order.iter().map(|&i| targets[i].id).collect::<Vec<_>>(),
            route.length_m,
            if return_to_start { " including return" } else { "" }
        );

        self.targets = targets;
        self.route = Some(route.clone());

        if route.is_empty() {
            warn!("Mission started with no targets");
            self.active_target_m = None;
            self.set_state(MissionState::RouteComplete);
        } else {
            self.next_target();
        }

        route
    }

    /// Recompute the order of the targets not yet visited, starting from the given pose.
    ///
    /// Only possible while driving to a route target.
    pub fn reoptimise(&mut self, pose: &Pose) -> Result<Route, MissionError> {
        let route = match self.route {
            Some(ref r)
                if self.state == MissionState::NavigatingToTarget
                    && !self.returning
                    && !self.timers.is_pending() =>
            {
                r
            }
            _ => return Err(MissionError::CannotReoptimise(self.state)),
        };

        let remaining: Vec<usize> = route.order[self.route_index..].to_vec();
        let positions: Vec<Vector3<f64>> = remaining
            .iter()
            .map(|&i| self.targets[i].position_m)
            .collect();
        let finish_m = if route.return_to_start { Some(&self.start_m) } else { None };

        let partial = self.optimiser.optimise(&pose.position_m, &positions, finish_m);

        let new_route = Route {
            order: partial.order.iter().map(|&i| remaining[i]).collect(),
            return_to_start: partial.return_to_start,
            length_m: partial.length_m,
        };

        info!(
            "Route reoptimised, remaining order {:?} ({:.2} m)",
            new_route.order, new_route.length_m
        );

        self.route = Some(new_route.clone());
        self.route_index = 0;
        if let Some(pos) = new_route.order.first().map(|&i| self.targets[i].position_m) {
            self.issue(pos);
        }

        Ok(new_route)
    }

    /// Stop the mission, abandoning any pending waits and clearing the active target.
    pub fn stop(&mut self) {
        let num_cancelled = self.timers.cancel_all();
        if num_cancelled > 0 {
            debug!("{} pending mission timers abandoned", num_cancelled);
        }

        self.active_target_m = None;
        self.tracked = None;
        self.set_state(MissionState::Idle);
    }

    pub fn get_state(&self) -> MissionState {
        self.state
    }

    pub fn get_route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    pub fn get_active_target(&self) -> Option<Vector3<f64>> {
        self.active_target_m
    }

    pub fn get_targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn num_handled(&self) -> usize {
        self.num_handled
    }

    pub fn get_waypoint_seq(&self) -> u64 {
        self.waypoint_seq
    }

    /// Make a point the active target, as a new approach.
    fn issue(&mut self, target_m: Vector3<f64>) {
        self.active_target_m = Some(target_m);
        self.waypoint_seq = self.waypoint_seq.wrapping_add(1);
    }

    fn set_state(&mut self, state: MissionState) {
        if state != self.state {
            info!("Mission state change to: {}", state);
            self.state = state;
        }
    }

    /// The route target currently being handled, if the route is not exhausted.
    fn current_target(&self) -> Option<&Target> {
        self.route
            .as_ref()
            .and_then(|r| r.order.get(self.route_index))
            .map(|&i| &self.targets[i])
    }

    /// Issue the current route target, or the return to start, or complete the route.
    fn next_target(&mut self) {
        self.tracked = None;
        self.sweep_index = 0;

        if let Some(pos) = self.current_target().map(|t| t.position_m) {
            self.issue(pos);
            self.set_state(MissionState::NavigatingToTarget);
        } else if self.route.as_ref().map_or(false, |r| r.return_to_start) && !self.returning {
            info!("All targets handled, returning to start");
            self.returning = true;
            self.issue(self.start_m);
            self.set_state(MissionState::NavigatingToTarget);
        } else {
            info!("Route complete, {} targets handled", self.num_handled);
            self.active_target_m = None;
            self.set_state(MissionState::RouteComplete);
        }
    }

    fn target_handled(&mut self) {
        self.active_target_m = None;
        self.num_handled += 1;
        self.set_state(MissionState::TargetHandled);
    }

    fn run_action(&mut self, action: MissionAction) {
        match action {
            MissionAction::StartSweep => {
                if self.state != MissionState::SearchingArea {
                    return;
                }

                let first = self
                    .current_target()
                    .and_then(|t| t.area_grid.as_ref())
                    .and_then(|g| g.points_m.first().copied());

                match first {
                    Some(p) => self.issue(p),
                    None => self.active_target_m = None,
                }
                debug!("Area sweep started");
            }
            MissionAction::FinishTarget => self.target_handled(),
        }
    }

    /// Handle the path follower reaching the active target.
    fn on_reached(&mut self) {
        match self.state {
            MissionState::NavigatingToTarget => {
                if self.returning {
                    info!("Returned to start");
                    self.active_target_m = None;
                    self.set_state(MissionState::RouteComplete);
                    return;
                }

                self.active_target_m = None;

                let has_search = self.current_target().map_or(false, |t| t.has_search());
                if has_search {
                    self.set_state(MissionState::SearchingArea);
                    self.sweep_index = 0;
                    // Scan as soon as the search begins
                    self.detect_elapsed_s = self.params.detect_period_s;
                    self.timers
                        .schedule(self.params.sweep_start_delay_s, MissionAction::StartSweep);
                } else {
                    self.timers
                        .schedule(self.params.arrival_settle_s, MissionAction::FinishTarget);
                }
            }
            MissionState::SearchingArea => {
                self.sweep_index += 1;

                let next = self
                    .current_target()
                    .and_then(|t| t.area_grid.as_ref())
                    .and_then(|g| g.points_m.get(self.sweep_index).copied());

                match next {
                    Some(p) => self.issue(p),
                    None => {
                        info!("Area search complete, nothing detected");
                        self.target_handled();
                    }
                }
            }
            MissionState::MovingToDetectedObject => {
                if let Some(ref obj) = self.tracked {
                    info!("Detected object {} reached", obj.id);
                    self.handled_ids.insert(obj.id);
                }
                self.active_target_m = None;
                self.timers
                    .schedule(self.params.arrival_settle_s, MissionAction::FinishTarget);
            }
            _ => (),
        }
    }

    /// Run the detector if a scan is due.
    fn run_detector(&mut self, pose: &Pose, dt_s: f64) {
        self.detect_elapsed_s += dt_s;
        if self.detect_elapsed_s < self.params.detect_period_s {
            return;
        }
        self.detect_elapsed_s = 0.0;

        match self.state {
            MissionState::SearchingArea => {
                if let Some(obj) = search::detect_nearest(
                    &*self.query,
                    &pose.position_m,
                    self.params.detect_radius_m,
                    &self.params.detect_tag,
                    &self.handled_ids,
                ) {
                    info!("Detected object {} at {:?}", obj.id, obj.position_m.as_slice());
                    self.timers.cancel_all();
                    self.issue(obj.position_m);
                    self.tracked = Some(obj);
                    self.set_state(MissionState::MovingToDetectedObject);
                }
            }
            MissionState::MovingToDetectedObject => {
                // Not while settling at the object
                if self.active_target_m.is_none() {
                    return;
                }

                let id = match self.tracked {
                    Some(ref t) => t.id,
                    None => return,
                };

                if let Some(obj) = search::find_by_id(
                    &*self.query,
                    &pose.position_m,
                    self.params.detect_radius_m,
                    &self.params.detect_tag,
                    id,
                ) {
                    self.active_target_m = Some(obj.position_m);
                    self.tracked = Some(obj);
                }
            }
            _ => (),
        }
    }
}

impl State for MissionCoord {
    type InputData = MissionInput;
    type OutputData = MissionOutput;
    type StatusReport = MissionReport;
    type ProcError = Infallible;

    fn proc(&mut self, input: &MissionInput) -> Result<(MissionOutput, MissionReport), Infallible> {
        let had_target = self.active_target_m.is_some();

        match self.state {
            MissionState::Idle | MissionState::RouteComplete => (),
            MissionState::TargetHandled => {
                self.route_index += 1;
                self.next_target();
            }
            _ => {
                for action in self.timers.advance(input.dt_s) {
                    self.run_action(action);
                }

                if input.target_reached && had_target {
                    self.on_reached();
                }

                if matches!(
                    self.state,
                    MissionState::SearchingArea | MissionState::MovingToDetectedObject
                ) {
                    self.run_detector(&input.pose, input.dt_s);
                }
            }
        }

        Ok((
            MissionOutput {
                state: self.state,
                active_target_m: self.active_target_m,
                waypoint_seq: self.waypoint_seq,
            },
            MissionReport {
                route_index: self.route_index,
                sweep_index: self.sweep_index,
                tracked_id: self.tracked.as_ref().map(|t| t.id),
                timer_pending: self.timers.is_pending(),
                num_handled: self.num_handled,
            },
        ))
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::auto::{
        ext::{PathProvider, RayHit},
        mission::AreaGrid,
        path::Path,
        route_opt::RouteOptParams,
    };
    use std::cell::RefCell;

    struct NoPaths;

    impl PathProvider for NoPaths {
        fn path(&self, _: &Vector3<f64>, _: &Vector3<f64>) -> Option<Path> {
            None
        }
    }

    #[derive(Default)]
    struct Objects(RefCell<Vec<Collider>>);

    impl RayQuery for Objects {
        fn raycast(&self, _: &Vector3<f64>, _: &Vector3<f64>, _: f64) -> Option<RayHit> {
            None
        }

        fn overlap_sphere(&self, centre: &Vector3<f64>, radius_m: f64) -> Vec<Collider> {
            self.0
                .borrow()
                .iter()
                .filter(|c| (c.position_m - centre).norm() <= radius_m)
                .cloned()
                .collect()
        }
    }

    const DT: f64 = 0.1;

    fn params() -> MissionParams {
        MissionParams {
            detect_tag: String::from("Detectable"),
            detect_radius_m: 5.0,
            detect_period_s: 0.2,
            sweep_start_delay_s: 0.25,
            arrival_settle_s: 0.25,
        }
    }

    fn setup() -> (MissionCoord, Rc<Objects>) {
        let objects = Rc::new(Objects::default());
        let optimiser = RouteOptimizer::new(RouteOptParams::default(), Rc::new(NoPaths));
        (MissionCoord::new(params(), optimiser, objects.clone()), objects)
    }

    fn at(x: f64, z: f64) -> Pose {
        Pose::new(Vector3::new(x, 0.0, z), 0.0)
    }

    fn tick(mc: &mut MissionCoord, pose: &Pose, reached: bool) -> MissionOutput {
        mc.proc(&MissionInput {
            pose: *pose,
            target_reached: reached,
            dt_s: DT,
        })
        .unwrap()
        .0
    }

    /// Tick without arrivals until the state changes, returning the number of ticks taken.
    fn ticks_until_change(mc: &mut MissionCoord, pose: &Pose) -> usize {
        let initial = mc.get_state();
        for i in 1..=100 {
            if tick(mc, pose, false).state != initial {
                return i;
            }
        }
        panic!("State never left {}", initial);
    }

    #[test]
    fn test_plain_route_with_return() {
        let (mut mc, _) = setup();
        let start = at(0.0, 0.0);

        let route = mc.start_mission(
            vec![
                Target::new(10, Vector3::new(0.0, 0.0, 20.0)),
                Target::new(11, Vector3::new(0.0, 0.0, 10.0)),
            ],
            true,
            &start,
        );
        assert!(route.return_to_start);
        assert!((route.length_m - 40.0).abs() < 1e-9);
        assert_eq!(mc.get_state(), MissionState::NavigatingToTarget);

        // Both directions round the loop are equally short, follow whichever was chosen
        let first_m = mc.get_targets()[route.order[0]].position_m;
        let second_m = mc.get_targets()[route.order[1]].position_m;
        assert_eq!(mc.get_active_target(), Some(first_m));

        // Driving
        let out = tick(&mut mc, &start, false);
        assert_eq!(out.active_target_m, Some(first_m));

        // Reached the first target, the rover waits to settle
        let first = at(first_m[0], first_m[2]);
        let out = tick(&mut mc, &first, true);
        assert_eq!(out.state, MissionState::NavigatingToTarget);
        assert!(out.active_target_m.is_none());

        // Settle of 0.25 s completes on the third tick
        assert_eq!(ticks_until_change(&mut mc, &first), 3);
        assert_eq!(mc.get_state(), MissionState::TargetHandled);
        assert_eq!(mc.num_handled(), 1);

        // Next tick moves on to the second target
        let out = tick(&mut mc, &first, false);
        assert_eq!(out.state, MissionState::NavigatingToTarget);
        assert_eq!(out.active_target_m, Some(second_m));

        let second = at(second_m[0], second_m[2]);
        tick(&mut mc, &second, true);
        ticks_until_change(&mut mc, &second);
        assert_eq!(mc.get_state(), MissionState::TargetHandled);

        // Then back to the start
        let out = tick(&mut mc, &second, false);
        assert_eq!(out.state, MissionState::NavigatingToTarget);
        assert_eq!(out.active_target_m, Some(Vector3::zeros()));

        let out = tick(&mut mc, &start, true);
        assert_eq!(out.state, MissionState::RouteComplete);
        assert!(out.active_target_m.is_none());

        // Terminal
        for _ in 0..5 {
            let out = tick(&mut mc, &start, true);
            assert_eq!(out.state, MissionState::RouteComplete);
            assert!(out.active_target_m.is_none());
        }
        assert_eq!(mc.num_handled(), 2);
    }

    #[test]
    fn test_area_search_without_detection() {
        let (mut mc, _) = setup();
        let grid = AreaGrid::new(vec![
            Vector3::new(1.0, 0.0, 10.0),
            Vector3::new(-1.0, 0.0, 10.0),
        ]);

        mc.start_mission(
            vec![Target::new(0, Vector3::new(0.0, 0.0, 10.0)).with_area_grid(grid.clone())],
            false,
            &at(0.0, 0.0),
        );

        let pose = at(0.0, 10.0);
        let out = tick(&mut mc, &pose, true);
        assert_eq!(out.state, MissionState::SearchingArea);
        assert!(out.active_target_m.is_none());

        // Sweep starts after the delay
        let mut first = None;
        for _ in 0..3 {
            first = tick(&mut mc, &pose, false).active_target_m;
        }
        assert_eq!(first, Some(grid.points_m[0]));

        let out = tick(&mut mc, &pose, true);
        assert_eq!(out.active_target_m, Some(grid.points_m[1]));

        // Exhausting the sweep handles the target, with no settle
        let out = tick(&mut mc, &pose, true);
        assert_eq!(out.state, MissionState::TargetHandled);

        let out = tick(&mut mc, &pose, false);
        assert_eq!(out.state, MissionState::RouteComplete);
    }

    #[test]
    fn test_repeated_sweep_point_is_new_waypoint() {
        let (mut mc, _) = setup();
        let p = Vector3::new(3.0, 0.0, 10.0);
        let grid = AreaGrid::new(vec![p, p, Vector3::new(6.0, 0.0, 10.0)]);

        mc.start_mission(
            vec![Target::new(0, Vector3::new(0.0, 0.0, 10.0)).with_area_grid(grid)],
            false,
            &at(0.0, 0.0),
        );

        tick(&mut mc, &at(0.0, 10.0), true);
        let mut out = tick(&mut mc, &at(0.0, 10.0), false);
        while out.active_target_m.is_none() {
            out = tick(&mut mc, &at(0.0, 10.0), false);
        }
        assert_eq!(out.active_target_m, Some(p));

        // Reaching the first point issues the same position again, as a new waypoint
        let first_seq = out.waypoint_seq;
        let out = tick(&mut mc, &at(3.0, 10.0), true);
        assert_eq!(out.active_target_m, Some(p));
        assert_eq!(out.state, MissionState::SearchingArea);
        assert_ne!(out.waypoint_seq, first_seq);

        let out = tick(&mut mc, &at(3.0, 10.0), true);
        assert_eq!(out.active_target_m, Some(Vector3::new(6.0, 0.0, 10.0)));
    }

    #[test]
    fn test_detection_and_tracking() {
        let (mut mc, objects) = setup();
        let grid = AreaGrid::lawnmower(&Vector3::new(0.0, 0.0, 10.0), 10.0, 5.0);

        objects.0.borrow_mut().push(Collider {
            id: 7,
            tag: String::from("Detectable"),
            position_m: Vector3::new(3.0, 0.0, 12.0),
        });
        objects.0.borrow_mut().push(Collider {
            id: 8,
            tag: String::from("Obstacle"),
            position_m: Vector3::new(1.0, 0.0, 10.0),
        });

        mc.start_mission(
            vec![
                Target::new(0, Vector3::new(0.0, 0.0, 10.0)).with_area_grid(grid),
                Target::new(1, Vector3::new(0.0, 0.0, 30.0)),
            ],
            false,
            &at(0.0, 0.0),
        );

        // Reaching the gridded target scans straight away and finds the object
        let pose = at(0.0, 10.0);
        let out = tick(&mut mc, &pose, true);
        assert_eq!(out.state, MissionState::MovingToDetectedObject);
        assert_eq!(out.active_target_m, Some(Vector3::new(3.0, 0.0, 12.0)));

        // The sweep start was abandoned
        let (out, report) = mc
            .proc(&MissionInput {
                pose,
                target_reached: false,
                dt_s: DT,
            })
            .unwrap();
        assert_eq!(out.state, MissionState::MovingToDetectedObject);
        assert!(!report.timer_pending);
        assert_eq!(report.tracked_id, Some(7));

        // The object moves and is tracked on the next scan
        objects.0.borrow_mut()[0].position_m = Vector3::new(2.0, 0.0, 13.0);
        let out = tick(&mut mc, &pose, false);
        assert_eq!(out.active_target_m, Some(Vector3::new(2.0, 0.0, 13.0)));

        // Reaching it settles, then the target is handled
        let near = at(2.0, 13.0);
        let out = tick(&mut mc, &near, true);
        assert!(out.active_target_m.is_none());
        assert_eq!(ticks_until_change(&mut mc, &near), 3);
        assert_eq!(mc.get_state(), MissionState::TargetHandled);

        let out = tick(&mut mc, &near, false);
        assert_eq!(out.state, MissionState::NavigatingToTarget);
        assert_eq!(out.active_target_m, Some(Vector3::new(0.0, 0.0, 30.0)));
    }

    #[test]
    fn test_handled_objects_not_redetected() {
        let (mut mc, objects) = setup();
        objects.0.borrow_mut().push(Collider {
            id: 1,
            tag: String::from("Detectable"),
            position_m: Vector3::new(0.0, 0.0, 11.0),
        });

        let grid = AreaGrid::new(vec![Vector3::new(0.0, 0.0, 12.0)]);
        mc.start_mission(
            vec![
                Target::new(0, Vector3::new(0.0, 0.0, 10.0)).with_area_grid(grid.clone()),
                Target::new(1, Vector3::new(0.0, 0.0, 12.0)).with_area_grid(grid),
            ],
            false,
            &at(0.0, 0.0),
        );

        let pose = at(0.0, 10.0);
        tick(&mut mc, &pose, true);
        assert_eq!(mc.get_state(), MissionState::MovingToDetectedObject);
        tick(&mut mc, &at(0.0, 11.0), true);
        ticks_until_change(&mut mc, &pose);
        tick(&mut mc, &pose, false);
        assert_eq!(mc.get_state(), MissionState::NavigatingToTarget);

        // The second target searches the same area, but the object has been handled
        let pose = at(0.0, 12.0);
        tick(&mut mc, &pose, true);
        assert_eq!(mc.get_state(), MissionState::SearchingArea);
        for _ in 0..10 {
            let out = tick(&mut mc, &pose, false);
            assert_eq!(out.state, MissionState::SearchingArea);
        }
    }

    #[test]
    fn test_stop_abandons_timers() {
        let (mut mc, _) = setup();
        mc.start_mission(
            vec![Target::new(0, Vector3::new(0.0, 0.0, 10.0))],
            false,
            &at(0.0, 0.0),
        );

        let pose = at(0.0, 10.0);
        tick(&mut mc, &pose, true);

        mc.stop();
        assert_eq!(mc.get_state(), MissionState::Idle);
        assert!(mc.get_active_target().is_none());

        for _ in 0..10 {
            let out = tick(&mut mc, &pose, false);
            assert_eq!(out.state, MissionState::Idle);
            assert!(out.active_target_m.is_none());
        }
        assert_eq!(mc.num_handled(), 0);
    }

    #[test]
    fn test_reoptimise() {
        let (mut mc, _) = setup();

        assert!(mc.reoptimise(&at(0.0, 0.0)).is_err());

        mc.start_mission(
            vec![
                Target::new(0, Vector3::new(0.0, 0.0, 10.0)),
                Target::new(1, Vector3::new(0.0, 0.0, -10.0)),
                Target::new(2, Vector3::new(0.0, 0.0, 20.0)),
            ],
            false,
            &at(0.0, 8.0),
        );
        // The northern targets are visited first
        assert_ne!(mc.get_route().map(|r| r.order[0]), Some(1));

        // The rover has drifted far behind the start, the southern target is now first
        let route = mc.reoptimise(&at(0.0, -9.0)).unwrap();
        assert_eq!(route.order, vec![1, 0, 2]);
        assert_eq!(mc.get_active_target(), Some(Vector3::new(0.0, 0.0, -10.0)));

        // Not allowed while settling at a target
        tick(&mut mc, &at(0.0, -10.0), true);
        assert!(matches!(
            mc.reoptimise(&at(0.0, -10.0)),
            Err(MissionError::CannotReoptimise(MissionState::NavigatingToTarget))
        ));
    }

    #[test]
    fn test_empty_mission() {
        let (mut mc, _) = setup();
        let route = mc.start_mission(Vec::new(), true, &at(0.0, 0.0));

        assert!(route.is_empty());
        assert_eq!(mc.get_state(), MissionState::RouteComplete);
        assert!(tick(&mut mc, &at(0.0, 0.0), false).active_target_m.is_none());
    }
}
