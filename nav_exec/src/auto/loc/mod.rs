//! # Localisation module
//!
//! This module provides the rover with an estimate of where it is in the world, using range
//! measurements to a set of fixed landmarks (beacons).
//!
//! Every tick the ranges to all landmarks are re-measured with bounded uniform noise, then:
//!
//! 1. A closed form trilateration is performed using the first three landmarks.
//! 2. If more than three landmarks are available the closed form estimate is refined with
//!    Gauss-Newton least squares over all of them.
//!
//! The estimate is recomputed from scratch each tick, there is no filtering between ticks.
//! Heading is not observable from ranges so it is passed through from the raw pose.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
pub mod trilat;

pub use params::LocParams;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, error, warn};
use nalgebra::Vector3;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use util::module::State;

use self::trilat::GaussNewtonParams;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Minimum number of landmarks required to localise.
pub const MIN_NUM_LANDMARKS: usize = 3;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The pose (position and heading) of the rover in the world frame.
///
/// The world frame is Y-up with the ground in the XZ plane. Heading is the yaw about +Y, with 0
/// facing +Z and positive heading turning towards +X (clockwise seen from above).
#[derive(Debug, Copy, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Pose {
    /// The position in the world frame
    pub position_m: Vector3<f64>,

    /// The heading of the rover
    pub heading_rad: f64,
}

/// A fixed beacon the rover can measure its range to.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq)]
pub struct Landmark {
    pub id: usize,
    pub position_m: Vector3<f64>,
}

/// A single (noisy) range measurement to a landmark.
#[derive(Debug, Copy, Clone, Serialize, PartialEq)]
pub struct RangeMeasurement {
    pub landmark_id: usize,
    pub range_m: f64,
}

/// Localisation manager, provides the estimated pose of the rover.
pub struct Localizer {
    params: LocParams,

    landmarks: Vec<Landmark>,

    /// If false the localizer had a configuration error and only reports the initial pose.
    enabled: bool,

    /// Latest estimated pose
    pose: Pose,

    rng: StdRng,
}

/// Status report of one localisation tick.
#[derive(Debug, Copy, Clone, Default, Serialize)]
pub struct LocReport {
    /// False if the localizer is disabled or the estimate could not be computed this tick.
    pub estimate_valid: bool,

    /// Number of Gauss-Newton iterations performed (0 if no refinement was done)
    pub gn_iterations: usize,

    /// True if the refinement met the convergence tolerance before the iteration cap
    pub gn_converged: bool,

    /// RMS of the difference between measured and estimated ranges
    pub rms_residual_m: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum LocError {
    #[error("At least {} landmarks are required for localisation, found {0}", MIN_NUM_LANDMARKS)]
    NotEnoughLandmarks(usize),

    #[error("Range measured to landmark {0} which is not configured")]
    UnknownLandmark(usize),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pose {
    pub fn new(position_m: Vector3<f64>, heading_rad: f64) -> Self {
        Self {
            position_m,
            heading_rad,
        }
    }

    /// Unit vector pointing forwards out of the rover, in the world frame.
    pub fn forward(&self) -> Vector3<f64> {
        Vector3::new(self.heading_rad.sin(), 0.0, self.heading_rad.cos())
    }

    /// Unit vector pointing out of the rover's right hand side, in the world frame.
    pub fn right(&self) -> Vector3<f64> {
        Vector3::new(self.heading_rad.cos(), 0.0, -self.heading_rad.sin())
    }

    /// Express a world point in the rover's local frame as (lateral, vertical, longitudinal).
    ///
    /// Positive lateral is to the right of the rover, positive longitudinal is in front of it.
    pub fn to_local(&self, point_m: &Vector3<f64>) -> Vector3<f64> {
        let diff = point_m - self.position_m;
        Vector3::new(diff.dot(&self.right()), diff[1], diff.dot(&self.forward()))
    }

    /// Rotate a direction given in the rover's local frame into the world frame.
    pub fn local_dir_to_world(&self, dir: &Vector3<f64>) -> Vector3<f64> {
        self.right() * dir[0] + Vector3::y() * dir[1] + self.forward() * dir[2]
    }

    /// Transform a point given in the rover's local frame into the world frame.
    pub fn local_point_to_world(&self, point: &Vector3<f64>) -> Vector3<f64> {
        self.position_m + self.local_dir_to_world(point)
    }

    /// Distance to a point measured in the ground (XZ) plane.
    pub fn ground_dist_to(&self, point_m: &Vector3<f64>) -> f64 {
        let diff = point_m - self.position_m;
        (diff[0].powi(2) + diff[2].powi(2)).sqrt()
    }
}

impl Localizer {
    /// Create a new localizer.
    ///
    /// Fewer than three landmarks is a configuration error, in which case the host should fall
    /// back to [`Localizer::disabled`].
    pub fn new(params: LocParams, landmarks: Vec<Landmark>) -> Result<Self, LocError> {
        if landmarks.len() < MIN_NUM_LANDMARKS {
            return Err(LocError::NotEnoughLandmarks(landmarks.len()));
        }

        let rng = make_rng(params.noise_seed);

        Ok(Self {
            params,
            landmarks,
            enabled: true,
            pose: Pose::default(),
            rng,
        })
    }

    /// Create an inert localizer which will only ever report the initial pose.
    pub fn disabled(params: LocParams) -> Self {
        let rng = make_rng(params.noise_seed);

        Self {
            params,
            landmarks: Vec::new(),
            enabled: false,
            pose: Pose::default(),
            rng,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Set the pose reported before the first estimate (and forever if disabled).
    pub fn set_initial_pose(&mut self, pose: Pose) {
        self.pose = pose;
    }

    /// Get the latest estimated pose.
    pub fn get_pose(&self) -> Pose {
        self.pose
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }

    /// Measure the range from the given (true) position to every landmark, adding independent
    /// uniform noise in `[-range_noise_m, range_noise_m]` to each.
    pub fn measure(&mut self, true_position_m: &Vector3<f64>) -> Vec<RangeMeasurement> {
        let noise_m = self.params.range_noise_m.abs();
        let rng = &mut self.rng;

        self.landmarks
            .iter()
            .map(|l| {
                let noise = if noise_m > 0.0 {
                    rng.gen_range(-noise_m..=noise_m)
                } else {
                    0.0
                };

                RangeMeasurement {
                    landmark_id: l.id,
                    range_m: (l.position_m - true_position_m).norm() + noise,
                }
            })
            .collect()
    }

    /// Estimate the position from a set of range measurements.
    ///
    /// Returns `Ok(None)` if the geometry of the first three landmarks is degenerate (collinear).
    pub fn estimate(
        &self,
        measurements: &[RangeMeasurement],
    ) -> Result<Option<(Vector3<f64>, LocReport)>, LocError> {
        if measurements.len() < MIN_NUM_LANDMARKS {
            return Err(LocError::NotEnoughLandmarks(measurements.len()));
        }

        // Pair each measurement with its landmark
        let mut positions = Vec::with_capacity(measurements.len());
        let mut ranges = Vec::with_capacity(measurements.len());
        for m in measurements {
            let landmark = self
                .landmarks
                .iter()
                .find(|l| l.id == m.landmark_id)
                .ok_or(LocError::UnknownLandmark(m.landmark_id))?;
            positions.push(landmark.position_m);
            ranges.push(m.range_m);
        }

        let closed_form = match trilat::trilaterate(
            [&positions[0], &positions[1], &positions[2]],
            [ranges[0], ranges[1], ranges[2]],
        ) {
            Some(p) => p,
            None => return Ok(None),
        };

        let mut report = LocReport {
            estimate_valid: true,
            ..Default::default()
        };

        let estimate = if positions.len() > MIN_NUM_LANDMARKS {
            let gn = trilat::refine_gauss_newton(
                &positions,
                &ranges,
                closed_form,
                &GaussNewtonParams {
                    max_iterations: self.params.gn_max_iterations,
                    tolerance_m: self.params.gn_tolerance_m,
                    singular_threshold: self.params.gn_singular_threshold,
                },
            );
            report.gn_iterations = gn.iterations;
            report.gn_converged = gn.converged;
            gn.position_m
        } else {
            closed_form
        };

        report.rms_residual_m = trilat::rms_residual(&positions, &ranges, &estimate);

        Ok(Some((estimate, report)))
    }
}

impl State for Localizer {
    type InputData = Pose;
    type OutputData = Pose;
    type StatusReport = LocReport;
    type ProcError = LocError;

    /// Produce a new estimate of the pose from the raw (true) pose of the rover.
    fn proc(&mut self, raw_pose: &Pose) -> Result<(Pose, LocReport), LocError> {
        // Heading is always passed straight through
        self.pose.heading_rad = raw_pose.heading_rad;

        if !self.enabled {
            return Ok((self.pose, LocReport::default()));
        }

        let measurements = self.measure(&raw_pose.position_m);

        match self.estimate(&measurements)? {
            Some((position_m, report)) => {
                debug!(
                    "Position estimate {:?} (rms residual {:.4} m, {} GN iterations)",
                    position_m.as_slice(),
                    report.rms_residual_m,
                    report.gn_iterations
                );
                self.pose.position_m = position_m;
                Ok((self.pose, report))
            }
            None => {
                warn!("Degenerate landmark geometry, keeping the previous position estimate");
                Ok((self.pose, LocReport::default()))
            }
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Build a localizer, logging and falling back to a disabled one on configuration error.
pub fn init_or_disable(params: LocParams, landmarks: Vec<Landmark>) -> (Localizer, Option<LocError>) {
    match Localizer::new(params.clone(), landmarks) {
        Ok(l) => (l, None),
        Err(e) => {
            error!("Localizer disabled: {}", e);
            (Localizer::disabled(params), Some(e))
        }
    }
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn landmarks(points: &[[f64; 3]]) -> Vec<Landmark> {
        points
            .iter()
            .enumerate()
            .map(|(id, p)| Landmark {
                id,
                position_m: Vector3::new(p[0], p[1], p[2]),
            })
            .collect()
    }

    fn noiseless() -> LocParams {
        LocParams {
            range_noise_m: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_pose_frames() {
        let pose = Pose::new(Vector3::new(1.0, 0.0, 1.0), std::f64::consts::FRAC_PI_2);

        // Facing +X, so +X is forward and -Z is to the right
        let local = pose.to_local(&Vector3::new(3.0, 0.5, 1.0));
        assert!((local - Vector3::new(0.0, 0.5, 2.0)).norm() < 1e-12);

        let local = pose.to_local(&Vector3::new(1.0, 0.0, -2.0));
        assert!((local - Vector3::new(3.0, 0.0, 0.0)).norm() < 1e-12);

        let world = pose.local_point_to_world(&Vector3::new(3.0, 0.0, 0.0));
        assert!((world - Vector3::new(1.0, 0.0, -2.0)).norm() < 1e-12);

        assert!((pose.ground_dist_to(&Vector3::new(4.0, 10.0, 5.0)) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_too_few_landmarks() {
        assert!(matches!(
            Localizer::new(noiseless(), landmarks(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]])),
            Err(LocError::NotEnoughLandmarks(2))
        ));

        let (mut loc, err) = init_or_disable(noiseless(), Vec::new());
        assert!(err.is_some());
        assert!(!loc.is_enabled());

        // The disabled localizer keeps reporting the initial position
        let initial = Pose::new(Vector3::new(2.0, 0.0, -1.0), 0.0);
        loc.set_initial_pose(initial);
        let (pose, report) = loc
            .proc(&Pose::new(Vector3::new(50.0, 0.0, 50.0), 0.3))
            .unwrap();
        assert_eq!(pose.position_m, initial.position_m);
        assert_eq!(pose.heading_rad, 0.3);
        assert!(!report.estimate_valid);
    }

    #[test]
    fn test_three_landmarks_at_origin() {
        let mut loc = Localizer::new(
            noiseless(),
            landmarks(&[[10.0, 0.0, 0.0], [-10.0, 0.0, 0.0], [0.0, 0.0, 10.0]]),
        )
        .unwrap();

        let (pose, report) = loc.proc(&Pose::default()).unwrap();

        assert!(pose.position_m.norm() < 1e-3);
        assert!(report.estimate_valid);
        assert_eq!(report.gn_iterations, 0);
    }

    #[test]
    fn test_refinement_with_noise() {
        let truth = Vector3::new(3.0, 0.4, 7.0);
        let params = LocParams {
            range_noise_m: 0.05,
            noise_seed: Some(42),
            ..Default::default()
        };
        let mut loc = Localizer::new(
            params,
            landmarks(&[
                [0.0, 0.0, 0.0],
                [20.0, 0.0, 0.0],
                [0.0, 0.0, 20.0],
                [20.0, 6.0, 20.0],
                [10.0, 8.0, -5.0],
            ]),
        )
        .unwrap();

        for _ in 0..20 {
            let (pose, report) = loc.proc(&Pose::new(truth, 0.0)).unwrap();
            assert!(report.estimate_valid);
            assert!(report.gn_iterations > 0);
            // Noise is bounded at 5 cm per range, the least squares fit over five well spread
            // landmarks stays well within half a metre.
            assert!((pose.position_m - truth).norm() < 0.5);
            assert!(report.rms_residual_m < 0.1);
        }
    }

    #[test]
    fn test_noise_is_bounded() {
        let params = LocParams {
            range_noise_m: 0.2,
            noise_seed: Some(7),
            ..Default::default()
        };
        let lms = landmarks(&[[5.0, 0.0, 0.0], [0.0, 0.0, 5.0], [-5.0, 0.0, 0.0]]);
        let mut loc = Localizer::new(params, lms.clone()).unwrap();

        for _ in 0..100 {
            for m in loc.measure(&Vector3::zeros()) {
                let true_range = lms[m.landmark_id].position_m.norm();
                assert!((m.range_m - true_range).abs() <= 0.2 + 1e-9);
            }
        }
    }

    #[test]
    fn test_collinear_keeps_previous() {
        let mut loc = Localizer::new(
            noiseless(),
            landmarks(&[[0.0, 0.0, 0.0], [5.0, 0.0, 0.0], [10.0, 0.0, 0.0]]),
        )
        .unwrap();
        let initial = Pose::new(Vector3::new(1.0, 0.0, 1.0), 0.0);
        loc.set_initial_pose(initial);

        let (pose, report) = loc
            .proc(&Pose::new(Vector3::new(3.0, 0.0, 3.0), 0.0))
            .unwrap();
        assert_eq!(pose.position_m, initial.position_m);
        assert!(!report.estimate_valid);
    }
}
