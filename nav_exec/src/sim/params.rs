//! # Simulation parameters
//!
//! Describes the simulated world and the mission the executable runs in it.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector3;
use serde::Deserialize;

use super::{RoverParams, SimWorld};
use crate::auto::{
    loc::{Landmark, Pose},
    mission::{AreaGrid, Target},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SimParams {
    pub rover: RoverParams,

    pub start_position_m: [f64; 3],

    pub start_heading_rad: f64,

    /// Positions of the localisation beacons, ids are assigned in order
    pub landmarks_m: Vec<[f64; 3]>,

    /// Spheres the rover must avoid
    #[serde(default)]
    pub obstacles: Vec<SphereParams>,

    /// Spheres the mission's detector can find
    #[serde(default)]
    pub objects: Vec<SphereParams>,

    pub targets: Vec<TargetParams>,

    pub return_to_start: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SphereParams {
    pub centre_m: [f64; 3],
    pub radius_m: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TargetParams {
    pub position_m: [f64; 3],

    /// Side of the square searched once the target is reached, no search if not set
    #[serde(default)]
    pub search_size_m: Option<f64>,

    /// Distance between the rows of the search sweep
    #[serde(default)]
    pub search_spacing_m: Option<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimParams {
    pub fn start_pose(&self) -> Pose {
        Pose::new(Vector3::from(self.start_position_m), self.start_heading_rad)
    }

    pub fn landmarks(&self) -> Vec<Landmark> {
        self.landmarks_m
            .iter()
            .enumerate()
            .map(|(id, p)| Landmark {
                id,
                position_m: Vector3::from(*p),
            })
            .collect()
    }

    /// Mission targets, expanding any search areas into sweep grids.
    pub fn targets(&self) -> Vec<Target> {
        self.targets
            .iter()
            .enumerate()
            .map(|(id, t)| {
                let target = Target::new(id, Vector3::from(t.position_m));

                match t.search_size_m {
                    Some(size_m) => {
                        let spacing_m = t.search_spacing_m.unwrap_or(size_m);
                        let grid = AreaGrid::lawnmower(&target.position_m, size_m, spacing_m);
                        target.with_area_grid(grid)
                    }
                    None => target,
                }
            })
            .collect()
    }

    /// Build the world, tagging the obstacles and detectable objects.
    pub fn build_world(&self, obstacle_tag: &str, object_tag: &str) -> SimWorld {
        let mut world = SimWorld::new();

        for o in self.obstacles.iter() {
            world.add_sphere(obstacle_tag, Vector3::from(o.centre_m), o.radius_m);
        }

        for o in self.objects.iter() {
            world.add_sphere(object_tag, Vector3::from(o.centre_m), o.radius_m);
        }

        world
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
