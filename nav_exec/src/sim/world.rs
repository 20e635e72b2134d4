//! # Simulated world
//!
//! A flat world populated with tagged spheres, answering ray and volume queries, plus a path
//! provider which always returns the straight line between two points.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector3;
use ordered_float::OrderedFloat;

use crate::auto::{
    ext::{Collider, PathProvider, RayHit, RayQuery},
    path::Path,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Sphere {
    pub id: u64,
    pub tag: String,
    pub centre_m: Vector3<f64>,
    pub radius_m: f64,
}

/// World made of spheres resting on (or sunk into) the ground plane.
#[derive(Debug, Clone, Default)]
pub struct SimWorld {
    spheres: Vec<Sphere>,
}

/// Path provider for an open world, every path is the straight line between its ends.
#[derive(Debug, Clone, Copy, Default)]
pub struct StraightLinePaths;

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Sphere {
    /// Distance along a ray to the first intersection with this sphere, if within `max_dist_m`.
    ///
    /// `dir` must be unit length. A ray starting inside the sphere hits at distance 0.
    fn intersect(&self, origin: &Vector3<f64>, dir: &Vector3<f64>, max_dist_m: f64) -> Option<f64> {
        let oc = origin - self.centre_m;
        let b = oc.dot(dir);
        let c = oc.norm_squared() - self.radius_m.powi(2);

        if c <= 0.0 {
            return Some(0.0);
        }

        let disc = b * b - c;
        if disc < 0.0 {
            return None;
        }

        let t = -b - disc.sqrt();
        if t >= 0.0 && t <= max_dist_m {
            Some(t)
        } else {
            None
        }
    }
}

impl SimWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sphere to the world, returning its id.
    pub fn add_sphere(&mut self, tag: &str, centre_m: Vector3<f64>, radius_m: f64) -> u64 {
        let id = self.spheres.len() as u64;
        self.spheres.push(Sphere {
            id,
            tag: tag.to_string(),
            centre_m,
            radius_m,
        });
        id
    }

    pub fn spheres(&self) -> &[Sphere] {
        &self.spheres
    }

    /// True if a disc of the given radius at `point_m` overlaps a sphere with the given tag, in
    /// the ground plane.
    pub fn is_blocked(&self, point_m: &Vector3<f64>, clearance_m: f64, tag: &str) -> bool {
        self.spheres.iter().filter(|s| s.tag == tag).any(|s| {
            let dx = point_m[0] - s.centre_m[0];
            let dz = point_m[2] - s.centre_m[2];
            (dx * dx + dz * dz).sqrt() < s.radius_m + clearance_m
        })
    }
}

impl RayQuery for SimWorld {
    fn raycast(
        &self,
        origin: &Vector3<f64>,
        dir: &Vector3<f64>,
        max_dist_m: f64,
    ) -> Option<RayHit> {
        let (sphere, distance_m) = self
            .spheres
            .iter()
            .filter_map(|s| s.intersect(origin, dir, max_dist_m).map(|t| (s, t)))
            .min_by_key(|(_, t)| OrderedFloat(*t))?;

        let point_m = origin + dir * distance_m;
        let normal = (point_m - sphere.centre_m)
            .try_normalize(std::f64::EPSILON)
            .unwrap_or(-dir);

        Some(RayHit {
            point_m,
            normal,
            tag: sphere.tag.clone(),
            distance_m,
        })
    }

    fn overlap_sphere(&self, centre: &Vector3<f64>, radius_m: f64) -> Vec<Collider> {
        self.spheres
            .iter()
            .filter(|s| (s.centre_m - centre).norm() <= radius_m + s.radius_m)
            .map(|s| Collider {
                id: s.id,
                tag: s.tag.clone(),
                position_m: s.centre_m,
            })
            .collect()
    }
}

impl PathProvider for StraightLinePaths {
    fn path(&self, from: &Vector3<f64>, to: &Vector3<f64>) -> Option<Path> {
        Some(Path::direct(*from, *to))
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
