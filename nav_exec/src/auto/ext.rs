//! # External collaborators
//!
//! The navigation core does not own the world. Walkable paths and physics queries are supplied by
//! the host through the traits in this module, and are injected into the [`NavMgr`] when it is
//! built.
//!
//! [`NavMgr`]: crate::auto::nav_mgr::NavMgr

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector3;
use serde::Serialize;

use super::path::Path;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The result of a ray which hit something.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RayHit {
    /// World point at which the ray hit
    pub point_m: Vector3<f64>,

    /// Unit surface normal at the hit point
    pub normal: Vector3<f64>,

    /// Tag of the collider which was hit
    pub tag: String,

    /// Distance from the ray origin to the hit point
    pub distance_m: f64,
}

/// A collider found by a volume query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Collider {
    pub id: u64,
    pub tag: String,
    pub position_m: Vector3<f64>,
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Provides walkable paths between two points.
///
/// Implementations must be deterministic: the same pair of points always gives the same result.
pub trait PathProvider {
    /// Get a path from `from` to `to`, or `None` if no path exists.
    fn path(&self, from: &Vector3<f64>, to: &Vector3<f64>) -> Option<Path>;
}

/// Provides ray and volume queries against the world's colliders.
pub trait RayQuery {
    /// Cast a ray from `origin` along `dir` (unit length), returning the nearest hit within
    /// `max_dist_m`.
    fn raycast(&self, origin: &Vector3<f64>, dir: &Vector3<f64>, max_dist_m: f64)
        -> Option<RayHit>;

    /// Get all colliders overlapping a sphere.
    fn overlap_sphere(&self, centre: &Vector3<f64>, radius_m: f64) -> Vec<Collider>;
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the distance between two points using the provider's path length, falling back to the
/// straight line distance if no path exists.
pub fn path_distance(provider: &dyn PathProvider, from: &Vector3<f64>, to: &Vector3<f64>) -> f64 {
    match provider.path(from, to) {
        Some(p) if p.get_num_points() >= 2 => p.get_length(),
        _ => (to - from).norm(),
    }
}
