//! # Area search
//!
//! Sweep grids searched around a reached target, and the detector scan which looks for objects
//! while searching.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector3;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::auto::ext::{Collider, RayQuery};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An ordered list of sweep points searched once a target is reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AreaGrid {
    pub points_m: Vec<Vector3<f64>>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl AreaGrid {
    pub fn new(points_m: Vec<Vector3<f64>>) -> Self {
        Self { points_m }
    }

    /// Build a back and forth sweep over a square of side `size_m` centred on `centre_m`.
    ///
    /// Rows run along X and are `spacing_m` apart in Z, alternating direction so consecutive
    /// sweep points are joined by short legs. Each row contributes its two end points.
    pub fn lawnmower(centre_m: &Vector3<f64>, size_m: f64, spacing_m: f64) -> Self {
        if size_m <= 0.0 || spacing_m <= 0.0 {
            return Self::new(vec![*centre_m]);
        }

        let half = 0.5 * size_m;
        let num_rows = (size_m / spacing_m).floor() as usize + 1;

        let mut points_m = Vec::with_capacity(2 * num_rows);
        for row in 0..num_rows {
            let z = centre_m[2] - half + spacing_m * row as f64;
            let (x0, x1) = if row % 2 == 0 {
                (centre_m[0] - half, centre_m[0] + half)
            } else {
                (centre_m[0] + half, centre_m[0] - half)
            };

            points_m.push(Vector3::new(x0, centre_m[1], z));
            points_m.push(Vector3::new(x1, centre_m[1], z));
        }

        Self { points_m }
    }

    pub fn len(&self) -> usize {
        self.points_m.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points_m.is_empty()
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// All colliders with the given tag within `radius_m` of `centre_m`.
fn scan(
    query: &dyn RayQuery,
    centre_m: &Vector3<f64>,
    radius_m: f64,
    tag: &str,
) -> impl Iterator<Item = Collider> {
    let tag = tag.to_string();
    query
        .overlap_sphere(centre_m, radius_m)
        .into_iter()
        .filter(move |c| c.tag == tag)
}

/// Find the nearest collider with the given tag that has not already been handled.
pub fn detect_nearest(
    query: &dyn RayQuery,
    centre_m: &Vector3<f64>,
    radius_m: f64,
    tag: &str,
    handled_ids: &HashSet<u64>,
) -> Option<Collider> {
    scan(query, centre_m, radius_m, tag)
        .filter(|c| !handled_ids.contains(&c.id))
        .min_by_key(|c| OrderedFloat((c.position_m - centre_m).norm()))
}

/// Find a particular collider if it is still within range.
pub fn find_by_id(
    query: &dyn RayQuery,
    centre_m: &Vector3<f64>,
    radius_m: f64,
    tag: &str,
    id: u64,
) -> Option<Collider> {
    scan(query, centre_m, radius_m, tag).find(|c| c.id == id)
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
