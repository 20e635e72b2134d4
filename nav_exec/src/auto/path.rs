//! # Path
//!
//! This module defines the polyline path used by the autonomy system.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A path defining the desired trajectory of the rover, as a sequence of world points joined by
/// straight segments.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct Path {
    pub points_m: Vec<Vector3<f64>>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Path {
    /// Create a new path from a list of points
    pub fn new(points_m: Vec<Vector3<f64>>) -> Self {
        Self { points_m }
    }

    /// Create a new empty path
    pub fn new_empty() -> Self {
        Self::default()
    }

    /// Produces a direct (straight line) path between the two points.
    pub fn direct(from: Vector3<f64>, to: Vector3<f64>) -> Self {
        Self {
            points_m: vec![from, to],
        }
    }

    /// Get the number of points in the path
    pub fn get_num_points(&self) -> usize {
        self.points_m.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points_m.is_empty()
    }

    /// Get the final point of the path, if there is one.
    pub fn last_point(&self) -> Option<&Vector3<f64>> {
        self.points_m.last()
    }

    /// Get the total length of the path.
    pub fn get_length(&self) -> f64 {
        self.points_m
            .windows(2)
            .map(|w| (w[1] - w[0]).norm())
            .sum()
    }

    /// Get the point a given distance along the path.
    ///
    /// Segment lengths are accumulated from the start until the running total reaches
    /// `distance_m`, and the point is interpolated on the segment where that happens. If the path
    /// is shorter than `distance_m` its final point is returned.
    ///
    /// Returns `None` for an empty path.
    pub fn look_ahead_point(&self, distance_m: f64) -> Option<Vector3<f64>> {
        let first = self.points_m.first()?;

        if distance_m <= 0.0 {
            return Some(*first);
        }

        let mut travelled_m = 0.0;

        for w in self.points_m.windows(2) {
            let seg = w[1] - w[0];
            let seg_length_m = seg.norm();

            if travelled_m + seg_length_m >= distance_m {
                // Zero length segments can only reach here if distance has already been met
                if seg_length_m <= 0.0 {
                    return Some(w[1]);
                }

                let frac = (distance_m - travelled_m) / seg_length_m;
                return Some(w[0] + seg * frac);
            }

            travelled_m += seg_length_m;
        }

        self.points_m.last().copied()
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn l_path() -> Path {
        Path::new(vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, 3.0),
            Vector3::new(4.0, 0.0, 3.0),
        ])
    }

    #[test]
    fn test_length() {
        assert_eq!(Path::new_empty().get_length(), 0.0);
        assert!((l_path().get_length() - 7.0).abs() < 1e-12);
        assert!(
            (Path::direct(Vector3::zeros(), Vector3::new(3.0, 4.0, 0.0)).get_length() - 5.0).abs()
                < 1e-12
        );
    }

    #[test]
    fn test_look_ahead() {
        let path = l_path();

        // Within the first segment
        let p = path.look_ahead_point(1.5).unwrap();
        assert!((p - Vector3::new(0.0, 0.0, 1.5)).norm() < 1e-12);

        // Interpolated on the second segment, not snapped to a vertex
        let p = path.look_ahead_point(5.0).unwrap();
        assert!((p - Vector3::new(2.0, 0.0, 3.0)).norm() < 1e-12);

        // Longer than the path gives the final point
        let p = path.look_ahead_point(100.0).unwrap();
        assert!((p - Vector3::new(4.0, 0.0, 3.0)).norm() < 1e-12);

        assert!(Path::new_empty().look_ahead_point(1.0).is_none());

        let single = Path::new(vec![Vector3::new(1.0, 2.0, 3.0)]);
        assert_eq!(single.look_ahead_point(1.0), Some(Vector3::new(1.0, 2.0, 3.0)));
    }
}
