//! # Trilateration solvers
//!
//! Closed form three-sphere intersection and Gauss-Newton least squares refinement over any
//! number of ranges.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{Matrix3, Vector3};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Below this length a vector is treated as zero when building the trilateration frame.
const DEGENERATE_LENGTH_M: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Settings for [`refine_gauss_newton`].
#[derive(Debug, Clone, Copy)]
pub struct GaussNewtonParams {
    pub max_iterations: usize,
    pub tolerance_m: f64,
    pub singular_threshold: f64,
}

/// Result of a Gauss-Newton refinement.
#[derive(Debug, Clone, Copy)]
pub struct GaussNewtonResult {
    pub position_m: Vector3<f64>,

    /// Number of updates actually applied
    pub iterations: usize,

    pub converged: bool,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Closed form trilateration from three landmarks and their ranges.
///
/// A local frame is built with `ex` pointing from the first to the second landmark, `ey` towards
/// the third landmark in the plane of all three, and `ez = ex x ey`. In that frame the sphere
/// intersection reduces to
///
/// ```text
/// x = (r1^2 - r2^2 + d^2) / 2d
/// y = (r1^2 - r3^2 + i^2 + j^2) / 2j - (i / j) x
/// z = sqrt(r1^2 - x^2 - y^2)
/// ```
///
/// The solution on the `+ez` side of the landmark plane is returned. If noise makes the radicand
/// negative the height above the plane is taken as zero.
///
/// Returns `None` if the landmarks are coincident or collinear.
pub fn trilaterate(landmarks: [&Vector3<f64>; 3], ranges: [f64; 3]) -> Option<Vector3<f64>> {
    let [p1, p2, p3] = landmarks;
    let [r1, r2, r3] = ranges;

    let p21 = p2 - p1;
    let p31 = p3 - p1;

    let d = p21.norm();
    if d < DEGENERATE_LENGTH_M {
        return None;
    }
    let ex = p21 / d;

    let i = ex.dot(&p31);
    let ey_unnorm = p31 - ex * i;
    let ey_norm = ey_unnorm.norm();
    if ey_norm < DEGENERATE_LENGTH_M {
        return None;
    }
    let ey = ey_unnorm / ey_norm;
    let ez = ex.cross(&ey);

    let j = ey.dot(&p31);

    let x = (r1.powi(2) - r2.powi(2) + d.powi(2)) / (2.0 * d);
    let y = (r1.powi(2) - r3.powi(2) + i.powi(2) + j.powi(2)) / (2.0 * j) - (i / j) * x;
    let z = (r1.powi(2) - x.powi(2) - y.powi(2)).max(0.0).sqrt();

    Some(p1 + ex * x + ey * y + ez * z)
}

/// Refine a position estimate with Gauss-Newton least squares over all range measurements.
///
/// Each range residual `|x - p_i| - r_i` is linearised about the current estimate, giving rows
/// of the Jacobian equal to the unit vector from the landmark to the estimate. The normal
/// equations `(J^T J) dx = -J^T r` are solved for the update. Iteration stops once the update is
/// smaller than the tolerance, the iteration cap is hit, or the normal matrix is (near) singular,
/// in which case the last estimate is kept.
pub fn refine_gauss_newton(
    landmarks: &[Vector3<f64>],
    ranges: &[f64],
    initial_m: Vector3<f64>,
    params: &GaussNewtonParams,
) -> GaussNewtonResult {
    let mut result = GaussNewtonResult {
        position_m: initial_m,
        iterations: 0,
        converged: false,
    };

    for _ in 0..params.max_iterations {
        let mut jtj = Matrix3::zeros();
        let mut jtr = Vector3::zeros();

        for (p, r) in landmarks.iter().zip(ranges.iter()) {
            let diff = result.position_m - p;
            let dist = diff.norm();

            // Sitting on a landmark gives no direction information for that row
            if dist < DEGENERATE_LENGTH_M {
                continue;
            }

            let row = diff / dist;
            jtj += row * row.transpose();
            jtr += row * (dist - r);
        }

        if jtj.determinant().abs() < params.singular_threshold {
            break;
        }

        let delta = match jtj.cholesky() {
            Some(c) => c.solve(&(-jtr)),
            None => break,
        };

        result.position_m += delta;
        result.iterations += 1;

        if delta.norm() < params.tolerance_m {
            result.converged = true;
            break;
        }
    }

    result
}

/// Root mean square of the range residuals at the given position.
pub fn rms_residual(landmarks: &[Vector3<f64>], ranges: &[f64], position_m: &Vector3<f64>) -> f64 {
    if landmarks.is_empty() {
        return 0.0;
    }

    let sum_sq: f64 = landmarks
        .iter()
        .zip(ranges.iter())
        .map(|(p, r)| ((position_m - p).norm() - r).powi(2))
        .sum();

    (sum_sq / landmarks.len() as f64).sqrt()
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
