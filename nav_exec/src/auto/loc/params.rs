//! # Localisation parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the [`super::Localizer`].
#[derive(Debug, Clone, Deserialize)]
pub struct LocParams {
    /// Half width of the uniform noise added to every range measurement.
    ///
    /// Units: meters
    pub range_noise_m: f64,

    /// Seed for the measurement noise generator. If not set the generator is seeded from the OS,
    /// so runs are not repeatable.
    #[serde(default)]
    pub noise_seed: Option<u64>,

    /// Maximum number of Gauss-Newton refinement iterations.
    pub gn_max_iterations: usize,

    /// The refinement has converged once the update magnitude is below this.
    ///
    /// Units: meters
    pub gn_tolerance_m: f64,

    /// If the determinant of the normal matrix (J^T J) is below this the system is considered
    /// singular and refinement stops.
    pub gn_singular_threshold: f64,
}

impl Default for LocParams {
    fn default() -> Self {
        Self {
            range_noise_m: 0.05,
            noise_seed: None,
            gn_max_iterations: 10,
            gn_tolerance_m: 1e-4,
            gn_singular_threshold: 1e-9,
        }
    }
}
