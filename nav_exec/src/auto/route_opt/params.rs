//! Route optimiser parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Deserialize, Debug, Clone)]
pub struct RouteOptParams {
    /// Above this number of targets the exhaustive search is slow, a warning is logged but the
    /// search still runs.
    pub max_exact_targets: usize,
}

impl Default for RouteOptParams {
    fn default() -> Self {
        Self {
            max_exact_targets: 10,
        }
    }
}
