//! # Navigation Executable Parameters
//!
//! This module provides parameters for the navigation executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct NavExecParams {
    /// Target period of one control cycle, also the simulation step
    pub tick_period_s: f64,

    /// Limit on the simulated mission time
    pub max_duration_s: f64,

    /// Directory, relative to the software root, in which sessions are created
    pub sessions_dir: String,

    /// If true each cycle sleeps to hold the tick period
    pub realtime: bool,
}
