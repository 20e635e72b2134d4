//! # Mission coordination module
//!
//! The mission coordinator sequences a multi-target mission. It owns the route computed by the
//! route optimiser and decides, every tick, which point the path follower should be driving to.
//!
//! The coordinator is a state machine:
//!
//! - `Idle` - No mission has been started, or navigation has been stopped.
//! - `NavigatingToTarget` - Driving to the next target of the route, or back to the start.
//! - `SearchingArea` - A target with an area grid was reached, its sweep points are being visited
//!   in order while the detector scans for objects.
//! - `MovingToDetectedObject` - The detector found an object, the rover is driving to it.
//! - `TargetHandled` - The current route entry is finished. On the following tick the next route
//!   target is issued, or the rover returns to the start, or the route completes.
//! - `RouteComplete` - Terminal, no further targets are issued.
//!
//! Waits (the settle time at a reached target and the pause before a sweep begins) are scheduled
//! timers advanced by the tick's elapsed time. The rover is braked while one is pending. Stopping
//! the mission abandons every pending timer.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
pub mod search;
mod state;
pub mod timer;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use params::MissionParams;
pub use search::AreaGrid;
pub use state::*;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A point the mission must visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub id: usize,

    pub position_m: Vector3<f64>,

    /// Sweep points searched once the target is reached
    #[serde(default)]
    pub area_grid: Option<AreaGrid>,
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// The state of the mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissionState {
    Idle,
    NavigatingToTarget,
    SearchingArea,
    MovingToDetectedObject,
    TargetHandled,
    RouteComplete,
}

#[derive(Debug, thiserror::Error)]
pub enum MissionError {
    #[error("The route can only be reoptimised while navigating to a route target, not in {0}")]
    CannotReoptimise(MissionState),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Target {
    pub fn new(id: usize, position_m: Vector3<f64>) -> Self {
        Self {
            id,
            position_m,
            area_grid: None,
        }
    }

    pub fn with_area_grid(mut self, grid: AreaGrid) -> Self {
        self.area_grid = Some(grid);
        self
    }

    /// True if the target has a non-empty area grid to search
    pub fn has_search(&self) -> bool {
        self.area_grid.as_ref().map_or(false, |g| !g.is_empty())
    }
}

impl Default for MissionState {
    fn default() -> Self {
        MissionState::Idle
    }
}

impl Display for MissionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissionState::Idle => write!(f, "MissionState::Idle"),
            MissionState::NavigatingToTarget => write!(f, "MissionState::NavigatingToTarget"),
            MissionState::SearchingArea => write!(f, "MissionState::SearchingArea"),
            MissionState::MovingToDetectedObject => {
                write!(f, "MissionState::MovingToDetectedObject")
            }
            MissionState::TargetHandled => write!(f, "MissionState::TargetHandled"),
            MissionState::RouteComplete => write!(f, "MissionState::RouteComplete"),
        }
    }
}
