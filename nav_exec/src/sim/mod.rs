//! # Simulation module
//!
//! A reference world for running the navigation core without a host: sphere obstacles and
//! detectable objects, a straight line path provider and a kinematic rover. Used by the
//! executable and by tests.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod rover;
mod world;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use params::{SimParams, SphereParams, TargetParams};
pub use rover::{RoverParams, SimRover};
pub use world::{SimWorld, Sphere, StraightLinePaths};
