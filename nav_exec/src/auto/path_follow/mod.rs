//! # Path following module
//!
//! Path following drives the rover towards a single active target. Each tick the external path
//! provider is asked for a polyline from the rover to the target (a straight line is used if it
//! has none), and the rover steers towards a look-ahead point a fixed distance along that
//! polyline.
//!
//! The steering demand is proportional to the lateral offset of the look-ahead point divided by
//! its distance, so it saturates for points directly to the side. Full torque is demanded until
//! the rover is within the slowing distance, after which the torque falls with the square of the
//! remaining distance.
//!
//! Once inside the arrival distance the rover is braked and a one-shot "target reached" event is
//! raised. The event is latched until the rover leaves the arrival radius or the target changes.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod controllers;
mod params;
mod state;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use controllers::SteerFilter;
pub use params::PathFollowParams;
pub use state::*;
