//! # Obstacle avoidance module
//!
//! Obstacle avoidance runs alongside path following and can override its demands. A small set of
//! short range rays is cast from a sensor bar on the front of the rover:
//!
//! - A side ray straight ahead from each end of the bar. If a side ray is clear the angled ray
//!   from the same end, turned outwards, is cast instead.
//! - A fan of parallel centre rays spanning the middle of the bar.
//!
//! Hits on obstacles add a signed weight to an accumulator (positive steers right): right side
//! -1, right angled -0.5, left side +1, left angled +0.5. If the sides sum to exactly zero the
//! nearest centre hit decides, -1 if its surface normal points to the rover's left and +1
//! otherwise. A non-zero accumulator puts the module in `Avoiding`, steering fully away.
//!
//! If the centre fan is blocked while the rover is trying to drive but moving slower than the
//! minimum speed for long enough, the rover is stuck and the module enters `Reversing`. Reversing
//! overrides everything else and only ends once a full sweep of every sensor is clear, after which
//! a single stop is commanded before following resumes.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
pub mod sensors;
mod state;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use params::ObstAvoidParams;
pub use sensors::{Sensor, SensorHit, SensorReading};
pub use state::*;
