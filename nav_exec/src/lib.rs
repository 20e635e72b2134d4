//! # Navigation library.
//!
//! This library provides the autonomous navigation core, along with a simulated world the core
//! can be run in without a host.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Autonomy module - localisation, path following, obstacle avoidance, route optimisation and
/// mission coordination
pub mod auto;

/// Simulation module - reference world, path provider and rover model
pub mod sim;
