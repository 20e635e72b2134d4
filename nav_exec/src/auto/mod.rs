//! # Autonomy Module
//!
//! This module provides the navigation core of the rover, allowing it to visit a set of mission
//! targets by itself. Every component is cyclic, implementing [`util::module::State`], and is
//! owned and stepped by the [`NavMgr`].

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use nav_mgr::{NavInput, NavMgr, NavMgrBuilder, NavMgrError, NavMgrParams, NavOutput, NavTm};

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// External collaborator interfaces - path and ray query providers
pub mod ext;

/// Localisation module - provides the rover with an idea of where it is in the world
pub mod loc;

/// Mission coordination module - sequences the targets of a mission
pub mod mission;

/// Navigation manager - owns and steps every component
pub mod nav_mgr;

/// Obstacle avoidance module - reactive avoidance and stuck recovery
pub mod obst_avoid;

/// Defines path types
pub mod path;

/// Path following module - steers the rover towards its active target
pub mod path_follow;

/// Route optimisation module - finds the shortest order to visit the targets
pub mod route_opt;
