//! # NavMgr Parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

use crate::auto::{
    loc::LocParams, mission::MissionParams, obst_avoid::ObstAvoidParams,
    path_follow::PathFollowParams, route_opt::RouteOptParams,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of every component owned by the [`super::NavMgr`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NavMgrParams {
    pub loc: LocParams,

    pub path_follow: PathFollowParams,

    pub obst_avoid: ObstAvoidParams,

    pub route_opt: RouteOptParams,

    pub mission: MissionParams,
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
