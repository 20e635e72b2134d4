//! Utility library for the navigation software.
//!
//! Everything in here is independent of the navigation core itself: logging, parameter file
//! loading, session management, archiving and some small maths helpers.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod archive;
pub mod host;
pub mod logger;
pub mod maths;
pub mod module;
pub mod params;
pub mod session;
pub mod time;
