//! # Local planning module
//!
//! The local planner is handed a set of candidate trajectories for the current planning cycle.
//! Each candidate is a lateral offset (`rho`) curve over arc length (`s`) measured along the
//! global centerline, starting at the candidate's `s0`.
//!
//! A planning cycle runs every cost evaluator over every candidate, combines the component costs
//! into an aggregate cost, and then ranks the set. The rank 0 candidate is the one handed to
//! trajectory control, unless no candidate is feasible, in which case trajectory control must be
//! told there is nothing to track.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod candidate;
pub mod centerline;
pub mod eval;
pub mod params;
pub mod selector;
pub mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use candidate::*;
pub use centerline::*;
pub use params::Params;
pub use selector::SelectError;
pub use state::*;
