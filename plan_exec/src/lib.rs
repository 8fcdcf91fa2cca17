//! # Local planner library.
//!
//! This library allows other crates in the workspace, the benches and the integration tests to
//! access items defined inside the local planner crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Curves - the lateral offset functions candidates are built from
pub mod curve;

/// Maps - occupancy and segmentation grids the candidates are evaluated against
pub mod map;

/// Local planning - evaluates and ranks the candidate trajectories
pub mod plan;

/// Plotter - renders the planning situation into an image
pub mod plotter;

/// Scenario - offline description of a planning and tracking run
pub mod scenario;

/// Trajectory control module - keeps the vehicle on the selected trajectory
pub mod traj_ctrl;
