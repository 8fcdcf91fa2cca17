//! # Trajectory control module
//!
//! Trajectory control is responsible for keeping the vehicle on the trajectory selected by the
//! local planner. It does this using a PID controller operating on the lateral offset.
//!
//! The reference is the rank 0 candidate of the latest planning cycle. Each tick the vehicle's
//! position is given in the curvilinear frame of the centerline, as an arc length `s` and lateral
//! offset `rho`. The controller's setpoint is the reference's offset at that arc length, and the
//! output is a steer demand, positive to the left, saturated to the actuator limits.
//!
//! If the planner could not find a feasible trajectory, or the vehicle strays too far from the
//! reference, trajectory control holds the vehicle stopped until a new reference is given.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod params;
pub mod pid;
pub mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::Params;
pub use pid::*;
pub use state::*;
