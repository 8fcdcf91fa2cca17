//! Trajectory control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// Internal
use super::PidParams;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for trajectory control
#[derive(Deserialize, Debug, Clone)]
pub struct Params {
    
    /// Lateral offset controller gains
    pub lat_ctrl: PidParams,

    /// Steer demand minimum limit
    pub min_steer_dem: f64,

    /// Steer demand maximum limit
    pub max_steer_dem: f64,

    /// The limit on lateral error. Above this limit tracking will be aborted
    /// and the vehicle brought to a stop.
    pub lat_error_limit_m: f64,
}
