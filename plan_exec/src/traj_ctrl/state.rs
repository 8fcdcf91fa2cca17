//! Trajectory control module state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, warn};
use serde::Serialize;

// Internal
use super::*;
use crate::{
    curve::{Curve, Polynomial},
    plan::{selector, Candidate},
};
use util::params;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

pub struct TrajCtrl<C: Curve = Polynomial> {
    params: Params,

    /// Executing mode
    mode: TrajCtrlMode,

    /// The trajectory being tracked
    reference: Option<Candidate<C>>,

    /// Lateral offset controller
    lat_ctrl: PidController,

    report: StatusReport,
}

/// Position of the vehicle in the curvilinear frame of the centerline.
#[derive(Debug, Default, Copy, Clone, Serialize)]
pub struct TrackInput {
    /// Arc length along the centerline
    pub s_m: f64,

    /// Signed lateral offset from the centerline, positive left
    pub rho_m: f64,
}

/// Command output by trajectory control.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub enum TrackCmd {
    /// Steer towards the reference, positive left.
    Steer { steer_dem: f64 },

    /// Bring the vehicle to a stop and hold.
    Stop,
}

/// The status report containing various error flags and monitoring quantities.
#[derive(Debug, Default, Copy, Clone, Serialize)]
pub struct StatusReport {
    /// The lateral offset of the reference at the current arc length
    pub setpoint_rho_m: f64,

    /// The lateral error to the reference
    pub lat_error_m: f64,

    /// Controller output before saturation
    pub raw_steer_dem: f64,

    /// If true the steer demand was saturated
    pub steer_dem_limited: bool,

    /// If true the limit on the lateral error has been exceeded
    pub lat_error_limit_exceeded: bool,

    /// If true the vehicle has passed the end of the reference's validity horizon
    pub horizon_reached: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Potential errors that can occur during processing of the module.
#[derive(Debug, thiserror::Error)]
pub enum TrajCtrlError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(params::LoadError),

    #[error("Lateral controller error: {0}")]
    Pid(PidError),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),
}

/// The possible modes of execution of TrajCtrl. Each mode is handled by a
/// `mode_xyz` function.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum TrajCtrlMode {
    /// No reference has ever been given, no commands are output.
    Off,

    /// Following the reference.
    Tracking,

    /// No usable reference, the vehicle is held stopped.
    Hold,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<C: Curve> TrajCtrl<C> {
    /// Initialise the TrajCtrl module from a parameter file.
    pub fn init(params_path: &str) -> Result<Self, TrajCtrlError> {
        let params = params::load(params_path).map_err(TrajCtrlError::ParamLoadError)?;

        Self::new(params)
    }

    /// Create the module from parameters, in `Off` mode.
    ///
    /// The steer demand limits must be finite with `min_steer_dem <= max_steer_dem`.
    pub fn new(params: Params) -> Result<Self, TrajCtrlError> {
        let (min, max) = (params.min_steer_dem, params.max_steer_dem);
        if !(min.is_finite() && max.is_finite() && min <= max) {
            return Err(TrajCtrlError::InvalidParams(format!(
                "steer demand limits must be finite and ordered, got [{}, {}]",
                min, max
            )));
        }

        let lat_ctrl = PidController::new(params.lat_ctrl);

        Ok(Self {
            params,
            mode: TrajCtrlMode::Off,
            reference: None,
            lat_ctrl,
            report: StatusReport::default(),
        })
    }

    pub fn mode(&self) -> TrajCtrlMode {
        self.mode
    }

    pub fn reference(&self) -> Option<&Candidate<C>> {
        self.reference.as_ref()
    }

    pub fn controller(&self) -> &PidController {
        &self.lat_ctrl
    }

    /// Set the trajectory to track.
    ///
    /// `None` indicates that there is no feasible trajectory, in which case the vehicle is held
    /// stopped. A new reference starts a new cycle of the controller, clearing its integral and
    /// overshoot limiter.
    pub fn set_reference(&mut self, reference: Option<Candidate<C>>) {
        match reference {
            Some(r) => {
                if self.mode != TrajCtrlMode::Tracking {
                    info!("TrajCtrl: {:?} -> Tracking", self.mode);
                }
                self.lat_ctrl.reset();
                self.reference = Some(r);
                self.mode = TrajCtrlMode::Tracking;
            }
            None => {
                warn!("TrajCtrl: no trajectory to track, holding");
                self.hold();
            }
        }
    }

    /// Set the reference from a ranked candidate set, using the rank 0 candidate if it is
    /// feasible.
    pub fn select_reference(&mut self, candidates: &[Candidate<C>]) {
        let best = selector::best(candidates).map(|i| candidates[i].clone());
        self.set_reference(best);
    }

    /// Process trajectory control for one tick of `dt_s` seconds.
    ///
    /// Returns the command to execute, which is `None` in `Off` mode, and the status report.
    pub fn proc(
        &mut self,
        input: &TrackInput,
        dt_s: f64,
    ) -> Result<(Option<TrackCmd>, StatusReport), TrajCtrlError> {
        self.report = StatusReport::default();

        let cmd = match self.mode {
            TrajCtrlMode::Off => None,
            TrajCtrlMode::Tracking => Some(self.mode_tracking(input, dt_s)?),
            TrajCtrlMode::Hold => Some(TrackCmd::Stop),
        };

        Ok((cmd, self.report))
    }

    /// Mode tracking
    ///
    /// Drive the lateral offset onto the reference's offset at the current arc length.
    fn mode_tracking(&mut self, input: &TrackInput, dt_s: f64) -> Result<TrackCmd, TrajCtrlError> {
        // The reference is always set in tracking mode, if not stop
        let reference = match self.reference {
            Some(ref r) => r,
            None => {
                self.hold();
                return Ok(TrackCmd::Stop);
            }
        };

        // Arc length along the reference
        let s_m = input.s_m - reference.s0;
        if s_m > reference.max_length {
            warn!(
                "TrajCtrl: end of reference reached ({:.2} m > {:.2} m), holding",
                s_m, reference.max_length
            );
            self.report.horizon_reached = true;
            self.hold();
            return Ok(TrackCmd::Stop);
        }

        let setpoint_m = reference.at(s_m);
        self.lat_ctrl.set_setpoint(setpoint_m);

        let raw_dem = self
            .lat_ctrl
            .get(input.rho_m, dt_s)
            .map_err(TrajCtrlError::Pid)?;

        let lat_err_m = setpoint_m - input.rho_m;
        self.report.setpoint_rho_m = setpoint_m;
        self.report.lat_error_m = lat_err_m;
        self.report.raw_steer_dem = raw_dem;

        if lat_err_m.abs() > self.params.lat_error_limit_m {
            warn!(
                "TrajCtrl: lateral error {:.3} m exceeds limit of {:.3} m, holding",
                lat_err_m, self.params.lat_error_limit_m
            );
            self.report.lat_error_limit_exceeded = true;
            self.hold();
            return Ok(TrackCmd::Stop);
        }

        let steer_dem = raw_dem.clamp(self.params.min_steer_dem, self.params.max_steer_dem);
        self.report.steer_dem_limited = steer_dem != raw_dem;

        Ok(TrackCmd::Steer { steer_dem })
    }

    /// Switch into hold, dropping the reference.
    fn hold(&mut self) {
        if self.mode != TrajCtrlMode::Hold {
            info!("TrajCtrl: {:?} -> Hold", self.mode);
        }
        self.reference = None;
        self.mode = TrajCtrlMode::Hold;
    }
}
