//! # PID controller
//!
//! This module provides the PID controller used by TrajCtrl to drive the vehicle onto the
//! selected trajectory.
//!
//! The controller carries an optional overshoot limiter, which is an anti-windup scheme with two
//! phases:
//!
//! 1. Until the error changes sign for the first time the integral term contributes nothing to
//!    the output, although the integral keeps accumulating.
//! 2. Every time the error changes sign the integral is reset to zero.
//!
//! Output saturation is not performed here, actuator limits are applied by the caller.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Gains and options of a PID controller
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PidParams {
    /// Proportional gain
    pub k_p: f64,

    /// Integral gain
    pub k_i: f64,

    /// Derivative gain
    pub k_d: f64,

    /// Enable the overshoot limiter
    pub overshoot_limiter: bool,
}

/// A PID controller
#[derive(Debug, Clone, Serialize)]
pub struct PidController {
    /// Proportional gain
    k_p: f64,

    /// Integral gain
    k_i: f64,

    /// Dervative gain
    k_d: f64,

    /// Value the controller drives the measured value towards
    setpoint: f64,

    /// The integral accumulation
    integral: f64,

    /// Error on the previous tick, zero before the first tick
    prev_error: f64,

    /// Overshoot limiter phase
    limiter: OvershootLimiter,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Phase of the overshoot limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OvershootLimiter {
    /// The limiter is turned off, the integral term is always active.
    Disabled,

    /// The measured value hasn't crossed the setpoint yet, the integral term is suppressed.
    NotYetCrossed,

    /// The measured value has crossed the setpoint at least once since the last reset.
    Crossed,
}

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum PidError {
    #[error("The time step must be positive and finite, got {0}")]
    InvalidTimeStep(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for PidParams {
    fn default() -> Self {
        Self {
            k_p: 0.3,
            k_i: 0.0,
            k_d: 0.05,
            overshoot_limiter: true,
        }
    }
}

impl OvershootLimiter {
    /// Create the limiter in its initial phase.
    pub fn new(enabled: bool) -> Self {
        match enabled {
            true => Self::NotYetCrossed,
            false => Self::Disabled,
        }
    }

    /// Update the phase with the errors of the current and previous ticks.
    ///
    /// Returns true if the integral must be reset, which is the case whenever the error changes
    /// sign while the limiter is enabled.
    pub fn update(&mut self, error: f64, prev_error: f64) -> bool {
        if *self == Self::Disabled {
            return false;
        }

        if error * prev_error < 0.0 {
            *self = Self::Crossed;
            true
        } else {
            false
        }
    }

    /// Get the integral gain to apply in the current phase.
    pub fn integral_gain(&self, k_i: f64) -> f64 {
        match self {
            Self::NotYetCrossed => 0.0,
            Self::Disabled | Self::Crossed => k_i,
        }
    }

    /// True once the setpoint has been crossed.
    pub fn has_crossed(&self) -> bool {
        *self == Self::Crossed
    }

    /// Return to the initial phase, keeping the enabled state.
    pub fn reset(&mut self) {
        if *self == Self::Crossed {
            *self = Self::NotYetCrossed;
        }
    }
}

impl PidController {
    /// Create a new controller with the given gains and a setpoint of zero.
    pub fn new(params: PidParams) -> Self {
        Self {
            k_p: params.k_p,
            k_i: params.k_i,
            k_d: params.k_d,
            setpoint: 0.0,
            integral: 0.0,
            prev_error: 0.0,
            limiter: OvershootLimiter::new(params.overshoot_limiter),
        }
    }

    /// Set the value the controller drives towards.
    pub fn set_setpoint(&mut self, setpoint: f64) {
        self.setpoint = setpoint;
    }

    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }

    pub fn prev_error(&self) -> f64 {
        self.prev_error
    }

    pub fn limiter(&self) -> OvershootLimiter {
        self.limiter
    }

    /// True once the error has changed sign since the last reset, always false if the overshoot
    /// limiter is disabled.
    pub fn crossed_setpoint(&self) -> bool {
        self.limiter.has_crossed()
    }

    /// Clear the integral, previous error and overshoot limiter phase. Gains and setpoint are
    /// kept.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = 0.0;
        self.limiter.reset();
    }

    /// Get the control output for the measured value after a tick of `dt` seconds.
    ///
    /// `dt` must be positive and finite, otherwise an error is returned and the controller's
    /// state is left unchanged.
    pub fn get(&mut self, measured_value: f64, dt: f64) -> Result<f64, PidError> {
        if !(dt > 0.0 && dt.is_finite()) {
            return Err(PidError::InvalidTimeStep(dt));
        }

        let error = self.setpoint - measured_value;

        // Reset the integral each time the error crosses zero
        if self.limiter.update(error, self.prev_error) {
            trace!("Setpoint crossed, integral reset from {}", self.integral);
            self.integral = 0.0;
        }

        let k_i = self.limiter.integral_gain(self.k_i);

        // Accumulated even when suppressed so it's available as soon as the setpoint is crossed
        self.integral += error * dt;

        let deriv = (error - self.prev_error) / dt;

        let out = self.k_p * error + k_i * self.integral + self.k_d * deriv;

        self.prev_error = error;

        Ok(out)
    }
}
