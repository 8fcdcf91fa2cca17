//! # Candidate trajectories
//!
//! A [`Candidate`] wraps one lateral offset curve proposed for a planning cycle together with the
//! information the cost evaluators attach to it. Candidates live for a single planning cycle.
//!
//! The curve and its two derivatives are private so that they can never diverge: the
//! derivatives are computed once when the candidate is (re)initialised. All other fields are a
//! plain record which is filled in by the evaluators, each of which owns a disjoint set of
//! fields:
//!
//! | Field(s)                              | Written by                   |
//! |---------------------------------------|------------------------------|
//! | `max_curvature`, `comfortability`     | [`GeometryEval`]             |
//! | `out_of_bounds`, `rho_cost`           | [`CorridorEval`]             |
//! | `hits_obstacle`, `static_safety`      | [`ObstacleEval`]             |
//! | `segmentation_cost`                   | [`SegmentationEval`]         |
//! | `dynamic_safety`                      | external                     |
//! | `cost`                                | [`LocalPlanner`]             |
//! | `rank`                                | [`rank`](super::selector::rank) |
//!
//! No field is validated on write.
//!
//! [`GeometryEval`]: super::eval::GeometryEval
//! [`CorridorEval`]: super::eval::CorridorEval
//! [`ObstacleEval`]: super::eval::ObstacleEval
//! [`SegmentationEval`]: super::eval::SegmentationEval
//! [`LocalPlanner`]: super::LocalPlanner

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Serialize;

use crate::curve::{Curve, Polynomial};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Default validity horizon of a candidate in meters of arc length.
pub const DEFAULT_MAX_LENGTH_M: f64 = 100.0;

/// Upper bound on the number of arc length samples taken along one candidate.
pub const MAX_NUM_SAMPLES: usize = 10_000;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A candidate path generated for the local planner.
#[derive(Debug, Clone, Serialize)]
pub struct Candidate<C: Curve = Polynomial> {
    curve: C,
    first_deriv: C,
    second_deriv: C,

    /// True if any sampled point of the candidate leaves the drivable corridor.
    pub out_of_bounds: bool,

    /// True if any sampled point of the candidate collides with a known obstacle.
    pub hits_obstacle: bool,

    /// Aggregate cost of the candidate, lower is better.
    ///
    /// Only meaningful once all evaluators have run.
    pub cost: f64,

    /// Ride comfort cost, derived from the curvature along the candidate.
    pub comfortability: f64,

    /// Cost of passing close to static obstacles.
    pub static_safety: f64,

    /// Cost of passing close to moving obstacles.
    pub dynamic_safety: f64,

    /// Cost of the terrain classes the candidate crosses.
    pub segmentation_cost: f64,

    /// Cost of the final lateral deviation from the desired offset.
    pub rho_cost: f64,

    /// Maximum absolute curvature observed along the candidate, in 1/meters.
    pub max_curvature: f64,

    /// Validity horizon of the candidate in meters of arc length.
    pub max_length: f64,

    /// Arc length along the centerline at which this candidate starts.
    pub s0: f64,

    /// Rank assigned by the selector, `None` until ranking has run. `Some(0)` is the best.
    pub rank: Option<usize>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<C: Curve> Candidate<C> {
    /// Create a candidate path from the given curve.
    pub fn new(curve: C) -> Self {
        let first_deriv = curve.derivative();
        let second_deriv = first_deriv.derivative();

        Self {
            curve,
            first_deriv,
            second_deriv,
            out_of_bounds: false,
            hits_obstacle: false,
            cost: 0.0,
            comfortability: 0.0,
            static_safety: 0.0,
            dynamic_safety: 0.0,
            segmentation_cost: 0.0,
            rho_cost: 0.0,
            max_curvature: 0.0,
            max_length: DEFAULT_MAX_LENGTH_M,
            s0: 0.0,
            rank: None,
        }
    }

    /// Reinitialise this candidate with a new curve.
    ///
    /// All costs, flags, limits and the rank are reset to their defaults.
    pub fn initialize(&mut self, curve: C) {
        *self = Self::new(curve);
    }

    /// Signed lateral offset of the candidate at arc length `s`.
    ///
    /// `s` is expected to be in `[0, max_length]`, values outside this range are passed straight
    /// through to the curve.
    pub fn at(&self, s: f64) -> f64 {
        self.curve.at(s)
    }

    /// First derivative of the lateral offset at arc length `s`.
    pub fn derivative_at(&self, s: f64) -> f64 {
        self.first_deriv.at(s)
    }

    /// Second derivative of the lateral offset at arc length `s`.
    pub fn second_derivative_at(&self, s: f64) -> f64 {
        self.second_deriv.at(s)
    }

    /// The underlying curve.
    pub fn curve(&self) -> &C {
        &self.curve
    }

    /// True if the candidate neither leaves the corridor nor hits an obstacle.
    pub fn is_feasible(&self) -> bool {
        !self.out_of_bounds && !self.hits_obstacle
    }

    /// Arc length values at which to sample this candidate, spaced by at most `step_m` and
    /// always including both `0` and `max_length`.
    ///
    /// A non-positive or non-finite step, or a non-positive or non-finite horizon, yields only
    /// `s = 0`. At most [`MAX_NUM_SAMPLES`] samples are returned, the step is widened to fit long
    /// horizons.
    pub fn sample_points(&self, step_m: f64) -> Vec<f64> {
        let valid_step = step_m > 0.0 && step_m.is_finite();
        let valid_horizon = self.max_length > 0.0 && self.max_length.is_finite();
        if !(valid_step && valid_horizon) {
            return vec![0.0];
        }

        let max_steps = (MAX_NUM_SAMPLES - 1) as f64;
        let num_steps = (self.max_length / step_m).ceil().min(max_steps).max(1.0) as usize;
        let step_m = step_m.max(self.max_length / max_steps);

        (0..=num_steps)
            .map(|i| match i {
                i if i == num_steps => self.max_length,
                i => (i as f64 * step_m).min(self.max_length),
            })
            .collect()
    }
}

impl<C: Curve + Default> Default for Candidate<C> {
    fn default() -> Self {
        Self::new(C::default())
    }
}
