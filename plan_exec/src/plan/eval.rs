//! # Cost evaluators
//!
//! Each evaluator samples a candidate along its arc length and writes its own subset of the
//! candidate's cost fields. No two evaluators write the same field, so they may be run in any
//! order. The aggregate cost is computed from the component costs by [`CostWeights`] once every
//! evaluator has run.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::{Candidate, Centerline};
use crate::{
    curve::Curve,
    map::{OccupancyGrid, SegmentationMap},
};
use util::maths::curvature;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A pass which writes part of the evaluation of a candidate.
pub trait CostEvaluator<C: Curve> {
    /// Short name of the evaluator used in logs.
    fn name(&self) -> &'static str;

    /// Evaluate the candidate, overwriting the fields this evaluator owns.
    fn evaluate(&self, candidate: &mut Candidate<C>, ctx: &EvalContext);
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Everything the evaluators need to know about the world for one planning cycle.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    /// Spacing between arc length samples along each candidate.
    pub sample_step_m: f64,

    /// The centerline the candidates are expressed relative to.
    pub centerline: &'a Centerline,

    /// Occupancy grid of the local frame, if one is available.
    pub occupancy: Option<&'a OccupancyGrid>,

    /// Terrain segmentation cost map of the local frame, if one is available.
    pub segmentation: Option<&'a SegmentationMap>,
}

/// Writes `max_curvature` and `comfortability`.
///
/// Comfortability is the mean squared curvature over the samples.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct GeometryEval;

/// Writes `out_of_bounds` and `rho_cost`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CorridorEval {
    /// Maximum allowed absolute lateral offset from the centerline.
    pub half_width_m: f64,

    /// Desired lateral offset at the end of the candidate.
    pub target_rho_m: f64,
}

/// Writes `hits_obstacle` and `static_safety`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ObstacleEval {
    /// Half the width of the vehicle, any occupied cell closer than this to a sample is a
    /// collision.
    pub vehicle_half_width_m: f64,

    /// Distance within which occupied cells add to the static safety cost.
    pub safety_distance_m: f64,

    /// Minimum occupancy value for a cell to be considered an obstacle.
    pub occupied_threshold: i8,
}

/// Writes `segmentation_cost`, the mean terrain cost over the samples that fall on the map.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SegmentationEval;

/// Weights combining the component costs into the aggregate cost.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CostWeights {
    pub comfort: f64,
    pub static_safety: f64,
    pub dynamic_safety: f64,
    pub rho: f64,
    pub segmentation: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<'a> EvalContext<'a> {
    /// Create a context with only a centerline.
    pub fn new(sample_step_m: f64, centerline: &'a Centerline) -> Self {
        Self {
            sample_step_m,
            centerline,
            occupancy: None,
            segmentation: None,
        }
    }

    /// Cartesian position of the candidate at its own arc length `s`.
    fn position<C: Curve>(&self, candidate: &Candidate<C>, s: f64) -> nalgebra::Vector2<f64> {
        self.centerline.point_at(candidate.s0 + s, candidate.at(s))
    }
}

impl<C: Curve> CostEvaluator<C> for GeometryEval {
    fn name(&self) -> &'static str {
        "geometry"
    }

    fn evaluate(&self, candidate: &mut Candidate<C>, ctx: &EvalContext) {
        let samples = candidate.sample_points(ctx.sample_step_m);

        let mut max_curv = 0f64;
        let mut sum_sq_curv = 0f64;

        for &s in samples.iter() {
            let k = curvature(candidate.derivative_at(s), candidate.second_derivative_at(s));
            max_curv = max_curv.max(k);
            sum_sq_curv += k * k;
        }

        candidate.max_curvature = max_curv;
        candidate.comfortability = sum_sq_curv / samples.len() as f64;
    }
}

impl<C: Curve> CostEvaluator<C> for CorridorEval {
    fn name(&self) -> &'static str {
        "corridor"
    }

    fn evaluate(&self, candidate: &mut Candidate<C>, ctx: &EvalContext) {
        candidate.out_of_bounds = candidate
            .sample_points(ctx.sample_step_m)
            .into_iter()
            .any(|s| candidate.at(s).abs() > self.half_width_m);

        candidate.rho_cost = (candidate.at(candidate.max_length) - self.target_rho_m).abs();
    }
}

impl<C: Curve> CostEvaluator<C> for ObstacleEval {
    fn name(&self) -> &'static str {
        "obstacle"
    }

    fn evaluate(&self, candidate: &mut Candidate<C>, ctx: &EvalContext) {
        let grid = match ctx.occupancy {
            Some(g) => g,
            None => {
                candidate.hits_obstacle = false;
                candidate.static_safety = 0.0;
                return;
            }
        };

        let search_radius_m = self.vehicle_half_width_m.max(self.safety_distance_m);

        let mut hits = false;
        let mut safety = 0f64;

        for s in candidate.sample_points(ctx.sample_step_m) {
            let pos = ctx.position(candidate, s);

            let dist_m = match grid.nearest_occupied(&pos, search_radius_m, self.occupied_threshold)
            {
                Some(d) => d,
                None => continue,
            };

            if dist_m <= self.vehicle_half_width_m {
                hits = true;
            }

            if self.safety_distance_m > 0.0 {
                safety = safety.max((1.0 - dist_m / self.safety_distance_m).max(0.0));
            }
        }

        candidate.hits_obstacle = hits;
        candidate.static_safety = safety;
    }
}

impl<C: Curve> CostEvaluator<C> for SegmentationEval {
    fn name(&self) -> &'static str {
        "segmentation"
    }

    fn evaluate(&self, candidate: &mut Candidate<C>, ctx: &EvalContext) {
        let map = match ctx.segmentation {
            Some(m) => m,
            None => {
                candidate.segmentation_cost = 0.0;
                return;
            }
        };

        let (sum, num) = candidate
            .sample_points(ctx.sample_step_m)
            .into_iter()
            .filter_map(|s| map.get_position(&ctx.position(candidate, s)).copied())
            .fold((0f64, 0usize), |(sum, num), c| (sum + c, num + 1));

        candidate.segmentation_cost = if num > 0 { sum / num as f64 } else { 0.0 };
    }
}

impl CostWeights {
    /// Combine the component costs of a candidate into its aggregate cost.
    pub fn aggregate<C: Curve>(&self, candidate: &Candidate<C>) -> f64 {
        self.comfort * candidate.comfortability
            + self.static_safety * candidate.static_safety
            + self.dynamic_safety * candidate.dynamic_safety
            + self.rho * candidate.rho_cost
            + self.segmentation * candidate.segmentation_cost
    }
}

impl Default for CostWeights {
    fn default() -> Self {
        Self {
            comfort: 1.0,
            static_safety: 1.0,
            dynamic_safety: 0.0,
            rho: 1.0,
            segmentation: 1.0,
        }
    }
}
