//! Local planner state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use serde::Serialize;

// Internal
use super::{
    eval::{CostEvaluator, EvalContext, GeometryEval, SegmentationEval},
    selector::{self, SelectError},
    Candidate, Centerline, Params,
};
use crate::{
    curve::{Curve, Polynomial},
    map::{OccupancyGrid, SegmentationMap},
};
use util::params;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The local planner, evaluates and ranks the candidate set each cycle.
pub struct LocalPlanner<C: Curve + 'static = Polynomial> {
    params: Params,

    /// The evaluators run over each candidate, in order.
    evaluators: Vec<Box<dyn CostEvaluator<C>>>,
}

/// Summary of one planning cycle.
#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    /// Number of candidates in the set
    pub num_candidates: usize,

    /// Number of candidates which are feasible
    pub num_feasible: usize,

    /// Index of the selected (rank 0, feasible) candidate. `None` if no candidate is feasible.
    pub selected: Option<usize>,

    /// Per candidate evaluation results, in input order
    pub candidates: Vec<CandidateSummary>,
}

/// Evaluation results of a single candidate.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CandidateSummary {
    pub rank: Option<usize>,
    pub cost: f64,
    pub out_of_bounds: bool,
    pub hits_obstacle: bool,
    pub max_curvature: f64,
    pub s0: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Potential errors that can occur during planning.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(params::LoadError),

    #[error("Attempted to plan with an empty candidate set")]
    NoCandidates,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<C: Curve + 'static> LocalPlanner<C> {
    /// Initialise the planner from a parameter file.
    pub fn init(params_path: &str) -> Result<Self, PlanError> {
        let params = params::load(params_path).map_err(PlanError::ParamLoadError)?;

        Ok(Self::new(params))
    }

    /// Create a planner with the standard evaluators configured from the parameters.
    pub fn new(params: Params) -> Self {
        let evaluators: Vec<Box<dyn CostEvaluator<C>>> = vec![
            Box::new(GeometryEval),
            Box::new(params.corridor),
            Box::new(params.obstacle),
            Box::new(SegmentationEval),
        ];

        Self { params, evaluators }
    }

    /// Add an extra evaluator which runs after the standard ones.
    ///
    /// The evaluator must only write fields no other evaluator writes, for example
    /// `dynamic_safety`.
    pub fn with_evaluator(mut self, evaluator: Box<dyn CostEvaluator<C>>) -> Self {
        self.evaluators.push(evaluator);
        self
    }

    /// The planner's parameters.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Run one planning cycle over the candidate set.
    ///
    /// Every evaluator is run over every candidate before the aggregate cost is computed and the
    /// set ranked. If no candidate is feasible the report's `selected` field is `None`, the ranks
    /// are still assigned for diagnostics.
    pub fn plan(
        &self,
        candidates: &mut [Candidate<C>],
        centerline: &Centerline,
        occupancy: Option<&OccupancyGrid>,
        segmentation: Option<&SegmentationMap>,
    ) -> Result<PlanReport, PlanError> {
        if candidates.is_empty() {
            return Err(PlanError::NoCandidates);
        }

        let ctx = EvalContext {
            sample_step_m: self.params.sample_step_m,
            centerline,
            occupancy,
            segmentation,
        };

        // ---- EVALUATION ----

        for cand in candidates.iter_mut() {
            for eval in self.evaluators.iter() {
                eval.evaluate(cand, &ctx);
            }
        }

        for (i, cand) in candidates.iter_mut().enumerate() {
            cand.cost = self.params.weights.aggregate(cand);

            debug!(
                "Candidate {}: cost {:.4} (comfort {:.4}, static {:.4}, dynamic {:.4}, rho {:.4}, \
                 seg {:.4}), oob {}, obstacle {}",
                i,
                cand.cost,
                cand.comfortability,
                cand.static_safety,
                cand.dynamic_safety,
                cand.rho_cost,
                cand.segmentation_cost,
                cand.out_of_bounds,
                cand.hits_obstacle
            );
        }

        // ---- RANKING ----

        let selected = match selector::rank(candidates) {
            Ok(i) => Some(i),
            Err(SelectError::NoFeasibleTrajectory(n)) => {
                warn!("No feasible trajectory among {} candidates", n);
                None
            }
            Err(SelectError::NoCandidates) => return Err(PlanError::NoCandidates),
        };

        let report = PlanReport {
            num_candidates: candidates.len(),
            num_feasible: candidates.iter().filter(|c| c.is_feasible()).count(),
            selected,
            candidates: candidates
                .iter()
                .map(|c| CandidateSummary {
                    rank: c.rank,
                    cost: c.cost,
                    out_of_bounds: c.out_of_bounds,
                    hits_obstacle: c.hits_obstacle,
                    max_curvature: c.max_curvature,
                    s0: c.s0,
                })
                .collect(),
        };

        info!(
            "Planning cycle: {} candidates, {} feasible, selected {:?}",
            report.num_candidates, report.num_feasible, report.selected
        );

        Ok(report)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        map::OCCUPANCY_FREE,
        plan::eval::{CorridorEval, CostWeights, ObstacleEval},
    };
    use nalgebra::Vector2;

    /// Sets a fixed dynamic safety cost on candidates starting left of the centerline.
    struct LeftIsBusy;

    impl CostEvaluator<Polynomial> for LeftIsBusy {
        fn name(&self) -> &'static str {
            "left_is_busy"
        }

        fn evaluate(&self, candidate: &mut Candidate, _ctx: &EvalContext) {
            candidate.dynamic_safety = if candidate.at(0.0) > 0.0 { 10.0 } else { 0.0 };
        }
    }

    fn params() -> Params {
        Params {
            sample_step_m: 0.5,
            corridor: CorridorEval {
                half_width_m: 3.0,
                target_rho_m: 0.0,
            },
            obstacle: ObstacleEval {
                vehicle_half_width_m: 1.0,
                safety_distance_m: 2.0,
                occupied_threshold: 50,
            },
            weights: CostWeights {
                dynamic_safety: 1.0,
                ..CostWeights::default()
            },
        }
    }

    fn fan() -> Vec<Candidate> {
        [-2.0, 0.0, 2.0, 4.0]
            .iter()
            .map(|&rho| {
                let mut c = Candidate::new(Polynomial::constant(rho));
                c.max_length = 20.0;
                c
            })
            .collect()
    }

    fn centerline() -> Centerline {
        Centerline::new(vec![Vector2::new(0.0, 0.0), Vector2::new(30.0, 0.0)]).unwrap()
    }

    #[test]
    fn test_plan_open_road() {
        let planner = LocalPlanner::new(params());
        let mut cands = fan();

        let report = planner.plan(&mut cands, &centerline(), None, None).unwrap();

        // Rho 4 is out of the corridor, rho 0 has the least deviation
        assert_eq!(report.num_candidates, 4);
        assert_eq!(report.num_feasible, 3);
        assert_eq!(report.selected, Some(1));
        assert!(cands[3].out_of_bounds);
        assert_eq!(cands[3].rank, Some(3));
        assert_eq!(cands[1].cost, 0.0);
        assert_eq!(cands[0].cost, 2.0);
    }

    #[test]
    fn test_plan_around_obstacle() {
        let planner = LocalPlanner::new(params()).with_evaluator(Box::new(LeftIsBusy));
        let mut cands = fan();

        let mut grid =
            OccupancyGrid::new(0.25, (120, 40), Vector2::new(0.0, -5.0), OCCUPANCY_FREE).unwrap();
        grid.add_disc_obstacle(&Vector2::new(10.0, 0.0), 0.5);

        let report = planner
            .plan(&mut cands, &centerline(), Some(&grid), None)
            .unwrap();

        // Centre is blocked and left is busy so the right hand candidate wins
        assert!(cands[1].hits_obstacle);
        assert_eq!(cands[2].dynamic_safety, 10.0);
        assert_eq!(report.selected, Some(0));
        assert_eq!(report.candidates[0].rank, Some(0));
    }

    #[test]
    fn test_plan_nothing_feasible() {
        let mut p = params();
        p.corridor.half_width_m = 0.1;
        let planner = LocalPlanner::new(p);

        let mut cands: Vec<Candidate> = fan().into_iter().filter(|c| c.at(0.0) != 0.0).collect();

        let report = planner.plan(&mut cands, &centerline(), None, None).unwrap();

        assert_eq!(report.num_feasible, 0);
        assert_eq!(report.selected, None);
        assert!(cands.iter().all(|c| c.rank.is_some()));
        assert_eq!(selector::best(&cands), None);
    }

    #[test]
    fn test_plan_empty_set() {
        let planner: LocalPlanner = LocalPlanner::new(params());
        let res = planner.plan(&mut [], &centerline(), None, None);
        assert!(matches!(res, Err(PlanError::NoCandidates)));
    }
}
