//! Local planner parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// Internal
use super::eval::{CorridorEval, CostWeights, ObstacleEval};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the local planner
#[derive(Deserialize, Debug, Clone)]
pub struct Params {

    /// Spacing between the arc length samples taken along each candidate.
    pub sample_step_m: f64,

    /// Drivable corridor around the centerline
    pub corridor: CorridorEval,

    /// Obstacle clearance
    pub obstacle: ObstacleEval,

    /// Weights used to combine the component costs into the aggregate cost.
    #[serde(default)]
    pub weights: CostWeights,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_params_from_toml() {
        let params: Params = util::params::from_str(
            r#"
            sample_step_m = 0.5

            [corridor]
            half_width_m = 3.0
            target_rho_m = 0.0

            [obstacle]
            vehicle_half_width_m = 1.1
            safety_distance_m = 4.0
            occupied_threshold = 50

            [weights]
            rho = 2.0
            "#,
        )
        .unwrap();

        assert_eq!(params.sample_step_m, 0.5);
        assert_eq!(params.corridor.half_width_m, 3.0);
        assert_eq!(params.obstacle.occupied_threshold, 50);
        assert_eq!(params.weights.rho, 2.0);

        // Unspecified weights keep their defaults
        assert_eq!(params.weights.comfort, 1.0);
        assert_eq!(params.weights.dynamic_safety, 0.0);
    }
}
