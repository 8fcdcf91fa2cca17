//! # Scenario
//!
//! A scenario describes an offline planning and tracking run: the centerline, the candidate set
//! proposed by trajectory generation, the perception maps and the initial state of the vehicle.
//! Scenarios are stored as JSON, for example:
//!
//! ```json
//! {
//!     "centerline": [[0.0, 0.0], [30.0, 0.0]],
//!     "candidates": [
//!         { "coeffs": [0.0], "s0": 0.0, "max_length": 20.0 },
//!         { "coeffs": [0.001, -0.03, 0.0], "s0": 0.0, "max_length": 20.0 }
//!     ],
//!     "occupancy": {
//!         "cell_size_m": 0.25,
//!         "num_cells": [140, 40],
//!         "origin_m": [-2.0, -5.0],
//!         "obstacles": [{ "centre_m": [10.0, 0.0], "radius_m": 0.8 }]
//!     },
//!     "initial": { "s_m": 0.0, "rho_m": 0.0 },
//!     "speed_m_s": 1.0,
//!     "num_ticks": 150,
//!     "dt_s": 0.1
//! }
//! ```

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector2;
use serde::Deserialize;
use std::{fs, path::Path};

// Internal
use crate::{
    curve::Polynomial,
    map::{GridMap, GridMapError, OccupancyGrid, SegmentationMap, OCCUPANCY_FREE},
    plan::{Candidate, Centerline, DEFAULT_MAX_LENGTH_M},
    traj_ctrl::TrackInput,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub centerline: Centerline,

    /// Waypoints of the global route, only used for plotting
    #[serde(default)]
    pub waypoints: Vec<Vector2<f64>>,

    pub candidates: Vec<CandidateSpec>,

    #[serde(default)]
    pub occupancy: Option<OccupancySpec>,

    #[serde(default)]
    pub segmentation: Option<SegmentationSpec>,

    /// Position of the vehicle at the start of the run
    #[serde(default)]
    pub initial: InitialState,

    /// Forward speed along the centerline
    pub speed_m_s: f64,

    /// Number of control ticks to simulate
    pub num_ticks: usize,

    /// Duration of one tick
    pub dt_s: f64,
}

/// A candidate proposed by trajectory generation.
#[derive(Debug, Clone, Deserialize)]
pub struct CandidateSpec {
    /// Polynomial coefficients of the lateral offset, highest power first
    pub coeffs: Vec<f64>,

    #[serde(default)]
    pub s0: f64,

    #[serde(default = "default_max_length")]
    pub max_length: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OccupancySpec {
    pub cell_size_m: f64,
    pub num_cells: (usize, usize),
    pub origin_m: Vector2<f64>,

    /// Value of every cell before obstacles are added
    #[serde(default = "default_occupancy")]
    pub fill: i8,

    #[serde(default)]
    pub obstacles: Vec<Disc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SegmentationSpec {
    pub cell_size_m: f64,
    pub num_cells: (usize, usize),
    pub origin_m: Vector2<f64>,

    /// Cost of every cell outside of the regions
    #[serde(default)]
    pub default_cost: f64,

    #[serde(default)]
    pub regions: Vec<CostRegion>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Disc {
    pub centre_m: Vector2<f64>,
    pub radius_m: f64,
}

/// A disc of terrain with a given traversal cost.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CostRegion {
    #[serde(flatten)]
    pub disc: Disc,
    pub cost: f64,
}

#[derive(Debug, Default, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct InitialState {
    pub s_m: f64,
    pub rho_m: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("Could not read the scenario: {0}")]
    LoadError(std::io::Error),

    #[error("Could not parse the scenario: {0}")]
    ParseError(serde_json::Error),

    #[error("The scenario contains no candidates")]
    NoCandidates,

    #[error("The time step must be positive, got {0}")]
    InvalidTimeStep(f64),

    #[error("Candidate {0} has a horizon of {1} m, it must be positive and finite")]
    InvalidHorizon(usize, f64),

    #[error("Invalid map: {0}")]
    MapError(GridMapError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Scenario {
    /// Load a scenario from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let json = fs::read_to_string(path).map_err(ScenarioError::LoadError)?;

        Self::from_json(&json)
    }

    /// Parse a scenario from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ScenarioError> {
        let scenario: Self = serde_json::from_str(json).map_err(ScenarioError::ParseError)?;

        if scenario.candidates.is_empty() {
            return Err(ScenarioError::NoCandidates);
        }

        if !(scenario.dt_s > 0.0) {
            return Err(ScenarioError::InvalidTimeStep(scenario.dt_s));
        }

        for (i, spec) in scenario.candidates.iter().enumerate() {
            if !(spec.max_length > 0.0 && spec.max_length.is_finite()) {
                return Err(ScenarioError::InvalidHorizon(i, spec.max_length));
            }
        }

        Ok(scenario)
    }

    /// Build the candidate set, unevaluated and unranked.
    pub fn candidates(&self) -> Vec<Candidate> {
        self.candidates
            .iter()
            .map(|spec| {
                let mut c = Candidate::new(Polynomial::new(spec.coeffs.clone()));
                c.s0 = spec.s0;
                c.max_length = spec.max_length;
                c
            })
            .collect()
    }

    /// Build the occupancy grid, if the scenario has one.
    pub fn occupancy_grid(&self) -> Result<Option<OccupancyGrid>, ScenarioError> {
        let spec = match self.occupancy {
            Some(ref s) => s,
            None => return Ok(None),
        };

        let mut grid = GridMap::new(spec.cell_size_m, spec.num_cells, spec.origin_m, spec.fill)
            .map_err(ScenarioError::MapError)?;

        for obs in &spec.obstacles {
            grid.add_disc_obstacle(&obs.centre_m, obs.radius_m);
        }

        Ok(Some(grid))
    }

    /// Build the segmentation map, if the scenario has one. Later regions overwrite earlier ones.
    pub fn segmentation_map(&self) -> Result<Option<SegmentationMap>, ScenarioError> {
        let spec = match self.segmentation {
            Some(ref s) => s,
            None => return Ok(None),
        };

        let mut map = GridMap::new(
            spec.cell_size_m,
            spec.num_cells,
            spec.origin_m,
            spec.default_cost,
        )
        .map_err(ScenarioError::MapError)?;

        for region in &spec.regions {
            let Disc { centre_m, radius_m } = region.disc;
            map.fill_where(region.cost, |p| (p - centre_m).norm() <= radius_m);
        }

        Ok(Some(map))
    }

    pub fn initial_input(&self) -> TrackInput {
        TrackInput {
            s_m: self.initial.s_m,
            rho_m: self.initial.rho_m,
        }
    }
}

fn default_max_length() -> f64 {
    DEFAULT_MAX_LENGTH_M
}

fn default_occupancy() -> i8 {
    OCCUPANCY_FREE
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::map::{OCCUPANCY_OCCUPIED, OCCUPANCY_UNKNOWN};

    const SCENARIO: &str = r#"{
        "centerline": [[0.0, 0.0], [20.0, 0.0]],
        "waypoints": [[20.0, 0.0]],
        "candidates": [
            { "coeffs": [0.5] },
            { "coeffs": [0.01, 0.0, -0.5], "s0": 1.0, "max_length": 12.0 }
        ],
        "occupancy": {
            "cell_size_m": 0.5,
            "num_cells": [40, 20],
            "origin_m": [0.0, -5.0],
            "fill": -1,
            "obstacles": [{ "centre_m": [10.0, 0.0], "radius_m": 1.0 }]
        },
        "segmentation": {
            "cell_size_m": 1.0,
            "num_cells": [20, 10],
            "origin_m": [0.0, -5.0],
            "default_cost": 0.1,
            "regions": [{ "centre_m": [5.0, 2.0], "radius_m": 1.5, "cost": 0.9 }]
        },
        "initial": { "rho_m": 0.25 },
        "speed_m_s": 1.0,
        "num_ticks": 50,
        "dt_s": 0.1
    }"#;

    #[test]
    fn test_scenario_from_json() {
        let scenario = Scenario::from_json(SCENARIO).unwrap();

        assert_eq!(scenario.centerline.length_m(), 20.0);
        assert_eq!(scenario.waypoints, vec![Vector2::new(20.0, 0.0)]);

        let candidates = scenario.candidates();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].max_length, DEFAULT_MAX_LENGTH_M);
        assert_eq!(candidates[0].at(3.0), 0.5);
        assert_eq!(candidates[1].s0, 1.0);
        assert_eq!(candidates[1].at(10.0), 0.5);
        assert!(candidates.iter().all(|c| c.rank.is_none()));

        let input = scenario.initial_input();
        assert_eq!(input.s_m, 0.0);
        assert_eq!(input.rho_m, 0.25);
    }

    #[test]
    fn test_scenario_maps() {
        let scenario = Scenario::from_json(SCENARIO).unwrap();

        let grid = scenario.occupancy_grid().unwrap().unwrap();
        assert_eq!(grid.get_position(&Vector2::new(10.1, 0.1)), Some(&OCCUPANCY_OCCUPIED));
        assert_eq!(grid.get_position(&Vector2::new(2.0, 2.0)), Some(&OCCUPANCY_UNKNOWN));

        let seg = scenario.segmentation_map().unwrap().unwrap();
        assert_eq!(seg.get_position(&Vector2::new(5.2, 2.2)), Some(&0.9));
        assert_eq!(seg.get_position(&Vector2::new(15.0, 0.0)), Some(&0.1));
    }

    #[test]
    fn test_invalid_scenarios() {
        let no_candidates = SCENARIO.replace(
            r#"{ "coeffs": [0.5] },
            { "coeffs": [0.01, 0.0, -0.5], "s0": 1.0, "max_length": 12.0 }"#,
            "",
        );
        assert!(matches!(
            Scenario::from_json(&no_candidates),
            Err(ScenarioError::NoCandidates)
        ));

        let bad_dt = SCENARIO.replace(r#""dt_s": 0.1"#, r#""dt_s": 0.0"#);
        assert!(matches!(
            Scenario::from_json(&bad_dt),
            Err(ScenarioError::InvalidTimeStep(_))
        ));

        let zero_horizon = SCENARIO.replace(r#""max_length": 12.0"#, r#""max_length": 0.0"#);
        assert!(matches!(
            Scenario::from_json(&zero_horizon),
            Err(ScenarioError::InvalidHorizon(1, _))
        ));

        let neg_horizon = SCENARIO.replace(r#""max_length": 12.0"#, r#""max_length": -1.0"#);
        assert!(matches!(
            Scenario::from_json(&neg_horizon),
            Err(ScenarioError::InvalidHorizon(1, _))
        ));

        let short_line = SCENARIO.replace("[[0.0, 0.0], [20.0, 0.0]]", "[[0.0, 0.0]]");
        assert!(matches!(
            Scenario::from_json(&short_line),
            Err(ScenarioError::ParseError(_))
        ));
    }
}
