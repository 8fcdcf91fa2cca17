//! # Planning and tracking cycle test
//!
//! Runs the obstacle scenario shipped with the repository through the planner and trajectory
//! control with the shipped parameters, as the executable does.

use std::path::PathBuf;

use plan_lib::{
    plan::{self, LocalPlanner},
    scenario::Scenario,
    traj_ctrl::{self, TrackCmd, TrackInput, TrajCtrl, TrajCtrlMode},
};

fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("..")
}

fn load_scenario() -> Scenario {
    Scenario::load(repo_root().join("scenarios/obstacle_ahead.json")).unwrap()
}

fn planner() -> LocalPlanner {
    let params: plan::Params =
        util::params::load_from(repo_root().join("params/local_plan.toml")).unwrap();
    LocalPlanner::new(params)
}

fn traj_ctrl() -> TrajCtrl {
    let params: traj_ctrl::Params =
        util::params::load_from(repo_root().join("params/traj_ctrl.toml")).unwrap();
    TrajCtrl::new(params).unwrap()
}

#[test]
fn test_plan_avoids_obstacle() {
    let scenario = load_scenario();
    let mut candidates = scenario.candidates();
    let occupancy = scenario.occupancy_grid().unwrap();
    let segmentation = scenario.segmentation_map().unwrap();

    let report = planner()
        .plan(
            &mut candidates,
            &scenario.centerline,
            occupancy.as_ref(),
            segmentation.as_ref(),
        )
        .unwrap();

    // Straight ahead runs into the obstacle, the widest swerve leaves the corridor
    assert!(candidates[0].hits_obstacle);
    assert!(candidates[5].out_of_bounds);

    let selected = report.selected.unwrap();
    assert!(candidates[selected].is_feasible());
    assert_eq!(candidates[selected].rank, Some(0));
    assert_eq!(report.num_candidates, 6);
    assert_eq!(
        report.num_feasible,
        candidates.iter().filter(|c| c.is_feasible()).count()
    );

    // Ranks are a permutation with every feasible candidate ahead of every infeasible one
    let mut ranks: Vec<usize> = candidates.iter().map(|c| c.rank.unwrap()).collect();
    ranks.sort_unstable();
    assert_eq!(ranks, (0..6).collect::<Vec<_>>());

    for c in candidates.iter().filter(|c| !c.is_feasible()) {
        assert!(c.rank.unwrap() >= report.num_feasible);
    }
}

#[test]
fn test_track_selected_trajectory() {
    let scenario = load_scenario();
    let mut candidates = scenario.candidates();
    let occupancy = scenario.occupancy_grid().unwrap();

    planner()
        .plan(&mut candidates, &scenario.centerline, occupancy.as_ref(), None)
        .unwrap();

    let mut tc = traj_ctrl();
    tc.select_reference(&candidates);
    assert_eq!(tc.mode(), TrajCtrlMode::Tracking);

    let mut state = scenario.initial_input();
    let mut stop_report = None;

    for _ in 0..1000 {
        let (cmd, report) = tc.proc(&state, scenario.dt_s).unwrap();
        assert!(!report.lat_error_limit_exceeded);

        match cmd {
            Some(TrackCmd::Steer { steer_dem }) => {
                state = TrackInput {
                    s_m: state.s_m + scenario.speed_m_s * scenario.dt_s,
                    rho_m: state.rho_m + steer_dem * scenario.dt_s,
                };
            }
            _ => {
                stop_report = Some(report);
                break;
            }
        }
    }

    // The vehicle drives to the end of the selected trajectory and holds there
    let report = stop_report.unwrap();
    assert!(report.horizon_reached);
    assert_eq!(tc.mode(), TrajCtrlMode::Hold);
    assert!(state.s_m > 9.9);
}

#[test]
fn test_no_feasible_trajectory_holds() {
    let scenario = load_scenario();

    // Only keep the candidate which runs straight into the obstacle
    let mut candidates = vec![scenario.candidates().remove(0)];
    let occupancy = scenario.occupancy_grid().unwrap();

    let report = planner()
        .plan(&mut candidates, &scenario.centerline, occupancy.as_ref(), None)
        .unwrap();
    assert_eq!(report.selected, None);
    assert_eq!(candidates[0].rank, Some(0));

    let mut tc = traj_ctrl();
    tc.select_reference(&candidates);
    assert_eq!(tc.mode(), TrajCtrlMode::Hold);

    let (cmd, _) = tc.proc(&scenario.initial_input(), scenario.dt_s).unwrap();
    assert_eq!(cmd, Some(TrackCmd::Stop));
}
