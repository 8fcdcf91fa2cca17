//! Main local planner executable entry point.
//!
//! # Usage
//!
//! ```text
//! plan_exec <scenario.json>
//! ```
//!
//! # Architecture
//!
//! The executable runs a scenario offline:
//!
//!     - Initialise the session, logging and modules
//!     - Load the scenario and build the candidate set and maps
//!     - Run one local planning cycle and archive the report
//!     - Track the selected trajectory in closed loop against a first order lateral model,
//!       archiving every tick
//!     - Render the planning situation into the session directory

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Result,
};
use log::{debug, info, warn};
use serde::Serialize;
use std::env;

// Internal
use plan_lib::{
    plan::{LocalPlanner, PlanReport},
    plotter::{Plotter, PlotterParams},
    scenario::Scenario,
    traj_ctrl::{TrackCmd, TrackInput, TrajCtrl, TrajCtrlMode},
};
use util::{
    archive::Archiver,
    logger::{logger_init, LevelFilter},
    session::{self, Session},
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Size of the rendered plot in pixels.
const PLOT_SIZE_PX: (u32, u32) = (1200, 600);

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// One tick of the tracking run, as archived.
#[derive(Serialize)]
struct TrackRecord {
    time_s: f64,
    s_m: f64,
    rho_m: f64,
    mode: TrajCtrlMode,
    setpoint_rho_m: f64,
    lat_error_m: f64,
    steer_dem: f64,
    steer_dem_limited: bool,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<()> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("plan_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    info!("Local Planner Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD SCENARIO ----

    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    if args.len() != 2 {
        return Err(eyre!(
            "Expected path to a scenario as only argument, found {} arguments",
            args.len().saturating_sub(1)
        ));
    }

    info!("Loading scenario from \"{}\"", &args[1]);
    let scenario = Scenario::load(&args[1]).wrap_err("Failed to load scenario")?;
    info!(
        "Loaded scenario with {} candidates along a {:.2} m centerline\n",
        scenario.candidates.len(),
        scenario.centerline.length_m()
    );

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let planner: LocalPlanner =
        LocalPlanner::init("local_plan.toml").wrap_err("Failed to initialise LocalPlanner")?;
    info!("LocalPlanner init complete");

    let mut traj_ctrl = TrajCtrl::init("traj_ctrl.toml").wrap_err("Failed to initialise TrajCtrl")?;
    info!("TrajCtrl init complete");

    let plotter_params: PlotterParams =
        util::params::load("plotter.toml").wrap_err("Could not load plotter params")?;

    info!("Module initialisation complete\n");

    // ---- PLANNING ----

    let mut candidates = scenario.candidates();
    let occupancy = scenario
        .occupancy_grid()
        .wrap_err("Failed to build the occupancy grid")?;
    let segmentation = scenario
        .segmentation_map()
        .wrap_err("Failed to build the segmentation map")?;

    let report = planner
        .plan(
            &mut candidates,
            &scenario.centerline,
            occupancy.as_ref(),
            segmentation.as_ref(),
        )
        .wrap_err("Planning failed")?;

    log_report(&report);
    session.save("plan_report.json", report.clone());

    // ---- TRACKING ----

    traj_ctrl.select_reference(&candidates);

    let mut archiver =
        Archiver::from_path(&session, "traj_ctrl.csv").wrap_err("Failed to create archive")?;
    let mut state = scenario.initial_input();

    info!("Begining tracking run of {} ticks\n", scenario.num_ticks);

    for tick in 0..scenario.num_ticks {
        let (cmd, status) = traj_ctrl
            .proc(&state, scenario.dt_s)
            .wrap_err("Error during TrajCtrl processing")?;

        let steer_dem = match cmd {
            Some(TrackCmd::Steer { steer_dem }) => steer_dem,
            _ => 0.0,
        };

        archiver
            .serialise(&TrackRecord {
                time_s: tick as f64 * scenario.dt_s,
                s_m: state.s_m,
                rho_m: state.rho_m,
                mode: traj_ctrl.mode(),
                setpoint_rho_m: status.setpoint_rho_m,
                lat_error_m: status.lat_error_m,
                steer_dem,
                steer_dem_limited: status.steer_dem_limited,
            })
            .wrap_err("Failed to archive tracking data")?;

        match cmd {
            Some(TrackCmd::Steer { steer_dem }) => {
                state = TrackInput {
                    s_m: state.s_m + scenario.speed_m_s * scenario.dt_s,
                    rho_m: state.rho_m + steer_dem * scenario.dt_s,
                };
            }
            Some(TrackCmd::Stop) | None => {
                warn!("Vehicle stopped after {} ticks", tick);
                break;
            }
        }
    }

    info!(
        "Tracking run ended at s = {:.2} m, rho = {:.3} m",
        state.s_m, state.rho_m
    );

    // ---- PLOT ----

    let mut plotter = Plotter::new(plotter_params);
    plotter.set_path(&scenario.centerline);
    plotter.add_curves(candidates);
    plotter.add_waypoints(scenario.waypoints.clone());
    if let Some(map) = occupancy {
        plotter.add_map(map);
    }

    let plot_path = session.session_root.join("plan.png");
    plotter
        .save(&plot_path, PLOT_SIZE_PX.0, PLOT_SIZE_PX.1)
        .wrap_err("Failed to save the plot")?;
    info!("Plot saved to {:?}", plot_path);

    // ---- SHUTDOWN ----

    info!(
        "End of execution after {:.2} s",
        session::get_elapsed_seconds()
    );
    session.exit();

    Ok(())
}

fn log_report(report: &PlanReport) {
    match report.selected {
        Some(i) => {
            let c = &report.candidates[i];
            info!(
                "Selected candidate {} of {} ({} feasible), cost {:.3}",
                i, report.num_candidates, report.num_feasible, c.cost
            );
        }
        None => warn!(
            "No feasible trajectory among {} candidates, the vehicle will hold",
            report.num_candidates
        ),
    }
}
