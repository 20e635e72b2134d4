//! Navigation executable entry point.
//!
//! # Architecture
//!
//! The executable runs the navigation core against the simulated world described by
//! `params/sim.toml`:
//!
//!     - Initialise the session, logger and parameters
//!     - Build the world, rover and navigation manager, then start the mission
//!     - Main loop:
//!         - Navigation processing (localisation, avoidance, following, mission)
//!         - Rover simulation under the resulting commands
//!         - Telemetry archiving
//!     - Stop once the route is complete or the duration limit is reached
//!
//! One CSV record is archived per cycle in `arch/nav_tm.csv` and the computed route is saved to
//! `route.json` in the session directory.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{debug, info, warn};
use serde::Serialize;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};
use structopt::StructOpt;

// Internal
use nav_lib::{
    auto::{mission::MissionState, route_opt::Route, NavInput, NavMgrBuilder, NavMgrParams},
    sim::{SimParams, SimRover, StraightLinePaths},
};
use params::NavExecParams;
use util::{
    archive::Archiver,
    host,
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Runs a navigation mission in the simulated world.
#[derive(Debug, StructOpt)]
#[structopt(name = "nav_exec")]
struct Opt {
    /// Limit on the simulated mission time, overriding the executable parameters
    #[structopt(long = "max-duration-s")]
    max_duration_s: Option<f64>,

    /// Log debug messages
    #[structopt(short, long)]
    verbose: bool,
}

/// Route report saved into the session.
#[derive(Debug, Serialize)]
struct RouteReport {
    route: Route,

    /// Target positions in visiting order
    ordered_targets_m: Vec<[f64; 3]>,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    let exec_params: NavExecParams =
        util::params::load("nav_exec.toml").wrap_err("Could not load exec params")?;

    let session = Session::new("nav_exec", &exec_params.sessions_dir)
        .wrap_err("Failed to create the session")?;

    let level = if opt.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    logger_init(level, Some(&session.log_file_path)).wrap_err("Failed to initialise logging")?;

    info!("Navigation Executable\n");
    info!(
        "Software root: {:?}",
        host::get_sw_root().wrap_err("Failed to get the software root")?
    );
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI options: {:?}", opt);

    // ---- LOAD PARAMETERS ----

    let nav_params: NavMgrParams =
        util::params::load("nav_mgr.toml").wrap_err("Could not load navigation params")?;
    let sim_params: SimParams =
        util::params::load("sim.toml").wrap_err("Could not load simulation params")?;

    info!("Parameters loaded");

    // ---- INITIALISE MODULES ----

    let world = Rc::new(sim_params.build_world(
        &nav_params.obst_avoid.obstacle_tag,
        &nav_params.mission.detect_tag,
    ));
    info!("World built with {} spheres", world.spheres().len());

    let mut rover = SimRover::new(sim_params.rover.clone(), sim_params.start_pose());

    let mut nav_mgr = NavMgrBuilder::new(nav_params)
        .landmarks(sim_params.landmarks())
        .path_provider(Rc::new(StraightLinePaths))
        .ray_query(world.clone())
        .initial_pose(sim_params.start_pose())
        .build()
        .wrap_err("Failed to initialise the NavMgr")?;

    if !nav_mgr.is_localiser_enabled() {
        warn!("Running without localisation, the rover will navigate from its start pose");
    }

    let mut arch = Archiver::from_path(&session, "nav_tm.csv")
        .wrap_err("Failed to create the telemetry archive")?;

    info!("Module initialisation complete\n");

    // ---- START MISSION ----

    let dt_s = exec_params.tick_period_s;
    let max_duration_s = opt.max_duration_s.unwrap_or(exec_params.max_duration_s);

    // First cycle establishes the position estimate the route is planned from
    nav_mgr.step(&NavInput {
        raw_pose: rover.pose(),
        speed_ms: rover.speed_ms(),
        dt_s: 0.0,
    });

    let targets = sim_params.targets();
    let route = nav_mgr.start_mission(targets.clone(), sim_params.return_to_start);

    session.save(
        "route.json",
        RouteReport {
            ordered_targets_m: route
                .order
                .iter()
                .map(|&i| {
                    let p = targets[i].position_m;
                    [p[0], p[1], p[2]]
                })
                .collect(),
            route,
        },
    );

    // ---- MAIN LOOP ----

    info!("Beginning main loop\n");

    let mut num_cycles: u64 = 0;
    let mut sim_time_s = 0.0;

    loop {
        let cycle_start_instant = Instant::now();

        // ---- NAVIGATION PROCESSING ----

        let (output, tm) = nav_mgr.step(&NavInput {
            raw_pose: rover.pose(),
            speed_ms: rover.speed_ms(),
            dt_s,
        });

        // ---- SIMULATION ----

        rover.step(
            output.steer_rad,
            output.throttle_nm,
            output.brake_nm,
            dt_s,
            &world,
        );
        sim_time_s += dt_s;

        // ---- WRITE ARCHIVES ----

        if let Err(e) = arch.serialise(&tm) {
            warn!("Could not archive telemetry: {}", e);
        }

        if output.mission_state == MissionState::RouteComplete {
            info!("Route complete after {:.2} s", sim_time_s);
            break;
        }

        if sim_time_s >= max_duration_s {
            warn!(
                "Maximum duration of {:.2} s reached in {}, stopping",
                max_duration_s, output.mission_state
            );
            nav_mgr.stop();
            break;
        }

        // ---- CYCLE MANAGEMENT ----

        if exec_params.realtime {
            let cycle_dur = Instant::now() - cycle_start_instant;

            match Duration::from_secs_f64(dt_s).checked_sub(cycle_dur) {
                Some(d) => thread::sleep(d),
                None => warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - dt_s
                ),
            }
        }

        num_cycles += 1;
    }

    // ---- SHUTDOWN ----

    let pose = nav_mgr.get_estimated_pose();
    info!(
        "{} cycles run, {} targets handled, {} collisions",
        num_cycles,
        nav_mgr.num_targets_handled(),
        rover.num_collisions()
    );
    info!(
        "Final estimated position {:?}, true position {:?}",
        pose.position_m.as_slice(),
        rover.pose().position_m.as_slice()
    );

    session.exit();

    info!("End of execution");

    Ok(())
}
