//! Fixed-wing executable entry point.
//!
//! # Architecture
//!
//! The executable replays recorded inputs through horizontal control:
//!
//!     - Initialise the session and the logger
//!     - Load the replay and initialise horizontal control
//!     - Main loop, once per replay record, paced by `--cycle-frequency-hz`
//!       (the records' `time_s` column is only logged, not used for pacing):
//!         - Horizontal control processing
//!         - Archive writing
//!         - Cycle management
//!     - Save a summary of the run into the session directory
//!
//! # Modules
//!
//! All modules (e.g. `h_ctl`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State` trait.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::{eyre, WrapErr}, Report};
use log::{info, warn};
use serde::Serialize;
use std::path::PathBuf;
use std::thread;
use std::time::Instant;
use structopt::StructOpt;

// Internal
use fw_lib::{h_ctl::HCtl, replay::Replay};
use util::{
    archive::Archived,
    logger::{logger_init, LevelFilter},
    module::State,
    session::{self, Session},
    time
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Command line options.
#[derive(Debug, StructOpt)]
#[structopt(name = "fw_exec", about = "Replay recorded inputs through horizontal control")]
struct Opt {
    /// Path to the CSV replay file
    #[structopt(parse(from_os_str))]
    replay: PathBuf,

    /// Horizontal control parameter file, relative to $FW_SW_ROOT/params
    #[structopt(short, long, default_value = "h_ctl.toml", parse(from_os_str))]
    params: PathBuf,

    /// Control cycle frequency
    #[structopt(short, long, default_value = "60")]
    cycle_frequency_hz: f64,

    /// Run every cycle immediately after the previous one
    #[structopt(long)]
    no_wait: bool
}

/// Summary of the run, saved into the session directory.
#[derive(Debug, Default, Serialize)]
struct RunSummary {
    num_cycles: u64,
    num_cycle_overruns: u64,
    num_archive_errors: u64,
    num_roll_setpoint_limited: u64,
    num_aileron_limited: u64,
    num_elevator_limited: u64,
    elapsed_s: f64
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {

    // ---- EARLY INITIALISATION ----

    color_eyre::install()?;

    let opt = Opt::from_args();

    // Initialise session
    let session = Session::new(
        "fw_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Fixed-Wing Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // A zero, negative or NaN frequency gives no valid period
    let cycle_period = match time::seconds_to_std_duration(1.0 / opt.cycle_frequency_hz) {
        Some(p) => p,
        _ => return Err(eyre!(
            "Expected a positive cycle frequency, found {}", opt.cycle_frequency_hz
        ))
    };

    // ---- LOAD REPLAY ----

    info!("Loading replay from {:?}", opt.replay);

    let replay = Replay::from_path(&opt.replay)
        .wrap_err("Failed to load the replay")?;

    info!(
        "Loaded replay lasts {:.02} s and contains {} records\n",
        replay.duration_s(),
        replay.len()
    );

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut h_ctl = HCtl::default();
    h_ctl.init(opt.params.clone(), &session)
        .wrap_err("Failed to initialise HCtl")?;
    info!("HCtl init complete");

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    let mut summary = RunSummary::default();

    for input in replay.inputs() {

        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // ---- CONTROL ALGORITHM PROCESSING ----

        let report = match h_ctl.proc(&input) {
            Ok((_, r)) => r,
            Err(e) => match e {}
        };

        if report.roll_setpoint_limited {
            summary.num_roll_setpoint_limited += 1;
        }
        if report.aileron_limited {
            summary.num_aileron_limited += 1;
        }
        if report.elevator_limited {
            summary.num_elevator_limited += 1;
        }

        // ---- WRITE ARCHIVES ----

        if let Err(e) = h_ctl.write() {
            warn!("Could not write HCtl archives: {}", e);
            summary.num_archive_errors += 1;
        }

        summary.num_cycles += 1;

        // ---- CYCLE MANAGEMENT ----

        if opt.no_wait {
            continue;
        }

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match cycle_period.checked_sub(cycle_dur) {
            Some(d) => thread::sleep(d),
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - cycle_period.as_secs_f64()
                );
                summary.num_cycle_overruns += 1;
            }
        }
    }

    // ---- SHUTDOWN ----

    summary.elapsed_s = session::get_elapsed_seconds();

    info!(
        "Ran {} cycles ({} overruns, {} archive errors)",
        summary.num_cycles,
        summary.num_cycle_overruns,
        summary.num_archive_errors
    );

    session.save("summary.json", summary);
    session.exit();

    info!("End of execution");

    Ok(())
}
