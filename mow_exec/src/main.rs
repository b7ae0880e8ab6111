//! Main mower executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop:
//!         - Equipment step (the simulated mower advances to the current time)
//!         - Telecommand processing and handling
//!         - Control cycle:
//!             - Range, inertial, battery and perimeter sensing, each on its own cadence
//!             - Mission state machine
//!             - Telemetry snapshot
//!         - Telemetry archiving
//!
//! # Usage
//!
//! With a single argument the executable replays the telecommand script at that path and
//! exits at its end. With no arguments it starts mowing straight away (if `autostart` is
//! set) and runs for `max_session_s`.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod tc_processor;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::{eyre, WrapErr}, Report};
use log::{debug, info, warn};
use std::env;
use std::thread;
use std::time::{Duration, Instant};

// Internal
use mow_lib::{
    data_store::DataStore, params::MowExecParams, sim::SimMower, CYCLE_PERIOD_S,
};
use util::{
    archive::Archiver,
    logger::{logger_init, parse_level},
    script_interpreter::{PendingTcs, ScriptInterpreter},
    session::{self, Session},
};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    let session = Session::new("mow_exec", "sessions")
        .wrap_err("Failed to create the session")?;

    let exec_params: MowExecParams = util::params::load("mow_exec.toml")
        .wrap_err("Could not load the exec params")?;

    logger_init(
        parse_level(&exec_params.log_level).wrap_err("Invalid log level")?,
        &session,
    )
    .wrap_err("Failed to initialise logging")?;

    info!("Mower Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    session::save("mow_exec_params.json", exec_params.clone());

    // ---- INITIALISE TC SOURCE ----

    let args: Vec<String> = env::args().collect();
    debug!("CLI arguments: {:?}", args);

    let mut tc_source = match args.len() {
        2 => {
            info!("Loading script from \"{}\"", &args[1]);

            let si = ScriptInterpreter::new(&args[1]).wrap_err("Failed to load script")?;

            info!(
                "Loaded script {:?} lasts {:.02} s and contains {} TCs\n",
                si.script_path(),
                si.get_duration(),
                si.get_num_tcs()
            );

            TcSource::Script(si)
        }
        1 => {
            info!(
                "No script provided, running for up to {:.0} s\n",
                exec_params.max_session_s
            );
            TcSource::Autostart
        }
        n => return Err(eyre!("Expected either zero or one argument, found {}", n - 1)),
    };

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut ds = DataStore::init(&exec_params, session::get_elapsed_seconds())
        .wrap_err("Failed to initialise the data store")?;

    let mut sim = SimMower::init("sim.toml").wrap_err("Failed to initialise the simulation")?;
    info!("Simulated mower initialised at {:?}", sim.position_m().as_slice());

    let mut tm_arch = Archiver::from_path(&session, "mower_tm.csv")
        .wrap_err("Failed to create the telemetry archive")?;

    info!("Module initialisation complete\n");

    if let TcSource::Autostart = tc_source {
        if exec_params.autostart {
            ds.mission.start_mowing(&mut ds.planner, session::get_elapsed_seconds());
        }
    }

    // ---- MAIN LOOP ----

    info!("Beginning main loop\n");

    loop {
        let cycle_start_instant = Instant::now();
        let now_s = session::get_elapsed_seconds();

        // ---- EQUIPMENT ----

        sim.step(now_s - sim.time_s());

        // ---- TELECOMMAND PROCESSING ----

        match tc_source {
            TcSource::Script(ref mut si) => match si.get_pending_tcs(now_s) {
                PendingTcs::None => (),
                PendingTcs::Some(tcs) => {
                    for tc in tcs.iter() {
                        tc_processor::exec(&mut ds, &mut sim, tc, now_s);
                    }
                }
                PendingTcs::EndOfScript => {
                    info!("End of TC script reached, stopping");
                    break;
                }
            },
            TcSource::Autostart => {
                if now_s > exec_params.max_session_s {
                    info!("Maximum session length reached, stopping");
                    break;
                }
            }
        }

        // ---- CONTROL CYCLE ----

        ds.cycle(&mut sim, now_s);

        // ---- TELEMETRY ----

        if ds.tm_fresh {
            if let Some(ref tm) = ds.tm {
                if let Err(e) = tm_arch.serialise(tm) {
                    warn!("Could not archive telemetry: {}", e);
                }
            }
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        match Duration::from_secs_f64(CYCLE_PERIOD_S).checked_sub(cycle_dur) {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            }
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - CYCLE_PERIOD_S
                );
                ds.num_consec_cycle_overruns += 1;
            }
        }
    }

    // ---- SHUTDOWN ----

    ds.motion_ctrl.stop(&mut sim);

    info!(
        "Archived {} telemetry records over {} cycles",
        tm_arch.num_records(),
        ds.num_cycles
    );

    let final_tm = ds.snapshot(&sim, session::get_elapsed_seconds());
    session.save("final_tm.json", final_tm);

    info!("End of execution");

    session.exit();

    Ok(())
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Various sources for the telecommands incoming to the exec.
enum TcSource {
    /// No commands, mow until the session length runs out
    Autostart,

    Script(ScriptInterpreter),
}
