//! Main tracking executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop:
//!         - Vision input acquisition
//!         - Tracking control processing
//!         - Drive demand output
//!         - Archiving and telemetry
//!
//! # Usage
//!
//! ```text
//! track_exec [TARGET]
//! ```
//!
//! where the optional `TARGET` is the name of the target kind to track on startup, for example
//! `coral_station`. If it is not given the `initial_target` from `track_ctrl.toml` is used.
//!
//! # Modules
//!
//! All modules (e.g. `track_ctrl`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State` trait.

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use comms_if::{eqpt::drive::DriveDemsResponse, net::NetParams};
use track_lib::{
    data_store::{DataStore, SafeModeCause},
    drive_client::{DriveClient, DriveClientError},
    tm_server::TmServer,
    track_ctrl::{TargetKind, VisionSource},
    vision_client::VisionClient,
};

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::{eyre, WrapErr}, Report};
use log::{debug, error, info, warn};
use std::env;
use std::thread;
use std::time::{Duration, Instant};

// Internal
use util::{
    archive::Archived,
    host,
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target period of one cycle.
const CYCLE_PERIOD_S: f64 = 0.02;

/// Number of cycles per second
const CYCLE_FREQUENCY_HZ: f64 = 1.0 / CYCLE_PERIOD_S;

/// Limit of the number of times recieve errors from the drive server can be created
/// consecutively before safe mode will be engaged.
const MAX_DRIVE_RECV_ERROR_LIMIT: u64 = 5;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {

    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "track_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Target Tracking Executable\n");
    info!("Running on: {}", host::get_host_info());
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let net_params: NetParams = util::params::load(
        "net.toml"
    ).wrap_err("Could not load net params")?;

    info!("Exec parameters loaded");

    // ---- PARSE ARGUMENTS ----

    // Collect all arguments
    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    // If we have a single argument use it as the initial target
    let initial_target: Option<TargetKind> = match args.len() {
        1 => None,
        2 => Some(
            args[1].parse::<TargetKind>()
                .wrap_err_with(|| format!("Invalid initial target \"{}\"", args[1]))?
        ),
        n => return Err(eyre!(
            "Expected either zero or one argument, found {}", n - 1
        ))
    };

    // ---- INITIALISE DATASTORE ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    // ---- INITIALISE MODULES ----

    ds.track_ctrl.init("track_ctrl.toml", &session)
        .wrap_err("Failed to initialise TrackCtrl")?;

    if let Some(kind) = initial_target {
        ds.track_ctrl.select_target_kind(kind)
            .wrap_err("Failed to select the initial target")?;
    }

    session.save("track_ctrl_params.json", ds.track_ctrl.params().clone());

    info!(
        "TrackCtrl init complete, camera \"{}\" tracking {:?} (id {})",
        ds.track_ctrl.name(),
        ds.track_ctrl.active_target().kind,
        ds.track_ctrl.active_target().fiducial_id
    );

    info!("Module initialisation complete\n");

    // ---- INITIALISE NETWORK ----

    info!("Initialising network");

    let zmq_ctx = comms_if::net::zmq::Context::new();

    let mut vision_client = {
        let c = VisionClient::new(&zmq_ctx, &net_params)
            .wrap_err("Failed to initialise VisionClient")?;
        info!("VisionClient initialised");
        c
    };

    let mut drive_client = {
        let c = DriveClient::new(&zmq_ctx, &net_params)
            .wrap_err("Failed to initialise DriveClient")?;
        info!("DriveClient initialised");
        c
    };

    let mut tm_server = {
        let s = TmServer::new(&zmq_ctx, &net_params)
            .wrap_err("Failed to initialise TmServer")?;
        info!("TmServer initialised");
        s
    };

    info!("Network initialisation complete");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    loop {

        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start(CYCLE_FREQUENCY_HZ);

        // ---- DATA INPUT ----

        // Without vision the robot must not be driven
        if vision_client.is_connected() {
            ds.make_unsafe(SafeModeCause::VisionClientNotConnected).ok();
        }
        else {
            if !ds.safe {
                error!("Connection to the vision equipment lost");
            }
            ds.make_safe(SafeModeCause::VisionClientNotConnected);
        }

        ds.track_ctrl_input.batch = vision_client.read_latest_batch();

        // ---- CONTROL ALGORITHM PROCESSING ----

        match ds.track_ctrl.proc(&ds.track_ctrl_input) {
            Ok((o, r)) => {
                ds.track_ctrl_output = o;
                ds.track_ctrl_status_rpt = r;
            },
            Err(e) => warn!("Error during TrackCtrl processing: {}", e)
        };

        ds.set_drive_dems();

        if ds.is_1_hz_cycle {
            debug!(
                "Tracking {:?}: visible {}, range {:.3} m, bearing {:.4} rad, safe {}",
                ds.track_ctrl.active_target().kind,
                ds.track_ctrl.is_target_visible(),
                ds.track_ctrl.smoothed_range_m(),
                ds.track_ctrl.bearing_rad(),
                ds.safe
            );
        }

        // Send demands to the drivetrain
        match drive_client.send_demands(&ds.drive_dems) {
            Ok(DriveDemsResponse::DemsOk) => {
                ds.make_unsafe(SafeModeCause::DriveClientNotConnected).ok();

                // Reset the recieve error counter
                ds.num_consec_drive_recv_errors = 0;
            },
            Ok(r) => warn!(
                "Recieved non-nominal response from the drive server: {:?}",
                r
            ),
            Err(DriveClientError::NotConnected) => {
                if !ds.safe {
                    error!("Connection to the drive server lost");
                }
                ds.make_safe(SafeModeCause::DriveClientNotConnected);
            }
            Err(DriveClientError::RecvError(_)) => {
                ds.num_consec_drive_recv_errors += 1;

                // If over the limit print error and enter safe mode
                if ds.num_consec_drive_recv_errors > MAX_DRIVE_RECV_ERROR_LIMIT {
                    if !ds.safe {
                        error!(
                            "Maximum number of DriveClient recieve errors ({}) has been exceeded",
                            MAX_DRIVE_RECV_ERROR_LIMIT
                        );
                    }
                    ds.make_safe(SafeModeCause::DriveClientNotConnected);
                }
            },
            Err(e) => warn!("DriveClient processing error: {}", e)
        }

        // ---- WRITE ARCHIVES ----

        if let Err(e) = ds.track_ctrl.write() {
            warn!("Could not write TrackCtrl archives: {}", e);
        }

        // ---- TELEMETRY ----

        if let Err(e) = tm_server.send(&ds) {
            warn!("TmServer error: {}", e);
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match Duration::from_secs_f64(CYCLE_PERIOD_S)
            .checked_sub(cycle_dur)
        {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            },
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - CYCLE_PERIOD_S
                );
                ds.num_consec_cycle_overruns += 1;
            }
        }

        // Increment cycle counter
        ds.num_cycles += 1;
    }
}
