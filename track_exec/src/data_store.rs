//! # Data Store

use comms_if::eqpt::drive::DriveDems;
use log::{info, warn};
use serde::Serialize;

use crate::track_ctrl;

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// Gives the reason the robot has been put into safe mode
#[derive(Debug, Eq, PartialEq, Copy, Clone, Serialize)]
pub enum SafeModeCause {
    DriveClientNotConnected,
    VisionClientNotConnected,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// True if this cycle falls on a 1Hz boundary
    pub is_1_hz_cycle: bool,

    /// Time since the start of the session
    pub elapsed_s: f64,

    // Safe mode variables
    /// Determines if the robot is in safe mode.
    pub safe: bool,

    /// Gives the reason for the robot being in safe mode.
    pub safe_cause: Option<SafeModeCause>,

    // TrackCtrl
    pub track_ctrl: track_ctrl::TrackCtrl,
    pub track_ctrl_input: track_ctrl::InputData,
    pub track_ctrl_output: DriveDems,
    pub track_ctrl_status_rpt: track_ctrl::StatusReport,

    /// Demands actually sent to the drivetrain this cycle
    pub drive_dems: DriveDems,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,

    /// Number of consecutive drive client recieve errors
    pub num_consec_drive_recv_errors: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Puts the robot into safe mode with the given cause.
    pub fn make_safe(&mut self, cause: SafeModeCause) {
        if !self.safe {
            warn!("Make safe requested, cause: {:?}", cause);
            self.safe = true;
            self.safe_cause = Some(cause);

            self.drive_dems = DriveDems::stop();
        }
    }

    /// Attempts to disable the safe mode by clearing the given cause.
    ///
    /// Returns `Ok(())` if this cause was cleared and safe mode was disabled, or `Err(())`
    /// otherwise. To remove safe mode the provided cause must match the initial reason for safe
    /// mode being enabled.
    ///
    /// If safe mode was not enabled `Ok(())` is returned
    pub fn make_unsafe(&mut self, cause: SafeModeCause) -> Result<(), ()> {
        if !self.safe {
            return Ok(());
        }

        match self.safe_cause {
            Some(root_cause) => {
                if cause == root_cause {
                    self.safe = false;
                    self.safe_cause = None;
                    info!("Make unsafe requested, root cause match, safe mode disabled");
                    Ok(())
                } else {
                    Err(())
                }
            }
            None => Ok(()),
        }
    }

    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle, and sets the 1Hz cycle flag.
    pub fn cycle_start(&mut self, cycle_frequency_hz: f64) {
        self.is_1_hz_cycle = self.num_cycles % (cycle_frequency_hz as u128) == 0;

        self.track_ctrl_input = track_ctrl::InputData::default();
        self.track_ctrl_output = DriveDems::default();
        self.track_ctrl_status_rpt = track_ctrl::StatusReport::default();
        self.drive_dems = DriveDems::stop();

        self.elapsed_s = util::session::get_elapsed_seconds();
    }

    /// Select the demands to send to the drivetrain this cycle.
    ///
    /// In safe mode the drivetrain is always stopped.
    pub fn set_drive_dems(&mut self) {
        self.drive_dems = match self.safe {
            true => DriveDems::stop(),
            false => self.track_ctrl_output
        };
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_safe_mode() {
        let mut ds = DataStore::default();

        ds.make_safe(SafeModeCause::VisionClientNotConnected);
        assert!(ds.safe);

        // A second cause doesn't replace the root cause
        ds.make_safe(SafeModeCause::DriveClientNotConnected);
        assert_eq!(ds.safe_cause, Some(SafeModeCause::VisionClientNotConnected));

        assert!(ds.make_unsafe(SafeModeCause::DriveClientNotConnected).is_err());
        assert!(ds.safe);

        assert!(ds.make_unsafe(SafeModeCause::VisionClientNotConnected).is_ok());
        assert!(!ds.safe);
        assert_eq!(ds.safe_cause, None);

        assert!(ds.make_unsafe(SafeModeCause::VisionClientNotConnected).is_ok());
    }

    #[test]
    fn test_safe_mode_stops_drive() {
        let mut ds = DataStore::default();
        ds.track_ctrl_output = DriveDems { forward: 0.5, turn: -0.2 };

        ds.set_drive_dems();
        assert_eq!(ds.drive_dems, ds.track_ctrl_output);

        ds.make_safe(SafeModeCause::DriveClientNotConnected);
        ds.set_drive_dems();
        assert_eq!(ds.drive_dems, DriveDems::stop());
    }

    #[test]
    fn test_1_hz_cycle() {
        let mut ds = DataStore::default();

        ds.cycle_start(50.0);
        assert!(ds.is_1_hz_cycle);

        ds.num_cycles = 49;
        ds.cycle_start(50.0);
        assert!(!ds.is_1_hz_cycle);

        ds.num_cycles = 100;
        ds.cycle_start(50.0);
        assert!(ds.is_1_hz_cycle);
    }
}
