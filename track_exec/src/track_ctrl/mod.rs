//! # Tracking control module
//!
//! Tracking control aligns the robot with a fiducial target seen by a camera
//! and drives it to a desired standoff distance and bearing from that target.
//!
//! Every cycle the latest batch of detections from the vision equipment is
//! searched for the fiducial of the active target. If it is found the range
//! to the target is triangulated from the camera's mounting geometry, the
//! target's height and the detection's elevation angle. The raw range is
//! noisy, so it is smoothed by a scalar Kalman filter before being compared
//! with the desired distance. The bearing (yaw) of the detection is used
//! unfiltered.
//!
//! The range and bearing errors are converted into forward and turn demands
//! by a proportional control law. A positive forward demand drives the robot
//! towards the target, so a robot further away than desired drives forwards
//! and one which is too close reverses. A positive turn demand turns the
//! robot anticlockwise (to the left), so a target to the right of the
//! desired bearing produces a negative (clockwise) demand.
//!
//! If the target is not seen in a cycle, or its range cannot be
//! triangulated, both demands are zero and the filter is left untouched so
//! that tracking resumes from the previous estimate when the target
//! reappears. The filter is also kept when the active target is changed.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod control_law;
pub mod geometry;
pub mod params;
pub mod range_filter;
pub mod select;
pub mod state;
pub mod target;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use control_law::*;
pub use geometry::*;
pub use params::Params;
pub use range_filter::*;
pub use select::*;
pub use state::*;
pub use target::*;

use comms_if::eqpt::vision::DetectionBatch;
use util::{archive::ArchiveError, params::LoadError};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A source of detection batches, usually the vision client.
pub trait VisionSource {
    /// Get the most recent batch of detections.
    ///
    /// Must not block. If no new frame has arrived since the last call an
    /// empty batch is returned, and any older unread batches are discarded.
    fn read_latest_batch(&mut self) -> DetectionBatch;
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during TrackCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum TrackCtrlError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(LoadError),

    #[error("Invalid range filter configuration: {0}")]
    FilterError(RangeFilterError),

    #[error("No target of kind {0:?} is defined in the target table")]
    UnknownTarget(TargetKind),

    #[error("Target {0:?} is defined more than once in the target table")]
    DuplicateTarget(TargetKind),

    #[error("\"{0}\" is not the name of a target kind")]
    UnknownTargetName(String),

    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    #[error("Could not create the archives: {0}")]
    ArchiveError(ArchiveError),
}
