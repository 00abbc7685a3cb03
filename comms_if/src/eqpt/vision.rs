//! # Vision Equipment Communications Module
//!
//! The vision equipment publishes one [`DetectionBatch`] for every frame it processes. Angles are
//! measured from the camera boresight and are always in radians on the wire.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{serde::ts_milliseconds, DateTime, Utc};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// One fiducial target candidate sensed in a single frame.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Detection {
    /// Identifier of the fiducial tag which was detected
    pub fiducial_id: i32,

    /// Horizontal angle from the camera boresight to the target, positive to the right.
    ///
    /// Units: radians
    pub yaw_rad: f64,

    /// Vertical angle from the camera boresight to the target, positive upwards.
    ///
    /// Units: radians
    pub pitch_rad: f64,
}

/// All detections produced from a single frame, in the order the vision pipeline reported them.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DetectionBatch {
    /// UTC timestamp at which the frame was acquired
    #[serde(with = "ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    /// The detections in this frame, may be empty
    pub detections: Vec<Detection>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Detection {
    pub fn new(fiducial_id: i32, yaw_rad: f64, pitch_rad: f64) -> Self {
        Self {
            fiducial_id,
            yaw_rad,
            pitch_rad,
        }
    }
}

impl DetectionBatch {
    /// Create a batch stamped with the current time.
    pub fn new(detections: Vec<Detection>) -> Self {
        Self {
            timestamp: Utc::now(),
            detections,
        }
    }

    /// A batch with no detections, used when no new frame has arrived.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    pub fn len(&self) -> usize {
        self.detections.len()
    }
}

impl Default for DetectionBatch {
    fn default() -> Self {
        Self::empty()
    }
}
