//! Tracking control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_4;

// Internal
use super::{RangeGuard, SensorGeometry, TargetKind, TargetState, TrackCtrlError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for tracking control
#[derive(Deserialize, Serialize, Debug, Default, Clone)]
pub struct Params {

    /// Name of the camera the module tracks with, used to label logs,
    /// telemetry and archives.
    pub camera_name: String,

    // ---- GEOMETRY ----

    /// Height of the camera above the field.
    ///
    /// Units: meters
    pub camera_height_m: f64,

    /// Pitch of the camera above the horizontal.
    ///
    /// Units: radians
    pub camera_pitch_rad: f64,

    /// Smallest angle between the target's total elevation and the vertical
    /// for which range is triangulated.
    ///
    /// Units: radians
    pub min_total_angle_rad: f64,

    /// Largest triangulated range which is accepted.
    ///
    /// Units: meters
    pub max_range_m: f64,

    // ---- FILTER ----

    /// Range filter process noise variance.
    ///
    /// Units: meters^2
    pub process_noise: f64,

    /// Range filter measurement noise variance.
    ///
    /// Units: meters^2
    pub measurement_noise: f64,

    // ---- CONTROL ----

    /// Maximum linear speed of the drivetrain, which scales both gains.
    ///
    /// Units: meters/second
    pub max_speed_ms: f64,

    /// Forward gain per unit of maximum speed.
    ///
    /// Units: 1/meters * seconds/meters
    pub drive_gain: f64,

    /// Turn gain per unit of maximum speed.
    ///
    /// Units: 1/radians * seconds/meters
    pub angle_gain: f64,

    /// Forward demand minimum limit
    pub min_forward_dem: f64,

    /// Forward demand maximum limit
    pub max_forward_dem: f64,

    /// Turn demand minimum limit
    pub min_turn_dem: f64,

    /// Turn demand maximum limit
    pub max_turn_dem: f64,

    // ---- TARGETS ----

    /// The target to track on startup.
    pub initial_target: TargetKind,

    /// Constants of every known target.
    pub targets: Vec<TargetState>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// The camera mounting geometry.
    pub fn sensor_geometry(&self) -> SensorGeometry {
        SensorGeometry {
            height_m: self.camera_height_m,
            pitch_rad: self.camera_pitch_rad,
        }
    }

    /// The limits on triangulated range.
    pub fn range_guard(&self) -> RangeGuard {
        RangeGuard {
            min_total_angle_rad: self.min_total_angle_rad,
            max_range_m: self.max_range_m,
        }
    }

    /// Forward demand per meter of range error.
    pub fn forward_gain_scale(&self) -> f64 {
        self.max_speed_ms * self.drive_gain
    }

    /// Turn demand per radian of bearing error.
    pub fn turn_gain_scale(&self) -> f64 {
        self.max_speed_ms * self.angle_gain
    }

    /// Check the parameters which cannot be validated by their types alone.
    pub fn validate(&self) -> Result<(), TrackCtrlError> {
        if !(self.camera_height_m.is_finite() && self.camera_pitch_rad.is_finite()) {
            return Err(TrackCtrlError::InvalidParam(format!(
                "camera_height_m ({}) and camera_pitch_rad ({}) must be finite",
                self.camera_height_m, self.camera_pitch_rad
            )));
        }
        for t in self.targets.iter() {
            if !(t.height_m.is_finite() && t.distance_m.is_finite() && t.angle_rad.is_finite()) {
                return Err(TrackCtrlError::InvalidParam(format!(
                    "target {:?} has a non-finite height ({}), distance ({}) or angle ({})",
                    t.kind, t.height_m, t.distance_m, t.angle_rad
                )));
            }
        }
        if !(self.min_forward_dem < self.max_forward_dem) {
            return Err(TrackCtrlError::InvalidParam(format!(
                "min_forward_dem ({}) must be less than max_forward_dem ({})",
                self.min_forward_dem, self.max_forward_dem
            )));
        }
        if !(self.min_turn_dem < self.max_turn_dem) {
            return Err(TrackCtrlError::InvalidParam(format!(
                "min_turn_dem ({}) must be less than max_turn_dem ({})",
                self.min_turn_dem, self.max_turn_dem
            )));
        }
        if !(self.min_total_angle_rad >= 0.0 && self.min_total_angle_rad < FRAC_PI_4) {
            return Err(TrackCtrlError::InvalidParam(format!(
                "min_total_angle_rad ({}) must be in [0, pi/4)",
                self.min_total_angle_rad
            )));
        }
        if !(self.max_range_m > 0.0) {
            return Err(TrackCtrlError::InvalidParam(format!(
                "max_range_m ({}) must be positive",
                self.max_range_m
            )));
        }
        if !(self.forward_gain_scale().is_finite() && self.turn_gain_scale().is_finite()) {
            return Err(TrackCtrlError::InvalidParam(String::from(
                "the forward and turn gains must be finite"
            )));
        }

        Ok(())
    }
}
