//! Camera mounting geometry and range triangulation

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// How the camera is mounted on the robot.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorGeometry {
    /// Height of the camera's optical centre above the field.
    ///
    /// Units: meters
    pub height_m: f64,

    /// Pitch of the camera boresight above the horizontal, positive upwards.
    ///
    /// Units: radians
    pub pitch_rad: f64,
}

/// Limits outside of which a triangulated range is rejected.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeGuard {
    /// Closest the total elevation of the target (camera pitch plus
    /// detection pitch) may come to the vertical.
    ///
    /// Units: radians
    pub min_total_angle_rad: f64,

    /// Largest range which will be accepted.
    ///
    /// Units: meters
    pub max_range_m: f64,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Triangulate the horizontal range to a target of known height.
///
/// The range is the height difference between the target and the camera
/// divided by the tangent of the target's total elevation. `None` is
/// returned when the elevation is too close to vertical, when the target is
/// on the wrong side of the camera's horizon for its height, or when the
/// range is beyond the guard's maximum.
///
/// Near the horizontal the range grows without bound, which the maximum
/// range catches. How close to the horizontal a valid sample may be depends
/// on the height difference, so no angle limit is applied there.
pub fn range_to_target(
    geometry: &SensorGeometry,
    target_height_m: f64,
    elevation_rad: f64,
    guard: &RangeGuard
) -> Option<f64> {
    let total_rad = geometry.pitch_rad + elevation_rad;

    if !total_rad.is_finite() || total_rad.abs() > FRAC_PI_2 - guard.min_total_angle_rad {
        return None;
    }

    let range_m = (target_height_m - geometry.height_m) / total_rad.tan();

    if range_m.is_finite() && range_m > 0.0 && range_m <= guard.max_range_m {
        Some(range_m)
    }
    else {
        None
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const GUARD: RangeGuard = RangeGuard {
        min_total_angle_rad: 0.01,
        max_range_m: 10.0,
    };

    #[test]
    fn test_range_above_camera() {
        let geometry = SensorGeometry {
            height_m: 0.5,
            pitch_rad: 0.2,
        };

        // Target 1 m above the camera at 45 degrees total elevation
        let elevation_rad = std::f64::consts::FRAC_PI_4 - 0.2;
        let range = range_to_target(&geometry, 1.5, elevation_rad, &GUARD).unwrap();

        assert!((range - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_range_below_camera() {
        let geometry = SensorGeometry {
            height_m: 0.8,
            pitch_rad: -0.3,
        };

        let range = range_to_target(&geometry, 0.3, 0.0, &GUARD).unwrap();

        assert!((range - 0.5 / 0.3f64.tan()).abs() < 1e-9);
    }

    #[test]
    fn test_shallow_target_in_range() {
        let geometry = SensorGeometry {
            height_m: 0.25,
            pitch_rad: 0.0,
        };

        // A target only 6 cm above the camera is seen well under a degree
        // above the horizon at the edge of the range
        let elevation_rad = (0.06f64 / 9.5).atan();
        assert!(elevation_rad < GUARD.min_total_angle_rad);

        let range = range_to_target(&geometry, 0.31, elevation_rad, &GUARD).unwrap();
        assert!((range - 9.5).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_geometry() {
        let geometry = SensorGeometry {
            height_m: 0.5,
            pitch_rad: 0.0,
        };

        // Horizontal, unbounded range
        assert!(range_to_target(&geometry, 1.5, 0.0, &GUARD).is_none());
        assert!(range_to_target(&geometry, 1.5, 0.005, &GUARD).is_none());

        // Level with the camera
        assert!(range_to_target(&geometry, 0.5, 0.0, &GUARD).is_none());

        // Vertical
        assert!(range_to_target(&geometry, 1.5, FRAC_PI_2, &GUARD).is_none());
        assert!(range_to_target(&geometry, 1.5, -FRAC_PI_2, &GUARD).is_none());

        // Target above the camera but seen below the horizon
        assert!(range_to_target(&geometry, 1.5, -0.3, &GUARD).is_none());

        // Beyond the maximum range
        assert!(range_to_target(&geometry, 1.5, 0.05, &GUARD).is_none());

        // Non-finite
        assert!(range_to_target(&geometry, 1.5, f64::NAN, &GUARD).is_none());
        assert!(range_to_target(&geometry, f64::INFINITY, 0.3, &GUARD).is_none());
    }
}
