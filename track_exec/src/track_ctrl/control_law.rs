//! # Tracking control law
//!
//! Proportional control on the range and bearing errors to the target.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use super::{Params, TargetState};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Converts range and bearing errors into forward and turn demands.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ControlLaw {
    /// Forward demand per meter of range error
    forward_gain_scale: f64,

    /// Turn demand per radian of bearing error
    turn_gain_scale: f64,

    /// (min, max) forward demand
    forward_limits: (f64, f64),

    /// (min, max) turn demand
    turn_limits: (f64, f64),
}

/// Demands produced by the control law for one cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct ControlOutput {
    /// Forward demand, positive towards the target
    pub forward: f64,

    /// Turn demand, positive anticlockwise
    pub turn: f64,

    /// True if the forward demand was clamped to its limits
    pub forward_limited: bool,

    /// True if the turn demand was clamped to its limits
    pub turn_limited: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ControlLaw {
    /// Create a control law with the given gain scales, limited to [-1, 1].
    pub fn new(forward_gain_scale: f64, turn_gain_scale: f64) -> Self {
        Self {
            forward_gain_scale,
            turn_gain_scale,
            forward_limits: (-1.0, 1.0),
            turn_limits: (-1.0, 1.0),
        }
    }

    /// Replace the output limits, each given as `(min, max)`.
    pub fn with_limits(mut self, forward: (f64, f64), turn: (f64, f64)) -> Self {
        self.forward_limits = forward;
        self.turn_limits = turn;
        self
    }

    /// Build the control law described by the parameters.
    pub fn from_params(params: &Params) -> Self {
        Self::new(params.forward_gain_scale(), params.turn_gain_scale()).with_limits(
            (params.min_forward_dem, params.max_forward_dem),
            (params.min_turn_dem, params.max_turn_dem),
        )
    }

    /// Compute the demands for the current range and bearing to the target.
    ///
    /// If the target is not visible both demands are zero.
    pub fn compute(
        &self,
        smoothed_range_m: f64,
        bearing_rad: f64,
        target: &TargetState,
        visible: bool
    ) -> ControlOutput {
        if !visible {
            return ControlOutput::default();
        }

        // Further away than desired gives a positive demand, driving towards
        // the target
        let forward = -(target.distance_m - smoothed_range_m) * self.forward_gain_scale;

        // A target right of the desired bearing gives a negative (clockwise)
        // demand
        let turn = (target.angle_rad - bearing_rad) * self.turn_gain_scale;

        let (forward, forward_limited) = limit(forward, self.forward_limits);
        let (turn, turn_limited) = limit(turn, self.turn_limits);

        ControlOutput {
            forward,
            turn,
            forward_limited,
            turn_limited,
        }
    }
}

impl Default for ControlLaw {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Clamp the value to the limits, returning the clamped value and whether it
/// was changed.
fn limit(value: f64, limits: (f64, f64)) -> (f64, bool) {
    let clamped = value.max(limits.0).min(limits.1);

    (clamped, clamped != value)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::track_ctrl::TargetKind;

    fn target(distance_m: f64, angle_rad: f64) -> TargetState {
        TargetState {
            kind: TargetKind::Reef,
            fiducial_id: 1,
            height_m: 0.3,
            distance_m,
            angle_rad,
        }
    }

    #[test]
    fn test_forward_sign() {
        let law = ControlLaw::new(1.0, 0.1);

        // Too far, drive forwards
        let out = law.compute(3.0, 0.0, &target(2.0, 0.0), true);
        assert_eq!(out.forward, 1.0);
        assert!(!out.forward_limited);

        // Too close, reverse
        let out = law.compute(1.5, 0.0, &target(2.0, 0.0), true);
        assert_eq!(out.forward, -0.5);

        // At the desired distance and bearing, stop
        let out = law.compute(2.0, 0.0, &target(2.0, 0.0), true);
        assert_eq!(out, ControlOutput::default());
    }

    #[test]
    fn test_turn_sign() {
        // The law is linear in the bearing so the units it is given in only
        // scale the gain
        let law = ControlLaw::new(1.0, 0.1);

        let out = law.compute(2.0, 10.0, &target(2.0, 0.0), true);
        assert!((out.turn - -1.0).abs() < 1e-12);
        assert!(!out.turn_limited);

        let out = law.compute(2.0, -0.2, &target(2.0, 0.3), true);
        assert!((out.turn - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_not_visible() {
        let law = ControlLaw::new(1.0, 1.0);

        let out = law.compute(5.0, 0.4, &target(2.0, 0.0), false);
        assert_eq!(out, ControlOutput::default());
    }

    #[test]
    fn test_limits() {
        let law = ControlLaw::new(2.0, 3.0).with_limits((-0.5, 0.8), (-0.25, 0.25));

        let out = law.compute(4.0, 0.5, &target(2.0, 0.0), true);
        assert_eq!(out.forward, 0.8);
        assert!(out.forward_limited);
        assert_eq!(out.turn, -0.25);
        assert!(out.turn_limited);

        let out = law.compute(0.0, -0.5, &target(2.0, 0.0), true);
        assert_eq!(out.forward, -0.5);
        assert_eq!(out.turn, 0.25);
    }
}
