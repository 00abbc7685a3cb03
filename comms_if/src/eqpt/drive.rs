//! # Drive Equipment Communications Module

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Demands that are sent from the DriveClient to the drivetrain server.
///
/// Both demands are normalised to the drivetrain's capability, so lie between -1 and +1.
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq)]
pub struct DriveDems {
    /// Forward velocity demand, positive drives the robot forwards (towards a target in front of
    /// the camera).
    pub forward: f64,

    /// Turn rate demand, positive turns the robot to the left (anticlockwise from above).
    pub turn: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Response from the drivetrain server based on the demands sent by the client.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveDemsResponse {
    /// Demands were valid and will be executed
    DemsOk,

    /// Demands were invalid and have been rejected
    DemsInvalid,

    /// The server could not reach the motor controllers
    EqptNotConnected,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DriveDems {
    /// Demands which bring the drivetrain to a stop.
    pub fn stop() -> Self {
        Self::default()
    }

    /// Returns true if both demands are finite and within [-1, 1].
    pub fn is_valid(&self) -> bool {
        [self.forward, self.turn]
            .iter()
            .all(|d| d.is_finite() && d.abs() <= 1.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_is_valid() {
        assert!(DriveDems::stop().is_valid());
        assert!(DriveDems { forward: 1.0, turn: -1.0 }.is_valid());
        assert!(!DriveDems { forward: 1.2, turn: 0.0 }.is_valid());
        assert!(!DriveDems { forward: 0.0, turn: f64::NAN }.is_valid());
    }

    #[test]
    fn test_response_json() {
        let s = serde_json::to_string(&DriveDemsResponse::DemsOk).unwrap();
        assert_eq!(s, "\"DemsOk\"");
        assert_eq!(
            serde_json::from_str::<DriveDemsResponse>(&s).unwrap(),
            DriveDemsResponse::DemsOk
        );
    }
}
