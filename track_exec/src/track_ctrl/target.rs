//! Targets which can be tracked and the table of their constants

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

// Internal
use super::TrackCtrlError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A target to track and the desired relationship between it and the robot.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetState {
    /// Which goal this target describes
    pub kind: TargetKind,

    /// The fiducial tag identifying the target
    pub fiducial_id: i32,

    /// Height of the target above the field.
    ///
    /// Units: meters
    pub height_m: f64,

    /// Desired horizontal distance between the camera and the target.
    ///
    /// Units: meters
    pub distance_m: f64,

    /// Desired bearing of the target from the camera boresight, positive to
    /// the right.
    ///
    /// Units: radians
    pub angle_rad: f64,
}

/// Lookup table from target kind to the constants of that target.
#[derive(Debug, Default, Clone)]
pub struct TargetTable {
    targets: HashMap<TargetKind, TargetState>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The goals on the field that the robot knows how to line up with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Reef,
    CoralStation,
    Processor,
    Barge,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for TargetKind {
    fn default() -> Self {
        TargetKind::Reef
    }
}

impl TargetKind {
    /// All target kinds, in declaration order.
    pub const ALL: [TargetKind; 4] = [
        TargetKind::Reef,
        TargetKind::CoralStation,
        TargetKind::Processor,
        TargetKind::Barge,
    ];

    /// The snake case name of the kind, as used in parameter files and on
    /// the command line.
    pub fn name(&self) -> &'static str {
        match self {
            TargetKind::Reef => "reef",
            TargetKind::CoralStation => "coral_station",
            TargetKind::Processor => "processor",
            TargetKind::Barge => "barge",
        }
    }
}

impl FromStr for TargetKind {
    type Err = TrackCtrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TargetKind::ALL
            .iter()
            .copied()
            .find(|k| k.name() == s)
            .ok_or_else(|| TrackCtrlError::UnknownTargetName(s.to_string()))
    }
}

impl TargetTable {
    /// Build the table from a list of targets.
    ///
    /// Each kind may appear at most once.
    pub fn new(targets: &[TargetState]) -> Result<Self, TrackCtrlError> {
        let mut map = HashMap::with_capacity(targets.len());

        for t in targets {
            if map.insert(t.kind, *t).is_some() {
                return Err(TrackCtrlError::DuplicateTarget(t.kind));
            }
        }

        Ok(Self { targets: map })
    }

    /// Get the constants for the given kind of target.
    pub fn get(&self, kind: TargetKind) -> Result<TargetState, TrackCtrlError> {
        self.targets
            .get(&kind)
            .copied()
            .ok_or(TrackCtrlError::UnknownTarget(kind))
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn target(kind: TargetKind, fiducial_id: i32) -> TargetState {
        TargetState {
            kind,
            fiducial_id,
            height_m: 0.3,
            distance_m: 1.0,
            angle_rad: 0.0,
        }
    }

    #[test]
    fn test_table_lookup() {
        let table = TargetTable::new(&[
            target(TargetKind::Reef, 18),
            target(TargetKind::Processor, 16),
        ])
        .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.get(TargetKind::Reef).unwrap().fiducial_id, 18);
        assert_eq!(table.get(TargetKind::Processor).unwrap().fiducial_id, 16);

        match table.get(TargetKind::Barge) {
            Err(TrackCtrlError::UnknownTarget(TargetKind::Barge)) => (),
            r => panic!("Expected UnknownTarget, got {:?}", r),
        }
    }

    #[test]
    fn test_table_duplicate() {
        match TargetTable::new(&[
            target(TargetKind::Reef, 18),
            target(TargetKind::Reef, 7),
        ]) {
            Err(TrackCtrlError::DuplicateTarget(TargetKind::Reef)) => (),
            r => panic!("Expected DuplicateTarget, got {:?}", r),
        }
    }

    #[test]
    fn test_kind_from_str() {
        for kind in TargetKind::ALL.iter() {
            assert_eq!(kind.name().parse::<TargetKind>().unwrap(), *kind);
        }

        assert!("coral-station".parse::<TargetKind>().is_err());
    }
}
