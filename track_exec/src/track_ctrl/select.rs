//! Selection of the tracked detection from a batch

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::vision::{Detection, DetectionBatch};

use super::TargetState;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Find the detection of the given target in the batch.
///
/// The whole batch is scanned in order and the first detection carrying the
/// target's fiducial id is returned. Detections of other fiducials before it
/// do not stop the search.
pub fn select_target<'a>(
    batch: &'a DetectionBatch,
    target: &TargetState
) -> Option<&'a Detection> {
    batch
        .detections
        .iter()
        .find(|d| d.fiducial_id == target.fiducial_id)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::track_ctrl::TargetKind;

    fn target(fiducial_id: i32) -> TargetState {
        TargetState {
            kind: TargetKind::Reef,
            fiducial_id,
            height_m: 0.3,
            distance_m: 1.0,
            angle_rad: 0.0,
        }
    }

    #[test]
    fn test_select_any_position() {
        let others = [3, 11, 5, 9];

        // The matching detection is found wherever it sits in the batch
        for k in 0..=others.len() {
            let mut detections: Vec<Detection> = others
                .iter()
                .map(|id| Detection::new(*id, 0.5, 0.5))
                .collect();
            detections.insert(k, Detection::new(7, -0.1, 0.2));

            let batch = DetectionBatch::new(detections);
            let selected = select_target(&batch, &target(7));

            assert_eq!(selected, Some(&Detection::new(7, -0.1, 0.2)), "index {}", k);
        }
    }

    #[test]
    fn test_select_first_match() {
        let batch = DetectionBatch::new(vec![
            Detection::new(2, 0.0, 0.0),
            Detection::new(7, 0.1, 0.1),
            Detection::new(7, 0.2, 0.2),
        ]);

        assert_eq!(select_target(&batch, &target(7)).unwrap().yaw_rad, 0.1);
    }

    #[test]
    fn test_select_none() {
        assert!(select_target(&DetectionBatch::empty(), &target(7)).is_none());

        let batch = DetectionBatch::new(vec![
            Detection::new(1, 0.0, 0.0),
            Detection::new(2, 0.0, 0.0),
        ]);
        assert!(select_target(&batch, &target(7)).is_none());
    }
}
