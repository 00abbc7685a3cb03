//! Implementations for the TrackCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace, warn};
use serde::Serialize;

// Internal
use super::{
    Params, TrackCtrlError, VisionSource,
    ControlLaw, RangeFilter, RangeGuard, SensorGeometry,
    TargetKind, TargetState, TargetTable,
    range_to_target, select_target};
use comms_if::eqpt::{drive::DriveDems, vision::DetectionBatch};
use util::{
    params,
    module::State,
    archive::{Archived, Archiver, ArchiveError},
    session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Tracking control module state
#[derive(Default)]
pub struct TrackCtrl {

    pub(crate) params: Params,

    /// Name of the camera this instance tracks with
    name: String,

    table: TargetTable,

    geometry: SensorGeometry,

    guard: RangeGuard,

    filter: RangeFilter,

    control_law: ControlLaw,

    active_target: TargetState,

    mode: TrackMode,

    /// Bearing to the target on the last cycle, zero if not visible
    bearing_rad: f64,

    /// Smoothed range to the target on the last cycle, zero if not visible
    smoothed_range_m: f64,

    pub(crate) output: DriveDems,

    pub(crate) report: StatusReport,
    arch_report: Archiver,

    arch_tm: Archiver,
}

/// Input data to Tracking Control.
#[derive(Default)]
pub struct InputData {
    /// The latest batch of detections from the vision equipment, empty if no
    /// new frame has arrived this cycle.
    pub batch: DetectionBatch
}

/// Status report for TrackCtrl processing.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    /// Mode at the end of the cycle
    pub mode: TrackMode,

    /// True if the target was seen and its range triangulated
    pub visible: bool,

    /// Number of detections in the batch processed this cycle
    pub num_detections: usize,

    /// Range measurement fed to the filter, zero if none was.
    ///
    /// Units: meters
    pub raw_range_m: f64,

    /// True if the target was seen but its range could not be triangulated
    pub range_rejected: bool,

    pub forward_limited: bool,

    pub turn_limited: bool,
}

/// Telemetry snapshot of the tracking state.
#[derive(Clone, Serialize, Debug)]
pub struct TrackTm {
    pub name: String,
    pub visible: bool,
    pub bearing_rad: f64,
    pub smoothed_range_m: f64,
    pub target_kind: TargetKind,
    pub target_id: i32,
    pub target_height_m: f64,
    pub desired_distance_m: f64,
    pub desired_angle_rad: f64,
    pub forward_dem: f64,
    pub turn_dem: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Whether the active target was found on the last cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TrackMode {
    NoTarget,
    Tracking
}

impl Default for TrackMode {
    fn default() -> Self {
        TrackMode::NoTarget
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for TrackCtrl {
    type InitData = &'static str;
    type InitError = TrackCtrlError;

    type InputData = InputData;
    type OutputData = DriveDems;
    type StatusReport = StatusReport;
    type ProcError = TrackCtrlError;

    /// Initialise the TrackCtrl module.
    ///
    /// Expected init data is the path to the parameter file
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>
    {
        // Load the parameters
        let params = params::load(init_data)
            .map_err(TrackCtrlError::ParamLoadError)?;

        *self = Self::from_params(params)?;

        // Initialise the archivers, one pair per camera
        self.arch_report = Archiver::from_path(
            session, format!("track_ctrl/{}_report.csv", self.name)
        ).map_err(TrackCtrlError::ArchiveError)?;
        self.arch_tm = Archiver::from_path(
            session, format!("track_ctrl/{}_tm.csv", self.name)
        ).map_err(TrackCtrlError::ArchiveError)?;

        Ok(())
    }

    /// Perform cyclic processing of Tracking Control.
    ///
    /// No detection input is an error. Missing targets and degenerate
    /// geometry are reported in the status report.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        Ok(self.process(&input_data.batch))
    }
}

impl Archived for TrackCtrl {
    fn write(&mut self) -> Result<(), ArchiveError> {
        self.arch_report.serialise(self.report)?;
        self.arch_tm.serialise(self.tm())?;

        Ok(())
    }
}

impl TrackCtrl {

    /// Create a new instance from already loaded parameters.
    ///
    /// The filter starts from its initial estimate and the active target is
    /// the parameters' `initial_target`. No archives are written by an
    /// instance created this way.
    pub fn from_params(params: Params) -> Result<Self, TrackCtrlError> {
        params.validate()?;

        let table = TargetTable::new(&params.targets)?;
        let active_target = table.get(params.initial_target)?;

        let filter = RangeFilter::new(params.process_noise, params.measurement_noise)
            .map_err(TrackCtrlError::FilterError)?;

        Ok(Self {
            name: params.camera_name.clone(),
            table,
            geometry: params.sensor_geometry(),
            guard: params.range_guard(),
            filter,
            control_law: ControlLaw::from_params(&params),
            active_target,
            params,
            ..Default::default()
        })
    }

    /// Read the latest batch from the source and process it.
    ///
    /// This is the scheduler's per-cycle call, results are read back with
    /// the accessors.
    pub fn update(&mut self, source: &mut dyn VisionSource) {
        let batch = source.read_latest_batch();
        self.process(&batch);
    }

    /// Change the target being tracked.
    ///
    /// The range filter is not reset, so the first range of the new target
    /// is smoothed against the last estimate of the previous one.
    pub fn set_active_target(&mut self, target: TargetState) {
        debug!(
            "{}: active target changed from {:?} (id {}) to {:?} (id {})",
            self.name,
            self.active_target.kind,
            self.active_target.fiducial_id,
            target.kind,
            target.fiducial_id
        );

        self.active_target = target;
    }

    /// Change the target being tracked to the given kind from the table.
    pub fn select_target_kind(&mut self, kind: TargetKind) -> Result<(), TrackCtrlError> {
        let target = self.table.get(kind)?;
        self.set_active_target(target);

        Ok(())
    }

    /// Forward demand from the last cycle, positive towards the target.
    pub fn forward_dem(&self) -> f64 {
        self.output.forward
    }

    /// Turn demand from the last cycle, positive anticlockwise.
    pub fn turn_dem(&self) -> f64 {
        self.output.turn
    }

    /// Smoothed range to the target on the last cycle, zero if it wasn't
    /// visible.
    pub fn smoothed_range_m(&self) -> f64 {
        self.smoothed_range_m
    }

    /// The range filter's estimate, which is kept while the target is lost.
    pub fn range_estimate_m(&self) -> f64 {
        self.filter.estimate_m()
    }

    pub fn range_filter(&self) -> &RangeFilter {
        &self.filter
    }

    /// Bearing to the target on the last cycle, zero if it wasn't visible.
    pub fn bearing_rad(&self) -> f64 {
        self.bearing_rad
    }

    pub fn is_target_visible(&self) -> bool {
        self.mode == TrackMode::Tracking
    }

    pub fn mode(&self) -> TrackMode {
        self.mode
    }

    pub fn active_target(&self) -> &TargetState {
        &self.active_target
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Snapshot of the current state for telemetry.
    pub fn tm(&self) -> TrackTm {
        TrackTm {
            name: self.name.clone(),
            visible: self.is_target_visible(),
            bearing_rad: self.bearing_rad,
            smoothed_range_m: self.smoothed_range_m,
            target_kind: self.active_target.kind,
            target_id: self.active_target.fiducial_id,
            target_height_m: self.active_target.height_m,
            desired_distance_m: self.active_target.distance_m,
            desired_angle_rad: self.active_target.angle_rad,
            forward_dem: self.output.forward,
            turn_dem: self.output.turn,
        }
    }

    /// Process one batch of detections, updating the cached outputs.
    fn process(&mut self, batch: &DetectionBatch) -> (DriveDems, StatusReport) {
        let mut report = StatusReport {
            num_detections: batch.len(),
            ..Default::default()
        };

        // Find the target and triangulate its range
        let sample = match select_target(batch, &self.active_target) {
            Some(d) => match range_to_target(
                &self.geometry,
                self.active_target.height_m,
                d.pitch_rad,
                &self.guard
            ) {
                Some(r) => Some((r, d.yaw_rad)),
                None => {
                    // Only warn on the first of a run of rejections
                    if !self.report.range_rejected {
                        warn!(
                            "{}: cannot triangulate range to target {} at pitch {:.4} rad, \
                            sample rejected",
                            self.name,
                            d.fiducial_id,
                            d.pitch_rad
                        );
                    }
                    report.range_rejected = true;
                    None
                }
            },
            None => None
        };

        let mode = match sample {
            Some((raw_range_m, bearing_rad)) => {
                self.smoothed_range_m = self.filter.update(raw_range_m);
                self.bearing_rad = bearing_rad;
                report.raw_range_m = raw_range_m;

                TrackMode::Tracking
            },
            None => {
                // The filter is held so tracking resumes from the last
                // estimate
                self.smoothed_range_m = 0.0;
                self.bearing_rad = 0.0;

                TrackMode::NoTarget
            }
        };

        if mode != self.mode {
            match mode {
                TrackMode::Tracking => debug!(
                    "{}: acquired {:?} (id {})",
                    self.name,
                    self.active_target.kind,
                    self.active_target.fiducial_id
                ),
                TrackMode::NoTarget => debug!(
                    "{}: lost {:?} (id {})",
                    self.name,
                    self.active_target.kind,
                    self.active_target.fiducial_id
                )
            }
        }
        self.mode = mode;

        let visible = mode == TrackMode::Tracking;
        let out = self.control_law.compute(
            self.smoothed_range_m,
            self.bearing_rad,
            &self.active_target,
            visible
        );

        report.mode = mode;
        report.visible = visible;
        report.forward_limited = out.forward_limited;
        report.turn_limited = out.turn_limited;

        self.output = DriveDems {
            forward: out.forward,
            turn: out.turn
        };
        self.report = report;

        trace!(
            "{}: visible {}, range {:.3} m, bearing {:.4} rad, dems fwd {:.3} turn {:.3}",
            self.name,
            visible,
            self.smoothed_range_m,
            self.bearing_rad,
            self.output.forward,
            self.output.turn
        );

        (self.output, self.report)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::eqpt::vision::Detection;
    use std::collections::VecDeque;

    const CAMERA_HEIGHT_M: f64 = 0.5;

    const REEF_ID: i32 = 7;
    const REEF_HEIGHT_M: f64 = 1.5;

    const PROCESSOR_ID: i32 = 3;
    const PROCESSOR_HEIGHT_M: f64 = 1.0;

    fn test_params() -> Params {
        Params {
            camera_name: String::from("front"),
            camera_height_m: CAMERA_HEIGHT_M,
            camera_pitch_rad: 0.0,
            min_total_angle_rad: 0.01,
            max_range_m: 10.0,
            process_noise: 1e-4,
            measurement_noise: 1.0,
            max_speed_ms: 1.0,
            drive_gain: 1.0,
            angle_gain: 0.1,
            min_forward_dem: -1.0,
            max_forward_dem: 1.0,
            min_turn_dem: -1.0,
            max_turn_dem: 1.0,
            initial_target: TargetKind::Reef,
            targets: vec![
                TargetState {
                    kind: TargetKind::Reef,
                    fiducial_id: REEF_ID,
                    height_m: REEF_HEIGHT_M,
                    distance_m: 2.0,
                    angle_rad: 0.0,
                },
                TargetState {
                    kind: TargetKind::Processor,
                    fiducial_id: PROCESSOR_ID,
                    height_m: PROCESSOR_HEIGHT_M,
                    distance_m: 1.0,
                    angle_rad: 0.1,
                },
            ],
        }
    }

    /// A detection of the given target seen at the given range, with the
    /// camera level.
    fn seen_at(fiducial_id: i32, height_m: f64, range_m: f64, yaw_rad: f64) -> Detection {
        Detection::new(fiducial_id, yaw_rad, ((height_m - CAMERA_HEIGHT_M) / range_m).atan())
    }

    fn input(detections: Vec<Detection>) -> InputData {
        InputData {
            batch: DetectionBatch::new(detections)
        }
    }

    struct ScriptedSource {
        batches: VecDeque<DetectionBatch>
    }

    impl VisionSource for ScriptedSource {
        fn read_latest_batch(&mut self) -> DetectionBatch {
            self.batches.pop_front().unwrap_or_default()
        }
    }

    #[test]
    fn test_initial_state() {
        let tc = TrackCtrl::from_params(test_params()).unwrap();

        assert_eq!(tc.name(), "front");
        assert_eq!(tc.mode(), TrackMode::NoTarget);
        assert!(!tc.is_target_visible());
        assert_eq!(tc.active_target().fiducial_id, REEF_ID);
        assert_eq!(tc.range_estimate_m(), 0.0);
        assert_eq!(tc.range_filter().error_covariance(), 1.0);
        assert_eq!(tc.forward_dem(), 0.0);
        assert_eq!(tc.turn_dem(), 0.0);
    }

    #[test]
    fn test_tracking_output() {
        let mut tc = TrackCtrl::from_params(test_params()).unwrap();

        let (dems, report) = tc.proc(&input(vec![
            Detection::new(11, 0.0, 0.0),
            seen_at(REEF_ID, REEF_HEIGHT_M, 3.0, 0.2),
        ])).unwrap();

        assert_eq!(report.mode, TrackMode::Tracking);
        assert!(report.visible);
        assert_eq!(report.num_detections, 2);
        assert!((report.raw_range_m - 3.0).abs() < 1e-9);
        assert!(!report.range_rejected);

        let mut reference = RangeFilter::new(1e-4, 1.0).unwrap();
        let smoothed = reference.update(report.raw_range_m);

        assert!(tc.is_target_visible());
        assert_eq!(tc.smoothed_range_m(), smoothed);
        assert_eq!(tc.bearing_rad(), 0.2);

        // Closer than desired by the estimate so far, reverse, and turn
        // clockwise towards a target on the right
        assert!((dems.forward - -(2.0 - smoothed)).abs() < 1e-12);
        assert!(dems.forward < 0.0);
        assert!((dems.turn - -0.02).abs() < 1e-12);
        assert_eq!(tc.forward_dem(), dems.forward);
        assert_eq!(tc.turn_dem(), dems.turn);
    }

    #[test]
    fn test_no_target_holds_filter() {
        let mut tc = TrackCtrl::from_params(test_params()).unwrap();
        let mut reference = RangeFilter::new(1e-4, 1.0).unwrap();

        let (_, report) = tc.proc(&input(vec![
            seen_at(REEF_ID, REEF_HEIGHT_M, 3.0, 0.1)
        ])).unwrap();
        reference.update(report.raw_range_m);

        let estimate = tc.range_estimate_m();
        let cov = tc.range_filter().error_covariance();

        // Empty batch, then a batch of other fiducials
        for detections in vec![
            vec![],
            vec![Detection::new(1, 0.1, 0.3), Detection::new(2, -0.1, 0.3)]
        ] {
            let (dems, report) = tc.proc(&input(detections)).unwrap();

            assert_eq!(report.mode, TrackMode::NoTarget);
            assert!(!report.visible);
            assert!(!report.range_rejected);
            assert_eq!(dems, DriveDems::default());
            assert!(!tc.is_target_visible());
            assert_eq!(tc.smoothed_range_m(), 0.0);
            assert_eq!(tc.bearing_rad(), 0.0);
            assert_eq!(tc.range_estimate_m(), estimate);
            assert_eq!(tc.range_filter().error_covariance(), cov);
        }

        // Tracking resumes from the held estimate
        let (_, report) = tc.proc(&input(vec![
            seen_at(REEF_ID, REEF_HEIGHT_M, 3.0, 0.1)
        ])).unwrap();

        assert!(report.visible);
        assert_eq!(tc.smoothed_range_m(), reference.update(report.raw_range_m));
        assert!(tc.smoothed_range_m() > estimate);
    }

    #[test]
    fn test_degenerate_geometry_rejected() {
        let mut tc = TrackCtrl::from_params(test_params()).unwrap();

        tc.proc(&input(vec![seen_at(REEF_ID, REEF_HEIGHT_M, 3.0, 0.0)])).unwrap();
        let estimate = tc.range_estimate_m();

        // Level with the camera, so the range is unbounded
        let (dems, report) = tc.proc(&input(vec![
            Detection::new(REEF_ID, 0.3, 0.0)
        ])).unwrap();

        assert_eq!(report.mode, TrackMode::NoTarget);
        assert!(!report.visible);
        assert!(report.range_rejected);
        assert_eq!(report.raw_range_m, 0.0);
        assert_eq!(dems, DriveDems::default());
        assert_eq!(tc.range_estimate_m(), estimate);

        // Non-finite angles never reach the filter
        let (_, report) = tc.proc(&input(vec![
            Detection::new(REEF_ID, 0.0, f64::NAN)
        ])).unwrap();

        assert!(report.range_rejected);
        assert!(tc.range_estimate_m().is_finite());
        assert_eq!(tc.range_estimate_m(), estimate);
    }

    #[test]
    fn test_target_switch_keeps_filter() {
        let mut tc = TrackCtrl::from_params(test_params()).unwrap();
        let mut reference = RangeFilter::new(1e-4, 1.0).unwrap();

        for _ in 0..2 {
            let (_, report) = tc.proc(&input(vec![
                seen_at(REEF_ID, REEF_HEIGHT_M, 3.0, 0.0)
            ])).unwrap();
            reference.update(report.raw_range_m);
        }

        tc.select_target_kind(TargetKind::Processor).unwrap();
        assert_eq!(tc.active_target().fiducial_id, PROCESSOR_ID);

        // The reef is still in view but is no longer the target
        let (dems, report) = tc.proc(&input(vec![
            seen_at(REEF_ID, REEF_HEIGHT_M, 3.0, 0.0),
            seen_at(PROCESSOR_ID, PROCESSOR_HEIGHT_M, 1.5, 0.1),
        ])).unwrap();

        assert!(report.visible);
        assert!((report.raw_range_m - 1.5).abs() < 1e-9);

        // The new target's range is smoothed against the old estimate
        let smoothed = reference.update(report.raw_range_m);
        assert_eq!(tc.smoothed_range_m(), smoothed);
        assert_ne!(tc.smoothed_range_m(), RangeFilter::default().update(report.raw_range_m));

        // Desired bearing of the processor is 0.1 so no turn is needed
        assert!(dems.turn.abs() < 1e-12);
    }

    #[test]
    fn test_select_unknown_kind() {
        let mut tc = TrackCtrl::from_params(test_params()).unwrap();

        match tc.select_target_kind(TargetKind::Barge) {
            Err(TrackCtrlError::UnknownTarget(TargetKind::Barge)) => (),
            r => panic!("Expected UnknownTarget, got {:?}", r)
        }
        assert_eq!(tc.active_target().kind, TargetKind::Reef);

        let mut params = test_params();
        params.initial_target = TargetKind::Barge;
        assert!(matches!(
            TrackCtrl::from_params(params),
            Err(TrackCtrlError::UnknownTarget(TargetKind::Barge))
        ));

        let mut params = test_params();
        params.process_noise = 0.0;
        assert!(matches!(
            TrackCtrl::from_params(params),
            Err(TrackCtrlError::FilterError(_))
        ));
    }

    #[test]
    fn test_update_from_source() {
        let mut tc = TrackCtrl::from_params(test_params()).unwrap();
        let mut source = ScriptedSource {
            batches: vec![
                DetectionBatch::new(vec![seen_at(REEF_ID, REEF_HEIGHT_M, 2.5, -0.1)]),
                DetectionBatch::new(vec![seen_at(REEF_ID, REEF_HEIGHT_M, 2.5, -0.1)]),
            ].into_iter().collect()
        };

        tc.update(&mut source);
        assert!(tc.is_target_visible());
        let first = tc.smoothed_range_m();

        tc.update(&mut source);
        assert!(tc.smoothed_range_m() > first);

        // Source exhausted, no new frame
        tc.update(&mut source);
        assert!(!tc.is_target_visible());
        assert_eq!(tc.forward_dem(), 0.0);
        assert_eq!(tc.turn_dem(), 0.0);
    }

    #[test]
    fn test_independent_instances() {
        let mut a = TrackCtrl::from_params(test_params()).unwrap();
        let mut b = TrackCtrl::from_params(test_params()).unwrap();

        a.proc(&input(vec![seen_at(REEF_ID, REEF_HEIGHT_M, 3.0, 0.0)])).unwrap();
        b.select_target_kind(TargetKind::Processor).unwrap();

        assert!(a.range_estimate_m() > 0.0);
        assert_eq!(b.range_estimate_m(), 0.0);
        assert_eq!(a.active_target().kind, TargetKind::Reef);
        assert_eq!(b.active_target().kind, TargetKind::Processor);
    }

    #[test]
    fn test_tm_snapshot() {
        let mut tc = TrackCtrl::from_params(test_params()).unwrap();
        tc.proc(&input(vec![seen_at(REEF_ID, REEF_HEIGHT_M, 3.0, 0.05)])).unwrap();

        let tm = tc.tm();

        assert_eq!(tm.name, "front");
        assert!(tm.visible);
        assert_eq!(tm.bearing_rad, 0.05);
        assert_eq!(tm.smoothed_range_m, tc.smoothed_range_m());
        assert_eq!(tm.target_kind, TargetKind::Reef);
        assert_eq!(tm.target_id, REEF_ID);
        assert_eq!(tm.target_height_m, REEF_HEIGHT_M);
        assert_eq!(tm.desired_distance_m, 2.0);
        assert_eq!(tm.desired_angle_rad, 0.0);
        assert_eq!(tm.forward_dem, tc.forward_dem());
        assert_eq!(tm.turn_dem, tc.turn_dem());
    }
}
