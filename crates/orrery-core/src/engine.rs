//! Tracking engine: command handling and the per-tick entry point
//!
//! Hosts send [`Command`]s (target selection, precision, reset) and call
//! [`TrackingEngine::tick`] once per frame with the current position samples.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::body::{BodyId, PositionSource};
use crate::camera::{CameraPose, CameraTransformUpdater, PoseTarget};
use crate::config::EngineConfig;
use crate::math::{UnitQuaternion, Vector3};
use crate::precision::{PrecisionBackend, PrecisionError, PrecisionSettings};
use crate::tracking::TrackingStateMachine;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Unknown body: {0}")]
    UnknownBody(BodyId),
    #[error(transparent)]
    Precision(#[from] PrecisionError),
}

/// Explicit commands into the tracking state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Track a body, or stop tracking with `None`
    SelectTarget(Option<BodyId>),
    /// Precision for sessions armed from now on
    SetPrecision(PrecisionSettings),
    /// Restore the initial camera pose
    Reset,
}

/// What one tracking tick did
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub target: BodyId,
    /// 1-based tick index within the session
    pub tick: u64,
    pub rotation: UnitQuaternion,
    pub scale: f64,
    /// The tick was frozen because a displacement had zero length
    pub degenerate: bool,
    pub pose: CameraPose,
    pub written_to: PoseTarget,
}

pub struct TrackingEngine {
    reference: BodyId,
    align_on_select: bool,
    precision: PrecisionSettings,
    backend: PrecisionBackend,
    tracking: TrackingStateMachine,
    camera: CameraTransformUpdater,
}

impl TrackingEngine {
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        let backend = PrecisionBackend::new(&config.precision)?;

        let mut camera = CameraTransformUpdater::new(config.camera.initial_pose());
        if config.camera.ghost {
            camera.enable_ghost();
        }

        info!(
            reference = %config.engine.reference_body,
            precision = %config.precision.mode,
            ghost = config.camera.ghost,
            "Tracking engine created"
        );

        Ok(Self {
            reference: config.reference_body(),
            align_on_select: config.engine.align_on_select,
            precision: config.precision,
            backend,
            tracking: TrackingStateMachine::new(),
            camera,
        })
    }

    pub fn reference_body(&self) -> &BodyId {
        &self.reference
    }

    pub fn precision(&self) -> &PrecisionSettings {
        &self.precision
    }

    pub fn tracking(&self) -> &TrackingStateMachine {
        &self.tracking
    }

    pub fn target(&self) -> Option<&BodyId> {
        self.tracking.target()
    }

    pub fn camera(&self) -> &CameraTransformUpdater {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CameraTransformUpdater {
        &mut self.camera
    }

    pub fn handle(
        &mut self,
        command: Command,
        positions: &dyn PositionSource,
    ) -> Result<(), EngineError> {
        match command {
            Command::SelectTarget(target) => self.select_target(target, positions),
            Command::SetPrecision(settings) => self.set_precision(settings),
            Command::Reset => {
                self.reset();
                Ok(())
            }
        }
    }

    /// Arm tracking on `target`, or disarm with `None`.
    ///
    /// Selecting a body while another is tracked starts a fresh session from
    /// the current camera pose. An unknown body leaves everything unchanged.
    pub fn select_target(
        &mut self,
        target: Option<BodyId>,
        positions: &dyn PositionSource,
    ) -> Result<(), EngineError> {
        let Some(target) = target else {
            if !self.tracking.disarm() {
                debug!("Already idle");
            }
            return Ok(());
        };

        let position = positions
            .position_of(&target)
            .ok_or_else(|| EngineError::UnknownBody(target.clone()))?;

        let mut pose = *self.camera.active_pose();
        if self.align_on_select {
            let reference = positions
                .position_of(&self.reference)
                .ok_or_else(|| EngineError::UnknownBody(self.reference.clone()))?;
            pose = self.aligned_pose(pose, reference, position);
        }
        pose.look_at = position;
        self.camera.apply_to_active(pose);

        self.tracking.arm(target, position, self.backend.stepper());
        Ok(())
    }

    /// Turn the camera about the reference body so its horizontal direction
    /// matches the target's
    fn aligned_pose(&self, pose: CameraPose, reference: Vector3, target: Vector3) -> CameraPose {
        let from = (pose.position - reference).with_z(0.0);
        let to = (target - reference).with_z(0.0);
        let rotation = self.backend.rotation_between(from, to);
        CameraPose {
            position: reference + self.backend.apply_rotation(pose.position - reference, &rotation),
            up: self.backend.apply_rotation(pose.up, &rotation),
            look_at: pose.look_at,
        }
    }

    /// Validate `settings` and use them for sessions armed from now on.
    /// A running session keeps the backend it was armed with.
    pub fn set_precision(&mut self, settings: PrecisionSettings) -> Result<(), EngineError> {
        let backend = PrecisionBackend::new(&settings)?;
        if self.tracking.is_tracking() {
            info!(precision = %settings.mode, "Precision change applies to the next session");
        } else {
            info!(precision = %settings.mode, "Precision changed");
        }
        self.precision = settings;
        self.backend = backend;
        Ok(())
    }

    /// Restore the initial camera pose without stopping tracking
    pub fn reset(&mut self) {
        self.camera.reset_to_initial();
    }

    /// Advance tracking by one frame.
    ///
    /// Returns `Ok(None)` while idle. Missing samples for the target or the
    /// reference body are reported before anything is modified.
    pub fn tick(&mut self, positions: &dyn PositionSource) -> Result<Option<TickReport>, EngineError> {
        let Some(target) = self.tracking.target().cloned() else {
            return Ok(None);
        };

        let reference = positions.position_of(&self.reference).ok_or_else(|| {
            warn!(body = %self.reference, "No position sample for reference body");
            EngineError::UnknownBody(self.reference.clone())
        })?;
        let current = positions.position_of(&target).ok_or_else(|| {
            warn!(body = %target, "No position sample for tracked body");
            EngineError::UnknownBody(target.clone())
        })?;

        let camera = *self.camera.active_pose();
        let Some((outcome, tick)) = self.tracking.advance(reference, current, camera) else {
            return Ok(None);
        };

        let written_to = self.camera.active_target();
        self.camera.apply_pose(outcome.pose, written_to);

        Ok(Some(TickReport {
            target,
            tick,
            rotation: outcome.rotation,
            scale: outcome.scale,
            degenerate: outcome.degenerate.is_some(),
            pose: outcome.pose,
            written_to,
        }))
    }
}

impl std::fmt::Debug for TrackingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackingEngine")
            .field("reference", &self.reference)
            .field("precision", &self.precision)
            .field("tracking", &self.tracking)
            .field("camera", &self.camera)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel;
    use crate::orbit::{OrbitalElements, Orrery};
    use crate::precision::{Arithmetic, DecimalArithmetic, PrecisionMode, DEFAULT_DIGITS, MIN_DIGITS};
    use std::collections::HashMap;

    const EPSILON: f64 = 1e-9;

    fn positions(target: Vector3) -> HashMap<BodyId, Vector3> {
        HashMap::from([
            (BodyId::from("sun"), Vector3::ZERO),
            (BodyId::from("neptune"), target),
        ])
    }

    fn engine() -> TrackingEngine {
        TrackingEngine::new(&EngineConfig::default()).unwrap()
    }

    fn neptune() -> Option<BodyId> {
        Some(BodyId::from("neptune"))
    }

    #[test]
    fn test_idle_tick_does_nothing() {
        let mut engine = engine();
        assert_eq!(engine.tick(&positions(Vector3::X)).unwrap(), None);
        assert_eq!(engine.camera().primary(), &CameraPose::default());
    }

    #[test]
    fn test_quarter_orbit_scenario() {
        let mut engine = engine();
        engine
            .handle(Command::SelectTarget(neptune()), &positions(Vector3::new(10.0, 0.0, 0.0)))
            .unwrap();

        let report = engine
            .tick(&positions(Vector3::new(0.0, 10.0, 0.0)))
            .unwrap()
            .unwrap();

        assert_eq!(report.tick, 1);
        assert!((report.scale - 1.0).abs() < EPSILON);
        assert!((report.rotation.angle() - std::f64::consts::FRAC_PI_2).abs() < EPSILON);
        assert!(report.pose.position.distance(Vector3::new(90.0, 0.0, 30.0)) < EPSILON);
        assert_eq!(report.pose.look_at, Vector3::new(0.0, 10.0, 0.0));
        assert_eq!(engine.camera().primary(), &report.pose);
        assert_eq!(report.written_to, PoseTarget::Camera);
    }

    #[test]
    fn test_radius_doubling_scenario() {
        let mut engine = engine();
        engine
            .select_target(neptune(), &positions(Vector3::new(10.0, 0.0, 0.0)))
            .unwrap();
        let before = engine.camera().primary().position;

        let report = engine
            .tick(&positions(Vector3::new(20.0, 0.0, 0.0)))
            .unwrap()
            .unwrap();

        assert!(report.rotation.is_identity(EPSILON));
        assert!((report.scale - 2.0).abs() < EPSILON);
        assert!((report.pose.position.length() - 2.0 * before.length()).abs() < EPSILON);
    }

    #[test]
    fn test_select_none_is_idempotent() {
        let mut engine = engine();
        let samples = positions(Vector3::new(10.0, 0.0, 0.0));
        engine.select_target(neptune(), &samples).unwrap();
        engine.tick(&positions(Vector3::new(0.0, 10.0, 0.0))).unwrap();

        engine.handle(Command::SelectTarget(None), &samples).unwrap();
        let pose = *engine.camera().primary();
        engine.handle(Command::SelectTarget(None), &samples).unwrap();

        assert!(!engine.tracking().is_tracking());
        assert_eq!(engine.camera().primary(), &pose);
        assert_eq!(engine.tick(&samples).unwrap(), None);
    }

    #[test]
    fn test_unknown_target_leaves_state_unchanged() {
        let mut engine = engine();
        let samples = positions(Vector3::new(10.0, 0.0, 0.0));
        engine.select_target(neptune(), &samples).unwrap();

        let err = engine
            .select_target(Some(BodyId::from("vulcan")), &samples)
            .unwrap_err();

        assert_eq!(err, EngineError::UnknownBody(BodyId::from("vulcan")));
        assert_eq!(engine.target(), neptune().as_ref());
    }

    #[test]
    fn test_missing_sample_does_not_advance_session() {
        let mut engine = engine();
        engine
            .select_target(neptune(), &positions(Vector3::new(10.0, 0.0, 0.0)))
            .unwrap();

        let only_sun = HashMap::from([(BodyId::from("sun"), Vector3::ZERO)]);
        assert!(matches!(engine.tick(&only_sun), Err(EngineError::UnknownBody(_))));

        let session = engine.tracking().session().unwrap();
        assert_eq!(session.ticks(), 0);
        assert_eq!(session.previous_target_position(), Vector3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn test_target_at_reference_is_steady_state() {
        let mut engine = engine();
        engine.select_target(neptune(), &positions(Vector3::ZERO)).unwrap();
        let before = engine.camera().primary().position;

        for _ in 0..3 {
            let report = engine.tick(&positions(Vector3::ZERO)).unwrap().unwrap();
            assert!(report.degenerate);
        }

        assert_eq!(engine.camera().primary().position, before);
        assert_eq!(engine.tracking().session().unwrap().ticks(), 3);
    }

    #[test]
    fn test_switching_target_keeps_camera_pose() {
        let mut engine = engine();
        let mut samples = positions(Vector3::new(10.0, 0.0, 0.0));
        samples.insert(BodyId::from("earth"), Vector3::new(0.0, 1.0, 0.0));
        engine.select_target(neptune(), &samples).unwrap();

        samples.insert(BodyId::from("neptune"), Vector3::new(0.0, 10.0, 0.0));
        engine.tick(&samples).unwrap();
        let position = engine.camera().primary().position;

        engine.select_target(Some(BodyId::from("earth")), &samples).unwrap();

        assert_eq!(engine.camera().primary().position, position);
        assert_eq!(engine.camera().primary().look_at, Vector3::new(0.0, 1.0, 0.0));
        assert_eq!(engine.tracking().session().unwrap().ticks(), 0);
    }

    #[test]
    fn test_reset_keeps_tracking() {
        let mut engine = engine();
        engine
            .select_target(neptune(), &positions(Vector3::new(10.0, 0.0, 0.0)))
            .unwrap();
        engine.tick(&positions(Vector3::new(0.0, 10.0, 0.0))).unwrap();

        engine.handle(Command::Reset, &positions(Vector3::ZERO)).unwrap();

        assert_eq!(engine.camera().primary(), &CameraPose::default());
        assert!(engine.tracking().is_tracking());
    }

    #[test]
    fn test_precision_applies_to_next_session() {
        let mut engine = engine();
        let samples = positions(Vector3::new(10.0, 0.0, 0.0));
        engine.select_target(neptune(), &samples).unwrap();

        engine
            .set_precision(PrecisionSettings::high_precision(MIN_DIGITS))
            .unwrap();
        assert_eq!(
            engine.tracking().session().unwrap().precision(),
            PrecisionMode::Standard
        );

        engine.select_target(neptune(), &samples).unwrap();
        assert_eq!(
            engine.tracking().session().unwrap().precision(),
            PrecisionMode::HighPrecision
        );
    }

    #[test]
    fn test_invalid_precision_rejected() {
        let mut engine = engine();
        let err = engine
            .handle(
                Command::SetPrecision(PrecisionSettings::high_precision(3)),
                &positions(Vector3::X),
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::Precision(_)));
        assert_eq!(engine.precision(), &PrecisionSettings::standard());

        let mut config = EngineConfig::default();
        config.precision = PrecisionSettings::high_precision(500);
        assert!(TrackingEngine::new(&config).is_err());
    }

    #[test]
    fn test_ghost_camera_receives_tracking() {
        let mut config = EngineConfig::default();
        config.camera.ghost = true;
        let mut engine = TrackingEngine::new(&config).unwrap();

        engine
            .select_target(neptune(), &positions(Vector3::new(10.0, 0.0, 0.0)))
            .unwrap();
        let report = engine
            .tick(&positions(Vector3::new(0.0, 10.0, 0.0)))
            .unwrap()
            .unwrap();

        assert_eq!(report.written_to, PoseTarget::Ghost);
        assert_eq!(engine.camera().ghost(), Some(&report.pose));
        assert_eq!(engine.camera().primary().position, CameraPose::default().position);
    }

    #[test]
    fn test_align_on_select() {
        let mut config = EngineConfig::default();
        config.engine.align_on_select = true;
        let mut engine = TrackingEngine::new(&config).unwrap();

        engine
            .select_target(neptune(), &positions(Vector3::new(30.0, 0.0, 2.0)))
            .unwrap();

        // (0, -90, 30) turned so its horizontal part points along +X
        let pose = engine.camera().primary();
        assert!(pose.position.distance(Vector3::new(90.0, 0.0, 30.0)) < EPSILON);
        assert!(pose.up.distance(Vector3::Z) < EPSILON);
        assert_eq!(pose.look_at, Vector3::new(30.0, 0.0, 2.0));
    }

    #[test]
    fn test_up_vector_follows_inclined_orbit() {
        let mut engine = engine();
        let tilt = 0.3_f64;
        let orbit = |angle: f64| {
            Vector3::new(
                10.0 * angle.cos(),
                10.0 * angle.sin() * tilt.cos(),
                10.0 * angle.sin() * tilt.sin(),
            )
        };
        let normal = Vector3::new(0.0, -tilt.sin(), tilt.cos());

        engine.select_target(neptune(), &positions(orbit(0.0))).unwrap();
        let up_before = engine.camera().primary().up;

        for step in 1..=200 {
            engine.tick(&positions(orbit(step as f64 * 0.01))).unwrap();
        }

        // Up keeps its angle to the orbit normal instead of drifting
        let up_after = engine.camera().primary().up;
        assert!((up_after.length() - 1.0).abs() < EPSILON);
        assert!((up_after.dot(normal) - up_before.dot(normal)).abs() < EPSILON);
    }

    fn track_orbit(
        settings: PrecisionSettings,
        orrery: &mut Orrery,
        ticks: usize,
        dt: f64,
    ) -> Vec<CameraPose> {
        let config = EngineConfig {
            precision: settings,
            ..EngineConfig::default()
        };
        let mut engine = TrackingEngine::new(&config).unwrap();
        orrery.set_time(0.0);
        engine.select_target(neptune(), &*orrery).unwrap();

        (0..ticks)
            .map(|_| {
                orrery.advance(dt);
                engine.tick(&*orrery).unwrap().unwrap().pose
            })
            .collect()
    }

    /// Camera position after following the target from time 0 to `t`,
    /// computed as one rotation plus one scale with decimal arithmetic
    fn closed_form_position(orrery: &mut Orrery, t: f64) -> Vector3 {
        let ar = DecimalArithmetic::new(DEFAULT_DIGITS).unwrap();
        let neptune = BodyId::from("neptune");

        orrery.set_time(0.0);
        let d0 = kernel::lift_vector(&ar, orrery.position_of(&neptune).unwrap());
        orrery.set_time(t);
        let dn = kernel::lift_vector(&ar, orrery.position_of(&neptune).unwrap());

        let rotation = kernel::rotation_between(&ar, &d0, &dn);
        let scale = ar.div(&kernel::length(&ar, &dn), &kernel::length(&ar, &d0));
        let camera = kernel::lift_vector(&ar, CameraPose::default().position);
        let rotated = kernel::apply_rotation(&ar, &camera, &rotation);
        kernel::lower_vector(&ar, &kernel::scale(&ar, &rotated, &scale))
    }

    #[test]
    fn test_backends_agree_and_high_precision_drifts_less() {
        const TICKS: usize = 1000;
        // A third of a revolution over the run
        let dt = 1.0;
        let mut orrery = Orrery::new("sun", Vector3::ZERO)
            .with_body("neptune", OrbitalElements::circular(30.0, 0.4, 3000.0));

        let standard = track_orbit(PrecisionSettings::standard(), &mut orrery, TICKS, dt);
        let high = track_orbit(
            PrecisionSettings::high_precision(MIN_DIGITS + 20),
            &mut orrery,
            TICKS,
            dt,
        );

        let first = standard[0].position;
        assert!(first.distance(high[0].position) <= 1e-6 * first.length());

        let expected = closed_form_position(&mut orrery, TICKS as f64 * dt);
        let standard_error = standard[TICKS - 1].position.distance(expected);
        let high_error = high[TICKS - 1].position.distance(expected);

        assert!(standard_error < 1e-6);
        assert!(
            high_error <= standard_error,
            "high precision error {high_error:e} exceeds standard error {standard_error:e}"
        );
    }
}

