//! Tracking state machine
//!
//! `Idle` or `Tracking(session)`. A session remembers the tracked body's
//! position from the previous tick and owns the pose stepper of the
//! precision backend chosen when it was armed.

use tracing::{debug, info, warn};

use crate::body::BodyId;
use crate::camera::CameraPose;
use crate::math::Vector3;
use crate::precision::PrecisionMode;
use crate::recurrence::{PoseStepper, TickInput, TickOutcome};

/// State of one tracked body
pub struct TrackingSession {
    target: BodyId,
    previous_target_position: Vector3,
    stepper: Box<dyn PoseStepper>,
    ticks: u64,
}

impl TrackingSession {
    pub fn target(&self) -> &BodyId {
        &self.target
    }

    pub fn previous_target_position(&self) -> Vector3 {
        self.previous_target_position
    }

    pub fn precision(&self) -> PrecisionMode {
        self.stepper.mode()
    }

    /// Ticks completed since the session was armed
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

impl std::fmt::Debug for TrackingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackingSession")
            .field("target", &self.target)
            .field("previous_target_position", &self.previous_target_position)
            .field("precision", &self.stepper.mode())
            .field("ticks", &self.ticks)
            .finish()
    }
}

#[derive(Debug, Default)]
pub enum TrackingState {
    #[default]
    Idle,
    Tracking(TrackingSession),
}

#[derive(Debug, Default)]
pub struct TrackingStateMachine {
    state: TrackingState,
}

impl TrackingStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &TrackingState {
        &self.state
    }

    pub fn session(&self) -> Option<&TrackingSession> {
        match &self.state {
            TrackingState::Tracking(session) => Some(session),
            TrackingState::Idle => None,
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.session().is_some()
    }

    pub fn target(&self) -> Option<&BodyId> {
        self.session().map(|s| &s.target)
    }

    /// Start a fresh session on `target`, replacing any current one
    pub fn arm(&mut self, target: BodyId, position: Vector3, stepper: Box<dyn PoseStepper>) {
        if let TrackingState::Tracking(previous) = &self.state {
            debug!(
                previous = %previous.target,
                ticks = previous.ticks,
                "Discarding tracking session"
            );
        }
        info!(body = %target, precision = %stepper.mode(), "Tracking armed");
        self.state = TrackingState::Tracking(TrackingSession {
            target,
            previous_target_position: position,
            stepper,
            ticks: 0,
        });
    }

    /// Return to `Idle`. Returns whether a session was discarded.
    pub fn disarm(&mut self) -> bool {
        match std::mem::take(&mut self.state) {
            TrackingState::Tracking(session) => {
                info!(body = %session.target, ticks = session.ticks, "Tracking disarmed");
                true
            }
            TrackingState::Idle => false,
        }
    }

    /// Run one tick of the recurrence for the current session.
    ///
    /// The previous sample always advances to `current_target`, including on
    /// a degenerate tick, so the same zero-length delta is not replayed.
    /// Returns `None` when idle.
    pub fn advance(
        &mut self,
        reference: Vector3,
        current_target: Vector3,
        camera: CameraPose,
    ) -> Option<(TickOutcome, u64)> {
        let TrackingState::Tracking(session) = &mut self.state else {
            return None;
        };

        let outcome = session.stepper.step(&TickInput {
            reference,
            previous_target: session.previous_target_position,
            current_target,
            camera,
        });

        session.previous_target_position = current_target;
        session.ticks += 1;

        if let Some(err) = outcome.degenerate {
            warn!(body = %session.target, tick = session.ticks, "{}; camera held for this tick", err);
        } else {
            debug!(
                body = %session.target,
                tick = session.ticks,
                angle = outcome.rotation.angle(),
                scale = outcome.scale,
                "Tracking tick"
            );
        }

        Some((outcome, session.ticks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::precision::{PrecisionBackend, PrecisionSettings};

    fn stepper() -> Box<dyn PoseStepper> {
        PrecisionBackend::new(&PrecisionSettings::standard()).unwrap().stepper()
    }

    #[test]
    fn test_idle_does_not_advance() {
        let mut machine = TrackingStateMachine::new();
        assert!(!machine.is_tracking());
        assert!(machine
            .advance(Vector3::ZERO, Vector3::X, CameraPose::default())
            .is_none());
    }

    #[test]
    fn test_arm_captures_initial_sample() {
        let mut machine = TrackingStateMachine::new();
        machine.arm(BodyId::from("neptune"), Vector3::new(30.0, 0.0, 0.0), stepper());

        let session = machine.session().unwrap();
        assert_eq!(session.target().as_str(), "neptune");
        assert_eq!(session.previous_target_position(), Vector3::new(30.0, 0.0, 0.0));
        assert_eq!(session.ticks(), 0);
        assert_eq!(session.precision(), PrecisionMode::Standard);
    }

    #[test]
    fn test_tick_replaces_previous_sample() {
        let mut machine = TrackingStateMachine::new();
        machine.arm(BodyId::from("earth"), Vector3::new(1.0, 0.0, 0.0), stepper());

        let next = Vector3::new(0.0, 1.0, 0.0);
        let (_, tick) = machine.advance(Vector3::ZERO, next, CameraPose::default()).unwrap();

        assert_eq!(tick, 1);
        assert_eq!(machine.session().unwrap().previous_target_position(), next);
    }

    #[test]
    fn test_degenerate_tick_still_advances_sample() {
        let mut machine = TrackingStateMachine::new();
        machine.arm(BodyId::from("earth"), Vector3::ZERO, stepper());

        let next = Vector3::new(2.0, 0.0, 0.0);
        let (outcome, _) = machine.advance(Vector3::ZERO, next, CameraPose::default()).unwrap();
        assert!(outcome.degenerate.is_some());
        assert_eq!(machine.session().unwrap().previous_target_position(), next);

        let (outcome, _) = machine
            .advance(Vector3::ZERO, Vector3::new(0.0, 2.0, 0.0), CameraPose::default())
            .unwrap();
        assert!(outcome.degenerate.is_none());
    }

    #[test]
    fn test_switching_target_starts_fresh_session() {
        let mut machine = TrackingStateMachine::new();
        machine.arm(BodyId::from("earth"), Vector3::X, stepper());
        machine.advance(Vector3::ZERO, Vector3::Y, CameraPose::default());

        machine.arm(BodyId::from("mars"), Vector3::new(0.0, 0.0, 1.5), stepper());

        let session = machine.session().unwrap();
        assert_eq!(session.target().as_str(), "mars");
        assert_eq!(session.ticks(), 0);
        assert_eq!(session.previous_target_position(), Vector3::new(0.0, 0.0, 1.5));
    }

    #[test]
    fn test_disarm_is_idempotent() {
        let mut machine = TrackingStateMachine::new();
        machine.arm(BodyId::from("earth"), Vector3::X, stepper());
        assert!(machine.disarm());
        assert!(!machine.disarm());
        assert!(!machine.is_tracking());
    }
}
