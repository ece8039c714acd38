//! Per-tick camera transform recurrence
//!
//! Given the reference body `S`, the tracked body's previous and current
//! positions, and the camera pose, one tick computes:
//!
//! ```text
//! d_old = P_old - S            d_new = P_new - S
//! q     = rotation_between(d_old, d_new)
//! scale = |d_new| / |d_old|
//! C'    = S + rotate(C - S, q) * scale
//! U'    = rotate(U, q)
//! ```
//!
//! The up-vector receives the same rotation as the position. Rotating only
//! the position lets camera roll drift away from the orbital plane a little
//! more every tick, which shows up as wobble on inclined orbits.

use tracing::trace;

use crate::camera::CameraPose;
use crate::kernel::{self, DegenerateVector};
use crate::math::{UnitQuaternion, Vector3};
use crate::precision::{Arithmetic, PrecisionMode};

/// Samples for one tick, as `f64` host values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickInput {
    pub reference: Vector3,
    pub previous_target: Vector3,
    pub current_target: Vector3,
    pub camera: CameraPose,
}

/// Result of one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutcome {
    /// New camera pose (`look_at` is the current target position)
    pub pose: CameraPose,
    pub rotation: UnitQuaternion,
    pub scale: f64,
    /// Set when a displacement had zero length and the tick was frozen
    pub degenerate: Option<DegenerateVector>,
}

/// One step of the recurrence in backend scalars
#[derive(Debug, Clone)]
pub struct Advance<S> {
    pub position: Vector3<S>,
    pub up: Vector3<S>,
    pub rotation: UnitQuaternion<S>,
    pub scale: S,
    pub degenerate: Option<DegenerateVector>,
}

/// Advance a camera position and up-vector by the motion of the target
/// about the reference body.
///
/// A zero-length displacement on either side yields the identity rotation
/// and unit scale instead of an error.
pub fn advance<A: Arithmetic>(
    ar: &A,
    reference: &Vector3<A::Scalar>,
    previous_target: &Vector3<A::Scalar>,
    current_target: &Vector3<A::Scalar>,
    position: &Vector3<A::Scalar>,
    up: &Vector3<A::Scalar>,
) -> Advance<A::Scalar> {
    let d_old = kernel::sub(ar, previous_target, reference);
    let d_new = kernel::sub(ar, current_target, reference);

    let directions = kernel::normalize(ar, &d_old)
        .and_then(|old| kernel::normalize(ar, &d_new).map(|new| (old, new)));

    let (rotation, scale) = match &directions {
        Ok((old, new)) => {
            let rotation = kernel::rotation_between_unit(ar, old, new);
            let scale = ar.div(&kernel::length(ar, &d_new), &kernel::length(ar, &d_old));
            (rotation, scale)
        }
        Err(_) => (kernel::identity(ar), ar.one()),
    };

    let relative = kernel::sub(ar, position, reference);
    let rotated = kernel::apply_rotation(ar, &relative, &rotation);
    let position = kernel::add(ar, reference, &kernel::scale(ar, &rotated, &scale));
    let up = kernel::apply_rotation(ar, up, &rotation);

    Advance {
        position,
        up,
        rotation,
        scale,
        degenerate: directions.err(),
    }
}

/// Backend-polymorphic stepping interface used by a tracking session
pub trait PoseStepper: Send + Sync {
    fn mode(&self) -> PrecisionMode;

    fn step(&mut self, input: &TickInput) -> TickOutcome;
}

/// Camera pose kept in backend scalars between ticks, together with the
/// `f64` values it was lowered to when written.
#[derive(Debug, Clone)]
struct CarriedPose<S> {
    position: Vector3<S>,
    up: Vector3<S>,
    written_position: Vector3,
    written_up: Vector3,
}

impl<S> CarriedPose<S> {
    fn matches(&self, camera: &CameraPose) -> bool {
        self.written_position == camera.position && self.written_up == camera.up
    }
}

/// [`PoseStepper`] over one arithmetic.
///
/// Continues from its carried pose while the host camera still holds what
/// the previous tick wrote, so decimal intermediates only reach `f64` at the
/// pose write. Any other host pose is lifted afresh.
pub struct Stepper<A: Arithmetic> {
    ar: A,
    carried: Option<CarriedPose<A::Scalar>>,
}

impl<A: Arithmetic> Stepper<A> {
    pub fn new(ar: A) -> Self {
        Self { ar, carried: None }
    }
}

impl<A: Arithmetic> PoseStepper for Stepper<A> {
    fn mode(&self) -> PrecisionMode {
        self.ar.mode()
    }

    fn step(&mut self, input: &TickInput) -> TickOutcome {
        let ar = &self.ar;

        let (position, up) = match self.carried.take() {
            Some(carried) if carried.matches(&input.camera) => (carried.position, carried.up),
            _ => {
                trace!(mode = %ar.mode(), "Lifting camera pose into backend");
                (
                    kernel::lift_vector(ar, input.camera.position),
                    kernel::lift_vector(ar, input.camera.up),
                )
            }
        };

        let advanced = advance(
            ar,
            &kernel::lift_vector(ar, input.reference),
            &kernel::lift_vector(ar, input.previous_target),
            &kernel::lift_vector(ar, input.current_target),
            &position,
            &up,
        );

        let pose = CameraPose {
            position: kernel::lower_vector(ar, &advanced.position),
            up: kernel::lower_vector(ar, &advanced.up),
            look_at: input.current_target,
        };

        let outcome = TickOutcome {
            pose,
            rotation: kernel::lower_quaternion(ar, &advanced.rotation),
            scale: ar.lower(&advanced.scale),
            degenerate: advanced.degenerate,
        };

        self.carried = Some(CarriedPose {
            position: advanced.position,
            up: advanced.up,
            written_position: pose.position,
            written_up: pose.up,
        });

        outcome
    }
}
