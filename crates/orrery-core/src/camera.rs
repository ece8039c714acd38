//! Camera pose storage and the transform updater

use tracing::debug;

use crate::math::Vector3;

/// Position, up-vector and look-at point of a camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Vector3,
    pub up: Vector3,
    /// Point the orbit controls look at
    pub look_at: Vector3,
}

impl CameraPose {
    pub fn new(position: Vector3, up: Vector3, look_at: Vector3) -> Self {
        Self {
            position,
            up,
            look_at,
        }
    }

    /// Distance of the camera from `point`
    pub fn distance_to(&self, point: Vector3) -> f64 {
        self.position.distance(point)
    }
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            position: Vector3::new(0.0, -90.0, 30.0),
            up: Vector3::Z,
            look_at: Vector3::ZERO,
        }
    }
}

/// Which camera receives pose writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PoseTarget {
    /// The active render camera
    #[default]
    Camera,
    /// Decoupled proxy that can be moved independently and synced back
    Ghost,
}

/// Consumer of pose changes (direction arrows, orientation outlines)
pub trait PoseObserver: Send + Sync {
    fn pose_changed(&mut self, target: PoseTarget, pose: &CameraPose);
}

/// Owns the primary camera pose and the optional ghost pose, and notifies
/// observers whenever either is written.
pub struct CameraTransformUpdater {
    initial: CameraPose,
    primary: CameraPose,
    ghost: Option<CameraPose>,
    active: PoseTarget,
    dirty: bool,
    observers: Vec<Box<dyn PoseObserver>>,
}

impl CameraTransformUpdater {
    /// Create an updater with the primary camera at `initial`
    pub fn new(initial: CameraPose) -> Self {
        Self {
            initial,
            primary: initial,
            ghost: None,
            active: PoseTarget::Camera,
            dirty: true,
            observers: Vec::new(),
        }
    }

    pub fn initial(&self) -> &CameraPose {
        &self.initial
    }

    pub fn set_initial(&mut self, initial: CameraPose) {
        self.initial = initial;
    }

    pub fn primary(&self) -> &CameraPose {
        &self.primary
    }

    pub fn ghost(&self) -> Option<&CameraPose> {
        self.ghost.as_ref()
    }

    pub fn active_target(&self) -> PoseTarget {
        self.active
    }

    /// Pose that tracking reads and writes
    pub fn active_pose(&self) -> &CameraPose {
        match (self.active, &self.ghost) {
            (PoseTarget::Ghost, Some(ghost)) => ghost,
            _ => &self.primary,
        }
    }

    /// Write `pose` to `target`. Writing the ghost creates it if needed.
    pub fn apply_pose(&mut self, pose: CameraPose, target: PoseTarget) {
        match target {
            PoseTarget::Camera => self.primary = pose,
            PoseTarget::Ghost => self.ghost = Some(pose),
        }
        self.dirty = true;
        for observer in &mut self.observers {
            observer.pose_changed(target, &pose);
        }
    }

    pub fn apply_to_active(&mut self, pose: CameraPose) {
        self.apply_pose(pose, self.active);
    }

    /// Restore the configured initial pose on the primary camera (and the
    /// ghost, if there is one). Tracking state is not touched.
    pub fn reset_to_initial(&mut self) {
        debug!("Resetting camera to initial pose");
        let initial = self.initial;
        if self.ghost.is_some() {
            self.apply_pose(initial, PoseTarget::Ghost);
        }
        self.apply_pose(initial, PoseTarget::Camera);
    }

    /// Create the ghost as a copy of the primary camera and route writes to it
    pub fn enable_ghost(&mut self) {
        if self.ghost.is_none() {
            self.apply_pose(self.primary, PoseTarget::Ghost);
        }
        self.active = PoseTarget::Ghost;
    }

    /// Drop the ghost and route writes back to the primary camera
    pub fn disable_ghost(&mut self) {
        self.ghost = None;
        self.active = PoseTarget::Camera;
        self.dirty = true;
    }

    pub fn set_active_target(&mut self, target: PoseTarget) {
        match target {
            PoseTarget::Ghost => self.enable_ghost(),
            PoseTarget::Camera => self.active = PoseTarget::Camera,
        }
    }

    /// Copy the ghost pose onto the primary camera
    pub fn sync_ghost(&mut self) -> bool {
        match self.ghost {
            Some(ghost) => {
                self.apply_pose(ghost, PoseTarget::Camera);
                true
            }
            None => false,
        }
    }

    pub fn add_observer(&mut self, observer: Box<dyn PoseObserver>) {
        self.observers.push(observer);
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Return and clear the dirty flag
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

impl std::fmt::Debug for CameraTransformUpdater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraTransformUpdater")
            .field("initial", &self.initial)
            .field("primary", &self.primary)
            .field("ghost", &self.ghost)
            .field("active", &self.active)
            .field("dirty", &self.dirty)
            .field("observers", &self.observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default, Clone)]
    struct Recorder(Arc<Mutex<Vec<(PoseTarget, CameraPose)>>>);

    impl PoseObserver for Recorder {
        fn pose_changed(&mut self, target: PoseTarget, pose: &CameraPose) {
            self.0.lock().unwrap().push((target, *pose));
        }
    }

    fn moved() -> CameraPose {
        CameraPose::new(Vector3::new(1.0, 2.0, 3.0), Vector3::Y, Vector3::ZERO)
    }

    #[test]
    fn test_apply_pose_notifies_and_marks_dirty() {
        let recorder = Recorder::default();
        let mut updater = CameraTransformUpdater::new(CameraPose::default());
        updater.add_observer(Box::new(recorder.clone()));
        assert!(updater.take_dirty());
        assert!(!updater.is_dirty());

        updater.apply_pose(moved(), PoseTarget::Camera);

        assert!(updater.is_dirty());
        assert_eq!(updater.primary(), &moved());
        assert_eq!(recorder.0.lock().unwrap().as_slice(), &[(PoseTarget::Camera, moved())]);
    }

    #[test]
    fn test_ghost_receives_active_writes() {
        let mut updater = CameraTransformUpdater::new(CameraPose::default());
        updater.enable_ghost();
        assert_eq!(updater.active_target(), PoseTarget::Ghost);

        updater.apply_to_active(moved());

        assert_eq!(updater.ghost(), Some(&moved()));
        assert_eq!(updater.primary(), &CameraPose::default());
        assert_eq!(updater.active_pose(), &moved());

        assert!(updater.sync_ghost());
        assert_eq!(updater.primary(), &moved());
    }

    #[test]
    fn test_disable_ghost_routes_back_to_primary() {
        let mut updater = CameraTransformUpdater::new(CameraPose::default());
        updater.set_active_target(PoseTarget::Ghost);
        updater.disable_ghost();
        assert!(updater.ghost().is_none());
        assert!(!updater.sync_ghost());

        updater.apply_to_active(moved());
        assert_eq!(updater.primary(), &moved());
    }

    #[test]
    fn test_reset_to_initial() {
        let mut updater = CameraTransformUpdater::new(CameraPose::default());
        updater.apply_pose(moved(), PoseTarget::Camera);
        updater.enable_ghost();

        updater.reset_to_initial();

        assert_eq!(updater.primary(), &CameraPose::default());
        assert_eq!(updater.ghost(), Some(&CameraPose::default()));
    }
}
