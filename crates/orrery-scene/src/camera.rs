//! Camera markers and pose write-back

use bevy::prelude::*;
use orrery_core::CameraPose;

use crate::tracking::{Tracker, TrackingSet};
use crate::types::to_vec3;

/// Marker component for the render camera
#[derive(Component)]
pub struct MainCamera;

/// Marker component for the ghost camera proxy
#[derive(Component)]
pub struct GhostCamera;

/// Marker component for the arrow showing where the tracked camera looks
#[derive(Component)]
pub struct CameraDirectionArrow;

/// Plugin that copies engine poses into camera transforms
pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (write_camera_transforms, update_direction_arrow)
                .chain()
                .in_set(TrackingSet::Write),
        );
    }
}

/// Transform placing a camera at the pose, looking at its look-at point
pub fn pose_transform(pose: &CameraPose) -> Transform {
    Transform::from_translation(to_vec3(pose.position))
        .looking_at(to_vec3(pose.look_at), to_vec3(pose.up))
}

fn write_camera_transforms(
    mut tracker: ResMut<Tracker>,
    mut main_camera: Query<&mut Transform, (With<MainCamera>, Without<GhostCamera>)>,
    mut ghost_cameras: Query<&mut Transform, (With<GhostCamera>, Without<MainCamera>)>,
) {
    let Ok(mut transform) = main_camera.single_mut() else {
        return;
    };
    if !tracker.camera_mut().take_dirty() {
        return;
    }

    let camera = tracker.camera();
    *transform = pose_transform(camera.primary());

    if let Some(ghost) = camera.ghost() {
        for mut transform in &mut ghost_cameras {
            *transform = pose_transform(ghost);
        }
    }
}

/// Place the arrow at the look-at point, pointing along the view direction
/// of the camera that tracking writes to
fn update_direction_arrow(
    tracker: Res<Tracker>,
    mut arrows: Query<&mut Transform, With<CameraDirectionArrow>>,
) {
    if !tracker.is_changed() {
        return;
    }

    let pose = tracker.camera().active_pose();
    let direction = to_vec3(pose.look_at - pose.position).normalize_or_zero();
    if direction == Vec3::ZERO {
        return;
    }

    for mut transform in &mut arrows {
        transform.translation = to_vec3(pose.look_at);
        transform.rotation = Quat::from_rotation_arc(Vec3::Y, direction);
    }
}
