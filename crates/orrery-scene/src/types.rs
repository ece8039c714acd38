//! Scene components shared by hosts

use bevy::prelude::*;
use orrery_core::BodyId;

/// A rendered celestial body. Its position is published to
/// [`BodyPositions`](crate::BodyPositions) by the host in `f64`.
#[derive(Component, Debug, Clone)]
pub struct CelestialBody {
    pub id: BodyId,
    pub label: String,
}

impl CelestialBody {
    pub fn new(id: impl Into<BodyId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Convert an engine vector to a render vector
pub fn to_vec3(v: orrery_core::Vector3) -> Vec3 {
    Vec3::new(v.x as f32, v.y as f32, v.z as f32)
}
