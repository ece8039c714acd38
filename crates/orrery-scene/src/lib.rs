//! Orrery Scene - Bevy integration of the camera tracking engine
//!
//! Hosts write body positions into [`BodyPositions`] each frame and send
//! [`TrackingCommand`] messages; the plugin ticks the engine and writes the
//! resulting pose into the `MainCamera` (or `GhostCamera`) transform.

pub mod camera;
pub mod tracking;
pub mod types;

use bevy::prelude::*;
use orrery_core::{EngineConfig, TrackingEngine};
use tracing::error;

/// Plugin that installs the tracking engine and its systems
#[derive(Default)]
pub struct OrreryScenePlugin {
    pub config: EngineConfig,
}

impl Plugin for OrreryScenePlugin {
    fn build(&self, app: &mut App) {
        let engine = TrackingEngine::new(&self.config).or_else(|err| {
            error!(%err, "Invalid tracking configuration, using defaults");
            TrackingEngine::new(&EngineConfig::default())
        });
        let Ok(engine) = engine else {
            error!("Tracking engine unavailable");
            return;
        };

        app.insert_resource(tracking::Tracker(engine))
            .add_plugins(tracking::TrackingPlugin)
            .add_plugins(camera::CameraPlugin);
    }
}

// Re-export commonly used types
pub use camera::{CameraDirectionArrow, GhostCamera, MainCamera};
pub use tracking::{BodyPositions, Tracker, TrackingCommand, TrackingSet, TrackingStatus};
pub use types::CelestialBody;
