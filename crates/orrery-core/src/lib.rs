//! Orrery Core - Camera tracking engine and precision rotation kernel
//!
//! This crate provides the headless part of the Orrery viewer:
//! - Vector and unit quaternion types shared with hosts
//! - Rotation kernel generic over machine or arbitrary-precision arithmetic
//! - Camera pose recurrence that follows a body around a reference body
//! - Tracking state machine, camera transform updater and engine commands
//! - TOML configuration and a Keplerian orbit sampler

pub mod body;
pub mod camera;
pub mod config;
pub mod engine;
pub mod kernel;
pub mod math;
pub mod orbit;
pub mod precision;
pub mod recurrence;
pub mod tracking;

pub use body::{BodyId, PositionSource};
pub use camera::{CameraPose, CameraTransformUpdater, PoseObserver, PoseTarget};
pub use config::{CameraConfig, ConfigError, EngineConfig, TrackingConfig};
pub use engine::{Command, EngineError, TickReport, TrackingEngine};
pub use kernel::DegenerateVector;
pub use math::{UnitQuaternion, Vector3};
pub use orbit::{OrbitalElements, Orrery};
pub use precision::{PrecisionBackend, PrecisionError, PrecisionMode, PrecisionSettings};
pub use tracking::{TrackingSession, TrackingState, TrackingStateMachine};
