//! Engine configuration loading and validation

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::body::BodyId;
use crate::camera::CameraPose;
use crate::precision::{PrecisionBackend, PrecisionError, PrecisionSettings};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to serialize configuration: {0}")]
    SerializeError(#[from] toml::ser::Error),
    #[error("Invalid precision settings: {0}")]
    Precision(#[from] PrecisionError),
}

/// Tracking engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub engine: TrackingConfig,
    #[serde(default)]
    pub precision: PrecisionSettings,
    #[serde(default)]
    pub camera: CameraConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Body kept fixed while another is tracked
    #[serde(default = "default_reference_body")]
    pub reference_body: String,
    /// Turn the camera toward the target's horizontal direction when a
    /// target is selected
    #[serde(default)]
    pub align_on_select: bool,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            reference_body: default_reference_body(),
            align_on_select: false,
        }
    }
}

fn default_reference_body() -> String {
    "sun".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Camera position restored by a reset
    #[serde(default = "default_initial_position")]
    pub initial_position: [f64; 3],
    #[serde(default = "default_initial_up")]
    pub initial_up: [f64; 3],
    #[serde(default)]
    pub initial_look_at: [f64; 3],
    /// Route tracking writes to a ghost camera instead of the render camera
    #[serde(default)]
    pub ghost: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            initial_position: default_initial_position(),
            initial_up: default_initial_up(),
            initial_look_at: [0.0; 3],
            ghost: false,
        }
    }
}

fn default_initial_position() -> [f64; 3] {
    [0.0, -90.0, 30.0]
}

fn default_initial_up() -> [f64; 3] {
    [0.0, 0.0, 1.0]
}

impl CameraConfig {
    pub fn initial_pose(&self) -> CameraPose {
        CameraPose::new(
            self.initial_position.into(),
            self.initial_up.into(),
            self.initial_look_at.into(),
        )
    }
}

impl EngineConfig {
    pub fn reference_body(&self) -> BodyId {
        BodyId::new(self.engine.reference_body.clone())
    }

    /// Load configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        PrecisionBackend::new(&self.precision)?;
        Ok(())
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load configuration from file, falling back to defaults if missing
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let config = Self::from_file(path)?;
            info!(path = %path.display(), "Loaded engine configuration");
            Ok(config)
        } else {
            info!(
                path = %path.display(),
                "Engine configuration not found, using defaults"
            );
            Ok(Self::default())
        }
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save default configuration to file
    pub fn save_default(path: &Path) -> Result<(), ConfigError> {
        std::fs::write(path, Self::default().to_toml()?)?;
        Ok(())
    }
}
