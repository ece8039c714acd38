//! Simulation configuration loading

use anyhow::Result;
use orrery_core::{
    BodyId, CameraConfig, EngineConfig, OrbitalElements, Orrery, PrecisionSettings,
    TrackingConfig,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub engine: TrackingConfig,
    #[serde(default)]
    pub precision: PrecisionSettings,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default = "default_bodies", rename = "body")]
    pub bodies: Vec<BodyConfig>,
    #[serde(default)]
    pub run: RunConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            engine: TrackingConfig::default(),
            precision: PrecisionSettings::default(),
            camera: CameraConfig::default(),
            bodies: default_bodies(),
            run: RunConfig::default(),
        }
    }
}

/// A body orbiting the reference body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyConfig {
    pub id: String,
    #[serde(flatten)]
    pub elements: OrbitalElements,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Body to track
    #[serde(default = "default_target")]
    pub target: String,
    #[serde(default = "default_ticks")]
    pub ticks: u64,
    /// Simulated time per tick, in the unit of the orbital periods
    #[serde(default = "default_dt")]
    pub dt: f64,
    /// Position of the reference body
    #[serde(default)]
    pub reference_position: [f64; 3],
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            target: default_target(),
            ticks: default_ticks(),
            dt: default_dt(),
            reference_position: [0.0; 3],
        }
    }
}

fn default_target() -> String {
    "neptune".to_string()
}

fn default_ticks() -> u64 {
    1000
}

fn default_dt() -> f64 {
    60.0 // days, roughly one Neptune orbit over the default run
}

/// Earth and Neptune in AU and days
fn default_bodies() -> Vec<BodyConfig> {
    vec![
        BodyConfig {
            id: "earth".to_string(),
            elements: OrbitalElements {
                semi_major_axis: 1.0,
                eccentricity: 0.0167,
                inclination: 0.0,
                longitude_ascending: -0.1965,
                argument_periapsis: 1.9933,
                mean_anomaly_epoch: 6.2586,
                period: 365.256,
            },
        },
        BodyConfig {
            id: "neptune".to_string(),
            elements: OrbitalElements {
                semi_major_axis: 30.07,
                eccentricity: 0.0086,
                inclination: 0.0309,
                longitude_ascending: 2.3000,
                argument_periapsis: 4.7681,
                mean_anomaly_epoch: 4.4715,
                period: 60182.0,
            },
        },
    ]
}

impl SimConfig {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            engine: self.engine.clone(),
            precision: self.precision,
            camera: self.camera.clone(),
        }
    }

    pub fn target(&self) -> BodyId {
        BodyId::new(self.run.target.clone())
    }

    /// Orrery at time zero with every configured body
    pub fn orrery(&self) -> Orrery {
        self.bodies.iter().fold(
            Orrery::new(
                self.engine.reference_body.clone(),
                self.run.reference_position.into(),
            ),
            |orrery, body| orrery.with_body(body.id.clone(), body.elements),
        )
    }
}

/// Load configuration from file, falling back to defaults if missing
pub fn load_config(path: &Path) -> Result<SimConfig> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config: SimConfig = toml::from_str(&content)?;
        config.engine_config().validate()?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(SimConfig::default())
    }
}

/// Save default configuration to file
pub fn save_default_config(path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(&SimConfig::default())?;
    std::fs::write(path, content)?;
    Ok(())
}
