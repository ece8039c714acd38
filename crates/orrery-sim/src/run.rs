//! Headless tracking run and drift report

use anyhow::{anyhow, Result};
use orrery_core::{
    BodyId, CameraPose, OrbitalElements, PoseObserver, PoseTarget, PositionSource,
    PrecisionBackend, PrecisionMode, PrecisionSettings, TrackingEngine, UnitQuaternion, Vector3,
};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::SimConfig;

/// Drift of one backend against the closed-form pose
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub precision: PrecisionMode,
    /// Working digits of the high-precision backend
    pub digits: Option<u64>,
    pub position_error: f64,
    pub up_error: f64,
    /// Error of the camera-to-target distance, the visible wobble
    pub distance_error: f64,
    pub degenerate_ticks: u64,
    pub pose_writes: u64,
    pub elapsed_ms: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimReport {
    pub target: BodyId,
    pub ticks: u64,
    pub dt: f64,
    pub swept_angle_deg: f64,
    pub runs: Vec<RunReport>,
    /// Largest per-tick camera distance between the first two backends
    pub max_backend_delta: Option<f64>,
}

impl SimReport {
    pub fn print(&self) {
        println!(
            "Tracked {} for {} ticks (dt {}, swept {:.3}°)",
            self.target, self.ticks, self.dt, self.swept_angle_deg
        );
        for run in &self.runs {
            let precision = match run.digits {
                Some(digits) => format!("{} ({} digits)", run.precision, digits),
                None => run.precision.to_string(),
            };
            println!("  {}:", precision);
            println!("    Position error: {:.3e}", run.position_error);
            println!("    Up error:       {:.3e}", run.up_error);
            println!("    Distance error: {:.3e}", run.distance_error);
            if run.degenerate_ticks > 0 {
                println!("    Degenerate ticks: {}", run.degenerate_ticks);
            }
            println!("    Time: {:.1} ms", run.elapsed_ms);
        }
        if let Some(delta) = self.max_backend_delta {
            println!("  Max backend delta: {:.3e}", delta);
        }
    }
}

/// Counts pose writes made by an engine
#[derive(Clone, Default)]
struct WriteCounter(Arc<AtomicU64>);

impl PoseObserver for WriteCounter {
    fn pose_changed(&mut self, _target: PoseTarget, _pose: &CameraPose) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }
}

/// One engine being driven through the run
struct Lane {
    engine: TrackingEngine,
    settings: PrecisionSettings,
    initial: CameraPose,
    writes: WriteCounter,
    degenerate_ticks: u64,
    elapsed: Duration,
}

/// Track the configured target once per precision setting, all engines
/// driven in lockstep from the same position samples
pub fn simulate(config: &SimConfig, backends: &[PrecisionSettings]) -> Result<SimReport> {
    let target = config.target();
    let mut orrery = config.orrery();
    let elements = *orrery
        .elements(&target)
        .ok_or_else(|| anyhow!("Unknown target body: {}", target))?;
    let reference: Vector3 = config.run.reference_position.into();
    let start_time = orrery.time();
    let start_position = orrery
        .position_of(&target)
        .ok_or_else(|| anyhow!("No position for {}", target))?;

    let mut lanes = backends
        .iter()
        .map(|settings| -> Result<Lane> {
            let mut engine_config = config.engine_config();
            engine_config.precision = *settings;

            let mut engine = TrackingEngine::new(&engine_config)?;
            let writes = WriteCounter::default();
            engine.camera_mut().add_observer(Box::new(writes.clone()));
            engine.select_target(Some(target.clone()), &orrery)?;

            Ok(Lane {
                initial: *engine.camera().active_pose(),
                engine,
                settings: *settings,
                writes,
                degenerate_ticks: 0,
                elapsed: Duration::ZERO,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    info!(
        body = %target,
        ticks = config.run.ticks,
        backends = lanes.len(),
        "Starting tracking run"
    );

    let mut max_delta: Option<f64> = None;
    for tick in 1..=config.run.ticks {
        orrery.advance(config.run.dt);

        let mut positions = Vec::with_capacity(lanes.len());
        for lane in &mut lanes {
            let started = Instant::now();
            let report = lane.engine.tick(&orrery)?;
            lane.elapsed += started.elapsed();

            if let Some(report) = report {
                if report.degenerate {
                    lane.degenerate_ticks += 1;
                }
                positions.push(report.pose.position);
            }
        }

        if let [first, second, ..] = positions.as_slice() {
            let delta = first.distance(*second);
            debug!(tick, delta, "Backend delta");
            max_delta = Some(max_delta.map_or(delta, |max| max.max(delta)));
        }
    }

    let end_position = orrery
        .position_of(&target)
        .ok_or_else(|| anyhow!("No position for {}", target))?;
    let closed_form = ClosedForm {
        elements,
        reference,
        start_position,
        end_position,
        start_time,
        end_time: orrery.time(),
    };

    let runs = lanes
        .iter()
        .map(|lane| -> Result<RunReport> {
            let expected = closed_form.expected_pose(&lane.initial)?;
            let actual = lane.engine.camera().active_pose();
            let expected_distance = expected.distance_to(end_position);

            Ok(RunReport {
                precision: lane.settings.mode,
                digits: (lane.settings.mode == PrecisionMode::HighPrecision)
                    .then_some(lane.settings.digits),
                position_error: actual.position.distance(expected.position),
                up_error: actual.up.distance(expected.up),
                distance_error: (actual.distance_to(end_position) - expected_distance).abs(),
                degenerate_ticks: lane.degenerate_ticks,
                pose_writes: lane.writes.0.load(Ordering::Relaxed),
                elapsed_ms: lane.elapsed.as_secs_f64() * 1000.0,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(SimReport {
        target,
        ticks: config.run.ticks,
        dt: config.run.dt,
        swept_angle_deg: closed_form.swept_angle().to_degrees(),
        runs,
        max_backend_delta: max_delta,
    })
}

/// Pose the camera should reach after following a Keplerian orbit: one
/// rotation about the orbit normal by the swept angle and one scale by the
/// ratio of distances
struct ClosedForm {
    elements: OrbitalElements,
    reference: Vector3,
    start_position: Vector3,
    end_position: Vector3,
    start_time: f64,
    end_time: f64,
}

impl ClosedForm {
    fn swept_angle(&self) -> f64 {
        self.elements.swept_angle(self.start_time, self.end_time)
    }

    fn expected_pose(&self, initial: &CameraPose) -> Result<CameraPose> {
        let start_radius = (self.start_position - self.reference).length();
        if start_radius == 0.0 {
            return Ok(*initial);
        }
        let scale = (self.end_position - self.reference).length() / start_radius;

        let rotation = UnitQuaternion::from_axis_angle(self.elements.orbit_normal(), self.swept_angle())
            .unwrap_or_default();
        let backend = PrecisionBackend::new(&PrecisionSettings::standard())?;
        let relative = backend.apply_rotation(initial.position - self.reference, &rotation);

        Ok(CameraPose {
            position: self.reference + relative * scale,
            up: backend.apply_rotation(initial.up, &rotation),
            look_at: self.end_position,
        })
    }
}
