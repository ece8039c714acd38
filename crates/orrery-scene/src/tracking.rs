//! Tracking engine resource, commands and per-frame systems

use bevy::prelude::*;
use orrery_core::{BodyId, Command, PositionSource, TickReport, TrackingEngine, Vector3};
use std::collections::HashMap;
use tracing::{debug, warn};

/// The tracking engine, owned by the ECS
#[derive(Resource, Deref, DerefMut)]
pub struct Tracker(pub TrackingEngine);

/// Current `f64` body positions, written by the host before tracking runs
#[derive(Resource, Debug, Clone, Default)]
pub struct BodyPositions(pub HashMap<BodyId, Vector3>);

impl BodyPositions {
    pub fn set(&mut self, id: BodyId, position: Vector3) {
        self.0.insert(id, position);
    }

    pub fn get(&self, id: &BodyId) -> Option<Vector3> {
        self.0.get(id).copied()
    }
}

impl PositionSource for BodyPositions {
    fn position_of(&self, body: &BodyId) -> Option<Vector3> {
        self.get(body)
    }
}

/// Command sent to the tracking engine
#[derive(Message, Debug, Clone)]
pub struct TrackingCommand(pub Command);

/// Outcome of the latest command and tick, for UI display
#[derive(Resource, Debug, Clone, Default)]
pub struct TrackingStatus {
    pub last_report: Option<TickReport>,
    pub last_error: Option<String>,
}

/// Ordering of the tracking systems within `Update`.
/// Hosts publish positions before `Commands`.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum TrackingSet {
    Commands,
    Tick,
    Write,
}

pub struct TrackingPlugin;

impl Plugin for TrackingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<BodyPositions>()
            .init_resource::<TrackingStatus>()
            .add_message::<TrackingCommand>()
            .configure_sets(
                Update,
                (TrackingSet::Commands, TrackingSet::Tick, TrackingSet::Write).chain(),
            )
            .add_systems(
                Update,
                (
                    apply_tracking_commands.in_set(TrackingSet::Commands),
                    tick_tracking.in_set(TrackingSet::Tick),
                ),
            );
    }
}

fn apply_tracking_commands(
    mut commands: MessageReader<TrackingCommand>,
    mut tracker: ResMut<Tracker>,
    positions: Res<BodyPositions>,
    mut status: ResMut<TrackingStatus>,
) {
    for TrackingCommand(command) in commands.read() {
        match tracker.handle(command.clone(), &*positions) {
            Ok(()) => {
                status.last_error = None;
                if matches!(command, Command::SelectTarget(None)) {
                    status.last_report = None;
                }
            }
            Err(err) => {
                warn!(%err, "Tracking command rejected");
                status.last_error = Some(err.to_string());
            }
        }
    }
}

fn tick_tracking(
    mut tracker: ResMut<Tracker>,
    positions: Res<BodyPositions>,
    mut status: ResMut<TrackingStatus>,
) {
    if !tracker.tracking().is_tracking() {
        return;
    }

    match tracker.tick(&*positions) {
        Ok(Some(report)) => status.last_report = Some(report),
        Ok(None) => {}
        Err(err) => {
            debug!(%err, "Tracking tick skipped");
            status.last_error = Some(err.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OrreryScenePlugin;

    fn app_with_positions(target: Vector3) -> App {
        let mut app = App::new();
        app.add_plugins(OrreryScenePlugin::default());

        let mut positions = app.world_mut().resource_mut::<BodyPositions>();
        positions.set(BodyId::from("sun"), Vector3::ZERO);
        positions.set(BodyId::from("neptune"), target);
        app
    }

    fn select(app: &mut App, body: Option<&str>) {
        app.world_mut()
            .write_message(TrackingCommand(Command::SelectTarget(body.map(BodyId::from))));
    }

    #[test]
    fn test_select_and_tick() {
        let mut app = app_with_positions(Vector3::new(10.0, 0.0, 0.0));
        select(&mut app, Some("neptune"));
        app.update();

        app.world_mut()
            .resource_mut::<BodyPositions>()
            .set(BodyId::from("neptune"), Vector3::new(0.0, 10.0, 0.0));
        app.update();

        let status = app.world().resource::<TrackingStatus>();
        let report = status.last_report.as_ref().unwrap();
        assert_eq!(report.target.as_str(), "neptune");
        assert!(report
            .pose
            .position
            .distance(Vector3::new(90.0, 0.0, 30.0))
            < 1e-9);
    }

    #[test]
    fn test_unknown_body_is_reported() {
        let mut app = app_with_positions(Vector3::X);
        select(&mut app, Some("vulcan"));
        app.update();

        let status = app.world().resource::<TrackingStatus>();
        assert!(status.last_error.as_deref().unwrap().contains("vulcan"));
        assert!(!app.world().resource::<Tracker>().tracking().is_tracking());
    }

    #[test]
    fn test_select_none_stops_tracking() {
        let mut app = app_with_positions(Vector3::X);
        select(&mut app, Some("neptune"));
        app.update();
        select(&mut app, None);
        app.update();

        assert!(!app.world().resource::<Tracker>().tracking().is_tracking());
        assert!(app.world().resource::<TrackingStatus>().last_report.is_none());
    }
}
