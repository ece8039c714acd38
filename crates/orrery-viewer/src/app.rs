//! Bevy application setup

use bevy::prelude::*;
use bevy_egui::EguiPlugin;
use bevy_picking::DefaultPickingPlugins;
use orrery_core::EngineConfig;
use orrery_scene::camera::pose_transform;
use orrery_scene::{CameraDirectionArrow, GhostCamera, MainCamera, OrreryScenePlugin};

use crate::bodies::BodiesPlugin;
use crate::ui::UiPlugin;

/// Engine configuration the viewer was started with
#[derive(Resource, Debug, Clone)]
pub struct ViewerConfig(pub EngineConfig);

pub fn run() {
    let config = config_from_url();

    App::new()
        .insert_resource(ClearColor(Color::srgb(0.0, 0.0, 0.02)))
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Orrery".to_string(),
                canvas: Some("#viewer-canvas".to_string()),
                fit_canvas_to_parent: true,
                prevent_default_event_handling: false,
                ..default()
            }),
            ..default()
        }))
        // Picking must be added BEFORE EguiPlugin so it can detect PickingPlugin
        .add_plugins(DefaultPickingPlugins)
        .add_plugins(EguiPlugin::default())
        .insert_resource(ViewerConfig(config.clone()))
        .add_plugins(OrreryScenePlugin { config })
        .add_plugins(BodiesPlugin)
        .add_plugins(UiPlugin)
        .add_systems(Startup, setup_scene)
        .run();
}

/// Read engine overrides from the page URL:
/// `?precision=high_precision&digits=64&ghost&align`
#[allow(unused_mut)]
fn config_from_url() -> EngineConfig {
    let mut config = EngineConfig::default();

    #[cfg(target_arch = "wasm32")]
    {
        let search = web_sys::window()
            .and_then(|window| window.location().search().ok())
            .unwrap_or_default();

        if let Ok(params) = web_sys::UrlSearchParams::new_with_str(&search) {
            if let Some(mode) = params.get("precision") {
                match mode.parse() {
                    Ok(mode) => config.precision.mode = mode,
                    Err(err) => tracing::warn!(%err, "Ignoring precision parameter"),
                }
            }
            if let Some(digits) = params.get("digits").and_then(|d| d.parse().ok()) {
                config.precision.digits = digits;
            }
            config.camera.ghost = params.has("ghost");
            config.engine.align_on_select = params.has("align");
        }
    }

    config
}

fn setup_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    config: Res<ViewerConfig>,
) {
    let initial = config.0.camera.initial_pose();

    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            near: 0.01,
            far: 2000.0,
            ..default()
        }),
        pose_transform(&initial),
        MainCamera,
    ));

    // Sunlight
    commands.spawn((
        PointLight {
            intensity: 1.0e9,
            range: 500.0,
            shadows_enabled: false,
            ..default()
        },
        Transform::default(),
    ));

    // Arrow pointing along the tracked camera's view direction
    commands.spawn((
        Mesh3d(meshes.add(Cone::new(0.4, 1.5))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(1.0, 0.8, 0.2),
            unlit: true,
            ..default()
        })),
        Transform::from_translation(Vec3::ZERO),
        CameraDirectionArrow,
    ));

    if config.0.camera.ghost {
        // Outline of the ghost camera the tracker moves
        commands.spawn((
            Mesh3d(meshes.add(Cuboid::new(1.0, 1.0, 2.0))),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: Color::srgba(0.4, 0.9, 1.0, 0.5),
                alpha_mode: AlphaMode::Blend,
                unlit: true,
                ..default()
            })),
            pose_transform(&initial),
            GhostCamera,
        ));
    }
}
