//! Sun and planets: presets, spawning and orbital motion

use bevy::prelude::*;
use orrery_core::{BodyId, OrbitalElements, Orrery, PositionSource, Vector3};
use orrery_scene::types::to_vec3;
use orrery_scene::{BodyPositions, CelestialBody, TrackingSet};

/// Reference body every planet orbits
pub const SUN: &str = "sun";

/// Simulation speed in days per second
#[derive(Resource, Debug, Clone)]
pub struct SimSpeed {
    pub days_per_second: f64,
}

impl SimSpeed {
    pub const MAX: f64 = 1.0e5;
}

impl Default for SimSpeed {
    fn default() -> Self {
        Self {
            days_per_second: 15000.0,
        }
    }
}

/// Orbits of every planet around the sun, in AU and days
#[derive(Resource, Debug, Clone)]
pub struct SolarSystem(pub Orrery);

impl Default for SolarSystem {
    fn default() -> Self {
        let orrery = PLANETS.iter().fold(Orrery::new(SUN, Vector3::ZERO), |orrery, planet| {
            orrery.with_body(planet.id, planet.elements())
        });
        Self(orrery)
    }
}

/// Display and orbit data for one planet
pub struct PlanetPreset {
    pub id: &'static str,
    pub label: &'static str,
    pub color: [f32; 3],
    pub radius: f32,
    /// a (AU), e, i, Ω, ω, M₀ (degrees), period (days)
    pub orbit: [f64; 7],
}

impl PlanetPreset {
    pub fn elements(&self) -> OrbitalElements {
        let [a, e, i, node, periapsis, mean_anomaly, period] = self.orbit;
        OrbitalElements {
            semi_major_axis: a,
            eccentricity: e,
            inclination: i.to_radians(),
            longitude_ascending: node.to_radians(),
            argument_periapsis: periapsis.to_radians(),
            mean_anomaly_epoch: mean_anomaly.to_radians(),
            period,
        }
    }
}

/// Approximate J2000 elements; radii are exaggerated for visibility
pub const PLANETS: &[PlanetPreset] = &[
    PlanetPreset { id: "mercury", label: "Mercury", color: [0.6, 0.6, 0.6], radius: 0.3, orbit: [0.387, 0.2056, 7.00, 48.33, 29.12, 174.8, 87.97] },
    PlanetPreset { id: "venus", label: "Venus", color: [0.9, 0.8, 0.5], radius: 0.4, orbit: [0.723, 0.0068, 3.39, 76.68, 54.88, 50.1, 224.70] },
    PlanetPreset { id: "earth", label: "Earth", color: [0.2, 0.4, 1.0], radius: 0.4, orbit: [1.000, 0.0167, 0.00, -11.26, 114.21, 358.6, 365.256] },
    PlanetPreset { id: "mars", label: "Mars", color: [0.9, 0.3, 0.1], radius: 0.35, orbit: [1.524, 0.0934, 1.85, 49.56, 286.50, 19.4, 686.98] },
    PlanetPreset { id: "jupiter", label: "Jupiter", color: [0.8, 0.7, 0.5], radius: 0.9, orbit: [5.203, 0.0484, 1.30, 100.46, 273.87, 20.0, 4332.59] },
    PlanetPreset { id: "saturn", label: "Saturn", color: [0.9, 0.8, 0.6], radius: 0.8, orbit: [9.537, 0.0539, 2.49, 113.67, 339.39, 317.0, 10759.22] },
    PlanetPreset { id: "uranus", label: "Uranus", color: [0.6, 0.9, 0.9], radius: 0.7, orbit: [19.19, 0.0473, 0.77, 74.01, 96.99, 142.2, 30688.5] },
    PlanetPreset { id: "neptune", label: "Neptune", color: [0.27, 0.37, 0.94], radius: 1.0, orbit: [30.07, 0.0086, 1.77, 131.78, 273.19, 256.2, 60182.0] },
    PlanetPreset { id: "pluto", label: "Pluto", color: [1.0, 0.0, 0.0], radius: 0.5, orbit: [39.48, 0.2488, 17.16, 110.30, 113.83, 14.5, 90560.0] },
];

pub struct BodiesPlugin;

impl Plugin for BodiesPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SimSpeed>()
            .init_resource::<SolarSystem>()
            .add_systems(Startup, spawn_bodies)
            .add_systems(Update, advance_orbits.before(TrackingSet::Commands));
    }
}

fn spawn_bodies(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    system: Res<SolarSystem>,
) {
    commands.spawn((
        Mesh3d(meshes.add(Sphere::new(1.5))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(1.0, 0.9, 0.4),
            emissive: LinearRgba::rgb(8.0, 6.0, 2.0),
            ..default()
        })),
        Transform::default(),
        CelestialBody::new(SUN, "Sun"),
    ));

    for planet in PLANETS {
        let id = BodyId::from(planet.id);
        let position = system.0.position_of(&id).unwrap_or(Vector3::ZERO);
        let [r, g, b] = planet.color;

        commands.spawn((
            Mesh3d(meshes.add(Sphere::new(planet.radius))),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: Color::srgb(r, g, b),
                ..default()
            })),
            Transform::from_translation(to_vec3(position)),
            CelestialBody::new(id, planet.label),
        ));
    }
}

/// Move every body along its orbit and publish the `f64` positions for
/// tracking
fn advance_orbits(
    time: Res<Time>,
    speed: Res<SimSpeed>,
    mut system: ResMut<SolarSystem>,
    mut positions: ResMut<BodyPositions>,
    mut bodies: Query<(&CelestialBody, &mut Transform)>,
) {
    system.0.advance(time.delta_secs_f64() * speed.days_per_second);

    for (body, mut transform) in &mut bodies {
        let Some(position) = system.0.position_of(&body.id) else {
            continue;
        };
        positions.set(body.id.clone(), position);
        transform.translation = to_vec3(position);
    }
}
