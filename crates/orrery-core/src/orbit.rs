//! Keplerian orbit sampler
//!
//! Supplies body positions to hosts that have no ephemeris of their own and
//! closed-form ground truth to tests.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::TAU;

use crate::body::{BodyId, PositionSource};
use crate::math::Vector3;

const KEPLER_ITERATIONS: usize = 10;

/// Classical orbital elements. Angles in radians, time in the caller's unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitalElements {
    pub semi_major_axis: f64,
    /// [0, 1); 0 is circular
    #[serde(default)]
    pub eccentricity: f64,
    /// Relative to the ecliptic (XY) plane
    #[serde(default)]
    pub inclination: f64,
    #[serde(default)]
    pub longitude_ascending: f64,
    #[serde(default)]
    pub argument_periapsis: f64,
    #[serde(default)]
    pub mean_anomaly_epoch: f64,
    pub period: f64,
}

impl OrbitalElements {
    /// Circular orbit in a plane tilted by `inclination` about the X axis
    pub fn circular(radius: f64, inclination: f64, period: f64) -> Self {
        Self {
            semi_major_axis: radius,
            eccentricity: 0.0,
            inclination,
            longitude_ascending: 0.0,
            argument_periapsis: 0.0,
            mean_anomaly_epoch: 0.0,
            period,
        }
    }

    pub fn mean_anomaly_at(&self, t: f64) -> f64 {
        self.mean_anomaly_epoch + TAU * (t / self.period)
    }

    /// Solve E - e·sin(E) = M by Newton-Raphson
    fn eccentric_anomaly(&self, mean_anomaly: f64) -> f64 {
        let e = self.eccentricity;
        let mut anomaly = mean_anomaly;
        for _ in 0..KEPLER_ITERATIONS {
            let delta = anomaly - e * anomaly.sin() - mean_anomaly;
            anomaly -= delta / (1.0 - e * anomaly.cos());
        }
        anomaly
    }

    /// Position relative to the focus at time `t`
    pub fn position_at(&self, t: f64) -> Vector3 {
        let e = self.eccentricity;
        let anomaly = self.eccentric_anomaly(self.mean_anomaly_at(t));

        let true_anomaly = 2.0
            * ((1.0 + e).sqrt() * (anomaly / 2.0).sin())
                .atan2((1.0 - e).sqrt() * (anomaly / 2.0).cos());
        let r = self.semi_major_axis * (1.0 - e * anomaly.cos());
        let (px, py) = (r * true_anomaly.cos(), r * true_anomaly.sin());

        let (sin_o, cos_o) = self.longitude_ascending.sin_cos();
        let (sin_i, cos_i) = self.inclination.sin_cos();
        let (sin_w, cos_w) = self.argument_periapsis.sin_cos();

        Vector3::new(
            px * (cos_o * cos_w - sin_o * sin_w * cos_i) - py * (cos_o * sin_w + sin_o * cos_w * cos_i),
            px * (sin_o * cos_w + cos_o * sin_w * cos_i) - py * (sin_o * sin_w - cos_o * cos_w * cos_i),
            px * (sin_w * sin_i) + py * (cos_w * sin_i),
        )
    }

    /// True anomaly at time `t`, continuous across revolutions
    pub fn true_anomaly_at(&self, t: f64) -> f64 {
        let e = self.eccentricity;
        let anomaly = self.eccentric_anomaly(self.mean_anomaly_at(t));
        let principal = 2.0
            * ((1.0 + e).sqrt() * (anomaly / 2.0).sin())
                .atan2((1.0 - e).sqrt() * (anomaly / 2.0).cos());
        // True and eccentric anomaly share their revolution count
        principal + TAU * ((anomaly - principal) / TAU).round()
    }

    /// Angle swept about the orbit normal between `t0` and `t1`
    pub fn swept_angle(&self, t0: f64, t1: f64) -> f64 {
        self.true_anomaly_at(t1) - self.true_anomaly_at(t0)
    }

    /// Unit normal of the orbital plane (direction of angular momentum)
    pub fn orbit_normal(&self) -> Vector3 {
        let (sin_o, cos_o) = self.longitude_ascending.sin_cos();
        let (sin_i, cos_i) = self.inclination.sin_cos();
        Vector3::new(sin_o * sin_i, -cos_o * sin_i, cos_i)
    }
}

/// A reference body and the bodies orbiting it, sampled at one instant
#[derive(Debug, Clone)]
pub struct Orrery {
    reference: BodyId,
    reference_position: Vector3,
    bodies: BTreeMap<BodyId, OrbitalElements>,
    time: f64,
}

impl Orrery {
    pub fn new(reference: impl Into<BodyId>, reference_position: Vector3) -> Self {
        Self {
            reference: reference.into(),
            reference_position,
            bodies: BTreeMap::new(),
            time: 0.0,
        }
    }

    pub fn with_body(mut self, id: impl Into<BodyId>, elements: OrbitalElements) -> Self {
        self.insert(id, elements);
        self
    }

    pub fn insert(&mut self, id: impl Into<BodyId>, elements: OrbitalElements) {
        self.bodies.insert(id.into(), elements);
    }

    pub fn reference(&self) -> &BodyId {
        &self.reference
    }

    pub fn bodies(&self) -> impl Iterator<Item = (&BodyId, &OrbitalElements)> {
        self.bodies.iter()
    }

    pub fn elements(&self, id: &BodyId) -> Option<&OrbitalElements> {
        self.bodies.get(id)
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn set_time(&mut self, time: f64) {
        self.time = time;
    }

    pub fn advance(&mut self, dt: f64) {
        self.time += dt;
    }
}

impl PositionSource for Orrery {
    fn position_of(&self, body: &BodyId) -> Option<Vector3> {
        if *body == self.reference {
            return Some(self.reference_position);
        }
        self.bodies
            .get(body)
            .map(|elements| self.reference_position + elements.position_at(self.time))
    }
}
