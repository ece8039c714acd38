//! Celestial body identifiers and position sampling

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::BuildHasher;

use crate::math::Vector3;

/// Name of a celestial body (e.g. "sun", "neptune")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BodyId(pub String);

impl BodyId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BodyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BodyId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for BodyId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Supplies the current position of bodies, once per tick
pub trait PositionSource {
    fn position_of(&self, body: &BodyId) -> Option<Vector3>;
}

impl<S: BuildHasher> PositionSource for HashMap<BodyId, Vector3, S> {
    fn position_of(&self, body: &BodyId) -> Option<Vector3> {
        self.get(body).copied()
    }
}
