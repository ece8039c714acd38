//! Unit quaternions

use super::Vector3;

/// A rotation stored as a unit quaternion `(x, y, z, w)`.
///
/// Components are private: a quaternion is only obtained from
/// [`UnitQuaternion::IDENTITY`], [`UnitQuaternion::from_components`] or the
/// kernel's normalizing constructors, so every value has passed through an
/// explicit normalization step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitQuaternion<S = f64> {
    x: S,
    y: S,
    z: S,
    w: S,
}

impl<S> UnitQuaternion<S> {
    /// Wrap components that are already normalized
    pub(crate) fn from_normalized(x: S, y: S, z: S, w: S) -> Self {
        Self { x, y, z, w }
    }

    pub fn x(&self) -> &S {
        &self.x
    }

    pub fn y(&self) -> &S {
        &self.y
    }

    pub fn z(&self) -> &S {
        &self.z
    }

    pub fn w(&self) -> &S {
        &self.w
    }

    pub fn into_parts(self) -> (S, S, S, S) {
        (self.x, self.y, self.z, self.w)
    }
}

impl UnitQuaternion {
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    /// Normalize arbitrary components into a rotation.
    ///
    /// Returns `None` when all four components are zero.
    pub fn from_components(x: f64, y: f64, z: f64, w: f64) -> Option<Self> {
        let length = (x * x + y * y + z * z + w * w).sqrt();
        if length == 0.0 || !length.is_finite() {
            return None;
        }
        Some(Self::from_normalized(x / length, y / length, z / length, w / length))
    }

    /// Rotation by `angle` radians about `axis`. Returns `None` for a
    /// zero-length axis.
    pub fn from_axis_angle(axis: Vector3, angle: f64) -> Option<Self> {
        let axis = axis.try_normalize()?;
        let (sin, cos) = (angle / 2.0).sin_cos();
        Some(Self::from_normalized(axis.x * sin, axis.y * sin, axis.z * sin, cos))
    }

    pub fn norm_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w
    }

    /// Vector part `(x, y, z)`
    pub fn vector(&self) -> Vector3 {
        Vector3::new(self.x, self.y, self.z)
    }

    /// Rotation angle in radians, in `[0, 2π]`
    pub fn angle(&self) -> f64 {
        2.0 * self.w.clamp(-1.0, 1.0).acos()
    }

    /// Rotation axis, or `None` for a (near) identity rotation
    pub fn axis(&self) -> Option<Vector3> {
        self.vector().try_normalize()
    }

    pub fn is_identity(&self, epsilon: f64) -> bool {
        self.vector().length() <= epsilon
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.x, self.y, self.z, self.w]
    }
}

impl Default for UnitQuaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}
