//! Vector and quaternion value types

mod quaternion;
mod vector;

pub use quaternion::UnitQuaternion;
pub use vector::Vector3;
