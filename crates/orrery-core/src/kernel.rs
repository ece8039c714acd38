//! Rotation kernel: vector and quaternion operations generic over
//! [`Arithmetic`]
//!
//! Every function takes the arithmetic explicitly so the same code runs at
//! machine precision and at arbitrary decimal precision.

use thiserror::Error;

use crate::math::{UnitQuaternion, Vector3};
use crate::precision::Arithmetic;

/// Below this value of `dot(â, b̂) + 1` the two directions are treated as
/// antiparallel and the cross product is not used.
pub const ANTIPARALLEL_THRESHOLD: f64 = 1e-8;

/// A direction was required but the vector has zero length
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Degenerate vector: cannot take the direction of a zero-length vector")]
pub struct DegenerateVector;

type V<A> = Vector3<<A as Arithmetic>::Scalar>;
type Q<A> = UnitQuaternion<<A as Arithmetic>::Scalar>;

pub fn lift_vector<A: Arithmetic>(ar: &A, v: Vector3) -> V<A> {
    Vector3::new(ar.lift(v.x), ar.lift(v.y), ar.lift(v.z))
}

pub fn lower_vector<A: Arithmetic>(ar: &A, v: &V<A>) -> Vector3 {
    Vector3::new(ar.lower(&v.x), ar.lower(&v.y), ar.lower(&v.z))
}

pub fn lift_quaternion<A: Arithmetic>(ar: &A, q: &UnitQuaternion) -> Q<A> {
    UnitQuaternion::from_normalized(ar.lift(*q.x()), ar.lift(*q.y()), ar.lift(*q.z()), ar.lift(*q.w()))
}

pub fn lower_quaternion<A: Arithmetic>(ar: &A, q: &Q<A>) -> UnitQuaternion {
    UnitQuaternion::from_normalized(ar.lower(q.x()), ar.lower(q.y()), ar.lower(q.z()), ar.lower(q.w()))
}

pub fn add<A: Arithmetic>(ar: &A, a: &V<A>, b: &V<A>) -> V<A> {
    Vector3::new(ar.add(&a.x, &b.x), ar.add(&a.y, &b.y), ar.add(&a.z, &b.z))
}

pub fn sub<A: Arithmetic>(ar: &A, a: &V<A>, b: &V<A>) -> V<A> {
    Vector3::new(ar.sub(&a.x, &b.x), ar.sub(&a.y, &b.y), ar.sub(&a.z, &b.z))
}

pub fn scale<A: Arithmetic>(ar: &A, v: &V<A>, s: &A::Scalar) -> V<A> {
    Vector3::new(ar.mul(&v.x, s), ar.mul(&v.y, s), ar.mul(&v.z, s))
}

pub fn dot<A: Arithmetic>(ar: &A, a: &V<A>, b: &V<A>) -> A::Scalar {
    let xy = ar.add(&ar.mul(&a.x, &b.x), &ar.mul(&a.y, &b.y));
    ar.add(&xy, &ar.mul(&a.z, &b.z))
}

pub fn cross<A: Arithmetic>(ar: &A, a: &V<A>, b: &V<A>) -> V<A> {
    Vector3::new(
        ar.sub(&ar.mul(&a.y, &b.z), &ar.mul(&a.z, &b.y)),
        ar.sub(&ar.mul(&a.z, &b.x), &ar.mul(&a.x, &b.z)),
        ar.sub(&ar.mul(&a.x, &b.y), &ar.mul(&a.y, &b.x)),
    )
}

pub fn length<A: Arithmetic>(ar: &A, v: &V<A>) -> A::Scalar {
    ar.sqrt(&dot(ar, v, v))
}

/// `v / |v|`, failing for a zero-length vector
pub fn normalize<A: Arithmetic>(ar: &A, v: &V<A>) -> Result<V<A>, DegenerateVector> {
    let len = length(ar, v);
    if ar.is_zero(&len) {
        return Err(DegenerateVector);
    }
    Ok(Vector3::new(
        ar.div(&v.x, &len),
        ar.div(&v.y, &len),
        ar.div(&v.z, &len),
    ))
}

pub fn identity<A: Arithmetic>(ar: &A) -> Q<A> {
    UnitQuaternion::from_normalized(ar.zero(), ar.zero(), ar.zero(), ar.one())
}

/// Normalize four components into a rotation; all-zero input yields identity
pub fn quaternion_from_components<A: Arithmetic>(
    ar: &A,
    x: A::Scalar,
    y: A::Scalar,
    z: A::Scalar,
    w: A::Scalar,
) -> Q<A> {
    let xy = ar.add(&ar.mul(&x, &x), &ar.mul(&y, &y));
    let zw = ar.add(&ar.mul(&z, &z), &ar.mul(&w, &w));
    let len = ar.sqrt(&ar.add(&xy, &zw));
    if ar.is_zero(&len) {
        return identity(ar);
    }
    UnitQuaternion::from_normalized(
        ar.div(&x, &len),
        ar.div(&y, &len),
        ar.div(&z, &len),
        ar.div(&w, &len),
    )
}

pub fn quaternion_norm_squared<A: Arithmetic>(ar: &A, q: &Q<A>) -> A::Scalar {
    let xy = ar.add(&ar.mul(q.x(), q.x()), &ar.mul(q.y(), q.y()));
    let zw = ar.add(&ar.mul(q.z(), q.z()), &ar.mul(q.w(), q.w()));
    ar.add(&xy, &zw)
}

/// Shortest-arc rotation carrying the direction of `a` onto the direction of
/// `b`. Inputs need not be unit length; if either has zero length the
/// result is the identity.
pub fn rotation_between<A: Arithmetic>(ar: &A, a: &V<A>, b: &V<A>) -> Q<A> {
    match (normalize(ar, a), normalize(ar, b)) {
        (Ok(a), Ok(b)) => rotation_between_unit(ar, &a, &b),
        _ => identity(ar),
    }
}

/// Shortest-arc rotation between two unit vectors.
///
/// When `dot(a, b) + 1` drops below [`ANTIPARALLEL_THRESHOLD`] the cross
/// product carries no usable axis, so a half-turn axis orthogonal to `a` is
/// built directly, pivoting on whichever of `a.x` and `a.z` is larger in
/// magnitude.
pub fn rotation_between_unit<A: Arithmetic>(ar: &A, a: &V<A>, b: &V<A>) -> Q<A> {
    let r = ar.add(&dot(ar, a, b), &ar.one());

    if ar.lt(&r, &ar.lift(ANTIPARALLEL_THRESHOLD)) {
        if ar.lt(&ar.abs(&a.z), &ar.abs(&a.x)) {
            quaternion_from_components(ar, ar.neg(&a.y), a.x.clone(), ar.zero(), ar.zero())
        } else {
            quaternion_from_components(ar, ar.zero(), ar.neg(&a.z), a.y.clone(), ar.zero())
        }
    } else {
        let axis = cross(ar, a, b);
        quaternion_from_components(ar, axis.x, axis.y, axis.z, r)
    }
}

/// Rotate `v` by `q`: `t = 2·(q.xyz × v)`, `v' = v + q.w·t + q.xyz × t`
pub fn apply_rotation<A: Arithmetic>(ar: &A, v: &V<A>, q: &Q<A>) -> V<A> {
    let u = Vector3::new(q.x().clone(), q.y().clone(), q.z().clone());
    let t = scale(ar, &cross(ar, &u, v), &ar.lift(2.0));
    let wt = scale(ar, &t, q.w());
    add(ar, &add(ar, v, &wt), &cross(ar, &u, &t))
}
