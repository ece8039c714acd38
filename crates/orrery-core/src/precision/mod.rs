//! Precision backends for the rotation kernel
//!
//! The kernel and the tracking recurrence are written once against the
//! [`Arithmetic`] trait. Two implementations exist:
//! - [`StandardArithmetic`]: native `f64`
//! - [`DecimalArithmetic`]: arbitrary-precision decimals rounded to a fixed
//!   number of significant digits after every operation
//!
//! [`PrecisionBackend`] selects one of them at runtime and exposes the kernel
//! operations on plain `f64` vectors.

mod decimal;
mod standard;

pub use decimal::{DecimalArithmetic, DEFAULT_DIGITS, MAX_DIGITS, MIN_DIGITS};
pub use standard::StandardArithmetic;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::kernel::{self, DegenerateVector};
use crate::math::{UnitQuaternion, Vector3};
use crate::recurrence::{PoseStepper, Stepper};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PrecisionError {
    #[error("Invalid precision configuration: {digits} digits requested, supported range is {min}..={max}")]
    Configuration { digits: u64, min: u64, max: u64 },
}

/// Scalar arithmetic used by the rotation kernel.
///
/// Implementations decide how values are represented and rounded. Callers
/// never divide by zero or take the square root of a negative value; the
/// kernel checks before it does either.
pub trait Arithmetic: Clone + Send + Sync + 'static {
    type Scalar: Clone + fmt::Debug + Send + Sync + 'static;

    fn mode(&self) -> PrecisionMode;

    /// Convert an `f64` into a backend scalar
    fn lift(&self, value: f64) -> Self::Scalar;

    /// Convert a backend scalar back to the nearest `f64`
    fn lower(&self, value: &Self::Scalar) -> f64;

    fn zero(&self) -> Self::Scalar {
        self.lift(0.0)
    }

    fn one(&self) -> Self::Scalar {
        self.lift(1.0)
    }

    fn add(&self, a: &Self::Scalar, b: &Self::Scalar) -> Self::Scalar;
    fn sub(&self, a: &Self::Scalar, b: &Self::Scalar) -> Self::Scalar;
    fn mul(&self, a: &Self::Scalar, b: &Self::Scalar) -> Self::Scalar;
    fn div(&self, a: &Self::Scalar, b: &Self::Scalar) -> Self::Scalar;
    fn sqrt(&self, a: &Self::Scalar) -> Self::Scalar;
    fn neg(&self, a: &Self::Scalar) -> Self::Scalar;
    fn abs(&self, a: &Self::Scalar) -> Self::Scalar;
    fn is_zero(&self, a: &Self::Scalar) -> bool;

    /// `a < b`
    fn lt(&self, a: &Self::Scalar, b: &Self::Scalar) -> bool;

    /// Bound on `|q|² - 1` for quaternions produced with this arithmetic
    fn tolerance(&self) -> Self::Scalar;
}

/// Which arithmetic implements the kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrecisionMode {
    #[default]
    Standard,
    HighPrecision,
}

impl fmt::Display for PrecisionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::HighPrecision => write!(f, "high_precision"),
        }
    }
}

impl std::str::FromStr for PrecisionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "standard" | "f64" => Ok(Self::Standard),
            "high_precision" | "decimal" => Ok(Self::HighPrecision),
            other => Err(format!("unknown precision mode: {}", other)),
        }
    }
}

/// Precision selection for new tracking sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrecisionSettings {
    #[serde(default)]
    pub mode: PrecisionMode,
    /// Significant digits of the high-precision backend (ignored for standard)
    #[serde(default = "default_digits")]
    pub digits: u64,
}

fn default_digits() -> u64 {
    DEFAULT_DIGITS
}

impl Default for PrecisionSettings {
    fn default() -> Self {
        Self {
            mode: PrecisionMode::default(),
            digits: default_digits(),
        }
    }
}

impl PrecisionSettings {
    pub fn standard() -> Self {
        Self::default()
    }

    pub fn high_precision(digits: u64) -> Self {
        Self {
            mode: PrecisionMode::HighPrecision,
            digits,
        }
    }
}

/// Runtime-selected precision backend.
///
/// The methods mirror the kernel contract on `f64` vectors. For the decimal
/// backend inputs are lifted, the whole operation runs at the working
/// precision, and only the result is lowered back to `f64`.
#[derive(Debug, Clone)]
pub enum PrecisionBackend {
    Standard(StandardArithmetic),
    HighPrecision(DecimalArithmetic),
}

impl PrecisionBackend {
    /// Build the backend described by `settings`
    pub fn new(settings: &PrecisionSettings) -> Result<Self, PrecisionError> {
        match settings.mode {
            PrecisionMode::Standard => Ok(Self::Standard(StandardArithmetic)),
            PrecisionMode::HighPrecision => {
                Ok(Self::HighPrecision(DecimalArithmetic::new(settings.digits)?))
            }
        }
    }

    pub fn mode(&self) -> PrecisionMode {
        match self {
            Self::Standard(ar) => ar.mode(),
            Self::HighPrecision(ar) => ar.mode(),
        }
    }

    pub fn normalize(&self, v: Vector3) -> Result<Vector3, DegenerateVector> {
        match self {
            Self::Standard(ar) => normalize_with(ar, v),
            Self::HighPrecision(ar) => normalize_with(ar, v),
        }
    }

    pub fn length(&self, v: Vector3) -> f64 {
        match self {
            Self::Standard(ar) => length_with(ar, v),
            Self::HighPrecision(ar) => length_with(ar, v),
        }
    }

    pub fn rotation_between(&self, a: Vector3, b: Vector3) -> UnitQuaternion {
        match self {
            Self::Standard(ar) => rotation_between_with(ar, a, b),
            Self::HighPrecision(ar) => rotation_between_with(ar, a, b),
        }
    }

    pub fn apply_rotation(&self, v: Vector3, q: &UnitQuaternion) -> Vector3 {
        match self {
            Self::Standard(ar) => apply_rotation_with(ar, v, q),
            Self::HighPrecision(ar) => apply_rotation_with(ar, v, q),
        }
    }

    /// Pose stepper for a new tracking session
    pub fn stepper(&self) -> Box<dyn PoseStepper> {
        match self {
            Self::Standard(ar) => Box::new(Stepper::new(ar.clone())),
            Self::HighPrecision(ar) => Box::new(Stepper::new(ar.clone())),
        }
    }
}

fn normalize_with<A: Arithmetic>(ar: &A, v: Vector3) -> Result<Vector3, DegenerateVector> {
    let v = kernel::lift_vector(ar, v);
    Ok(kernel::lower_vector(ar, &kernel::normalize(ar, &v)?))
}

fn length_with<A: Arithmetic>(ar: &A, v: Vector3) -> f64 {
    ar.lower(&kernel::length(ar, &kernel::lift_vector(ar, v)))
}

fn rotation_between_with<A: Arithmetic>(ar: &A, a: Vector3, b: Vector3) -> UnitQuaternion {
    let a = kernel::lift_vector(ar, a);
    let b = kernel::lift_vector(ar, b);
    kernel::lower_quaternion(ar, &kernel::rotation_between(ar, &a, &b))
}

fn apply_rotation_with<A: Arithmetic>(ar: &A, v: Vector3, q: &UnitQuaternion) -> Vector3 {
    let v = kernel::lift_vector(ar, v);
    let q = kernel::lift_quaternion(ar, q);
    kernel::lower_vector(ar, &kernel::apply_rotation(ar, &v, &q))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backends() -> Vec<PrecisionBackend> {
        vec![
            PrecisionBackend::new(&PrecisionSettings::standard()).unwrap(),
            PrecisionBackend::new(&PrecisionSettings::high_precision(DEFAULT_DIGITS)).unwrap(),
        ]
    }

    fn assert_close(a: Vector3, b: Vector3, epsilon: f64) {
        assert!(
            a.distance(b) <= epsilon,
            "expected {} to be within {} of {}",
            a,
            epsilon,
            b
        );
    }

    #[test]
    fn test_invalid_digits_rejected() {
        let err = PrecisionBackend::new(&PrecisionSettings::high_precision(5)).unwrap_err();
        assert_eq!(
            err,
            PrecisionError::Configuration {
                digits: 5,
                min: MIN_DIGITS,
                max: MAX_DIGITS
            }
        );
        assert!(PrecisionBackend::new(&PrecisionSettings::high_precision(MAX_DIGITS + 1)).is_err());
    }

    #[test]
    fn test_standard_ignores_digits() {
        let settings = PrecisionSettings {
            mode: PrecisionMode::Standard,
            digits: 1,
        };
        let backend = PrecisionBackend::new(&settings).unwrap();
        assert_eq!(backend.mode(), PrecisionMode::Standard);
    }

    #[test]
    fn test_rotation_correctness_both_backends() {
        let pairs = [
            (Vector3::new(1.0, 2.0, 3.0), Vector3::new(-2.0, 0.5, 1.0)),
            (Vector3::new(10.0, 0.0, 0.0), Vector3::new(0.0, 10.0, 0.0)),
            (Vector3::new(0.3, -0.7, 0.2), Vector3::new(0.31, -0.69, 0.21)),
            (Vector3::new(0.0, 0.0, 5.0), Vector3::new(1.0, 1.0, -4.0)),
        ];
        for backend in backends() {
            for (a, b) in pairs {
                let q = backend.rotation_between(a, b);
                assert!((q.norm_squared() - 1.0).abs() < 1e-9);
                let rotated = backend.apply_rotation(backend.normalize(a).unwrap(), &q);
                assert_close(rotated, backend.normalize(b).unwrap(), 1e-12);
            }
        }
    }

    #[test]
    fn test_antiparallel_both_backends() {
        let a = Vector3::new(1.0, 0.0, 0.0);
        let b = Vector3::new(-1.0, 0.0, 0.0);
        for backend in backends() {
            let q = backend.rotation_between(a, b);
            assert!(q.w().abs() < 1e-12);
            assert!((q.norm_squared() - 1.0).abs() < 1e-9);
            assert_close(backend.apply_rotation(a, &q), b, 1e-12);
        }
    }

    #[test]
    fn test_backends_agree_on_well_conditioned_inputs() {
        let [standard, decimal] = <[PrecisionBackend; 2]>::try_from(backends()).unwrap();
        let a = Vector3::new(0.8, -0.1, 0.4);
        let b = Vector3::new(0.2, 0.9, -0.3);
        let qs = standard.rotation_between(a, b);
        let qd = decimal.rotation_between(a, b);
        for (s, d) in qs.to_array().iter().zip(qd.to_array().iter()) {
            assert!((s - d).abs() < 64.0 * f64::EPSILON);
        }
        let v = Vector3::new(0.0, -90.0, 30.0);
        assert_close(
            standard.apply_rotation(v, &qs),
            decimal.apply_rotation(v, &qd),
            1e-12,
        );
    }

    #[test]
    fn test_normalize_zero_vector_fails() {
        for backend in backends() {
            assert_eq!(backend.normalize(Vector3::ZERO), Err(DegenerateVector));
            assert_eq!(backend.length(Vector3::new(3.0, 4.0, 0.0)), 5.0);
        }
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("standard".parse::<PrecisionMode>(), Ok(PrecisionMode::Standard));
        assert_eq!(
            "high-precision".parse::<PrecisionMode>(),
            Ok(PrecisionMode::HighPrecision)
        );
        assert!("quad".parse::<PrecisionMode>().is_err());
    }
}
