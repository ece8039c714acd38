//! Machine-precision backend

use super::{Arithmetic, PrecisionMode};

/// Native `f64` arithmetic
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardArithmetic;

impl Arithmetic for StandardArithmetic {
    type Scalar = f64;

    fn mode(&self) -> PrecisionMode {
        PrecisionMode::Standard
    }

    fn lift(&self, value: f64) -> f64 {
        value
    }

    fn lower(&self, value: &f64) -> f64 {
        *value
    }

    fn add(&self, a: &f64, b: &f64) -> f64 {
        a + b
    }

    fn sub(&self, a: &f64, b: &f64) -> f64 {
        a - b
    }

    fn mul(&self, a: &f64, b: &f64) -> f64 {
        a * b
    }

    fn div(&self, a: &f64, b: &f64) -> f64 {
        a / b
    }

    fn sqrt(&self, a: &f64) -> f64 {
        a.sqrt()
    }

    fn neg(&self, a: &f64) -> f64 {
        -a
    }

    fn abs(&self, a: &f64) -> f64 {
        a.abs()
    }

    fn is_zero(&self, a: &f64) -> bool {
        *a == 0.0
    }

    fn lt(&self, a: &f64, b: &f64) -> bool {
        a < b
    }

    fn tolerance(&self) -> f64 {
        1e-9
    }
}
