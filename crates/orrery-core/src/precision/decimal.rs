//! Arbitrary-precision decimal backend

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::{FromPrimitive, ToPrimitive, Zero};

use super::{Arithmetic, PrecisionError, PrecisionMode};

/// Fewest significant digits accepted. `f64` already round-trips through 17.
pub const MIN_DIGITS: u64 = 20;

/// Most significant digits accepted. Division and square roots in
/// `bigdecimal` are carried out to 100 digits.
pub const MAX_DIGITS: u64 = 100;

pub const DEFAULT_DIGITS: u64 = 100;

/// Decimal arithmetic rounded to a fixed number of significant digits after
/// every operation.
#[derive(Debug, Clone)]
pub struct DecimalArithmetic {
    digits: u64,
    tolerance: BigDecimal,
}

impl DecimalArithmetic {
    pub fn new(digits: u64) -> Result<Self, PrecisionError> {
        if !(MIN_DIGITS..=MAX_DIGITS).contains(&digits) {
            return Err(PrecisionError::Configuration {
                digits,
                min: MIN_DIGITS,
                max: MAX_DIGITS,
            });
        }

        // Ten digits of headroom below the working precision
        let tolerance = BigDecimal::new(BigInt::from(1), (digits - 10) as i64);

        Ok(Self { digits, tolerance })
    }

    pub fn digits(&self) -> u64 {
        self.digits
    }

    fn round(&self, value: BigDecimal) -> BigDecimal {
        value.with_prec(self.digits)
    }
}

impl Arithmetic for DecimalArithmetic {
    type Scalar = BigDecimal;

    fn mode(&self) -> PrecisionMode {
        PrecisionMode::HighPrecision
    }

    fn lift(&self, value: f64) -> BigDecimal {
        BigDecimal::from_f64(value)
            .map(|v| self.round(v))
            .unwrap_or_default()
    }

    fn lower(&self, value: &BigDecimal) -> f64 {
        value.to_f64().unwrap_or(f64::NAN)
    }

    fn zero(&self) -> BigDecimal {
        BigDecimal::zero()
    }

    fn add(&self, a: &BigDecimal, b: &BigDecimal) -> BigDecimal {
        self.round(a + b)
    }

    fn sub(&self, a: &BigDecimal, b: &BigDecimal) -> BigDecimal {
        self.round(a - b)
    }

    fn mul(&self, a: &BigDecimal, b: &BigDecimal) -> BigDecimal {
        self.round(a * b)
    }

    fn div(&self, a: &BigDecimal, b: &BigDecimal) -> BigDecimal {
        self.round(a / b)
    }

    fn sqrt(&self, a: &BigDecimal) -> BigDecimal {
        a.sqrt().map(|v| self.round(v)).unwrap_or_default()
    }

    fn neg(&self, a: &BigDecimal) -> BigDecimal {
        -a.clone()
    }

    fn abs(&self, a: &BigDecimal) -> BigDecimal {
        a.abs()
    }

    fn is_zero(&self, a: &BigDecimal) -> bool {
        a.is_zero()
    }

    fn lt(&self, a: &BigDecimal, b: &BigDecimal) -> bool {
        a < b
    }

    fn tolerance(&self) -> BigDecimal {
        self.tolerance.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digit_bounds() {
        assert!(DecimalArithmetic::new(MIN_DIGITS).is_ok());
        assert!(DecimalArithmetic::new(MAX_DIGITS).is_ok());
        assert!(DecimalArithmetic::new(MIN_DIGITS - 1).is_err());
        assert!(DecimalArithmetic::new(0).is_err());
    }

    #[test]
    fn test_lift_lower_round_trip() {
        let ar = DecimalArithmetic::new(DEFAULT_DIGITS).unwrap();
        for value in [0.0, 1.0, -90.0, 30.25, 1e-8, std::f64::consts::PI] {
            assert_eq!(ar.lower(&ar.lift(value)), value);
        }
    }

    #[test]
    fn test_sqrt_keeps_working_precision() {
        let ar = DecimalArithmetic::new(60).unwrap();
        let two = ar.lift(2.0);
        let root = ar.sqrt(&two);
        let squared = ar.mul(&root, &root);
        let error = ar.abs(&ar.sub(&squared, &two));
        assert!(ar.lt(&error, &ar.tolerance()));
        assert!((ar.lower(&root) - std::f64::consts::SQRT_2).abs() < f64::EPSILON);
    }

    #[test]
    fn test_third_is_finer_than_f64() {
        let ar = DecimalArithmetic::new(50).unwrap();
        let third = ar.div(&ar.one(), &ar.lift(3.0));
        let sum = ar.add(&ar.add(&third, &third), &third);
        let error = ar.abs(&ar.sub(&sum, &ar.one()));
        // f64 cannot get closer than ~1e-17 here
        assert!(ar.lt(&error, &ar.lift(1e-40)));
    }
}
