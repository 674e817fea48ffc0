//! Fixed-point numeric codecs.
//!
//! NUMERIC and DECIMAL columns travel as a scaled integer plus a non-positive
//! `sqlscale`: the value is `integer * 10^scale`. These helpers convert
//! between `BigDecimal` and that pair.

use crate::error::{Error, Result};
use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::Zero;

/// Number of decimal digits in the magnitude of `value` (zero has one digit).
fn digit_count(value: &BigInt) -> i64 {
    value.magnitude().to_str_radix(10).len() as i64
}

/// The digits of `value` with trailing zeros removed.
pub fn significand(value: &BigDecimal) -> BigInt {
    let (digits, _) = value.normalized().as_bigint_and_exponent();
    digits
}

/// Power of ten of the leading digit: `value = d.ddd * 10^exponent`.
pub fn exponent(value: &BigDecimal) -> i64 {
    let (digits, scale) = value.normalized().as_bigint_and_exponent();
    digit_count(&digits) - 1 - scale
}

/// Scale of the normalized significand: `value = significand(value) * 10^scale_of(value)`.
pub fn scale_of(value: &BigDecimal) -> i64 {
    let (digits, _) = value.normalized().as_bigint_and_exponent();
    exponent(value) - digit_count(&digits) + 1
}

/// Express `value` as an integer at `target_scale`.
///
/// Scaling down multiplies by ten per step. Scaling up divides by ten per
/// step and refuses to drop a nonzero digit.
///
/// # Errors
/// Returns `Error::ArithmeticRescale` when a division leaves a remainder.
pub fn rescale(value: &BigDecimal, target_scale: i64) -> Result<BigInt> {
    let mut current = scale_of(value);
    let mut result = significand(value);
    let ten = BigInt::from(10);
    if current > target_scale {
        while current > target_scale {
            result *= &ten;
            current -= 1;
        }
    } else {
        while current < target_scale {
            let remainder = &result % &ten;
            if !remainder.is_zero() {
                return Err(Error::ArithmeticRescale {
                    value: value.to_string(),
                    scale: target_scale,
                });
            }
            result /= &ten;
            current += 1;
        }
    }
    Ok(result)
}

/// Build a decimal from a scaled integer and a column scale.
///
/// # Errors
/// Returns `Error::InvalidScale` for a positive scale.
pub fn from_scaled_integer(value: BigInt, scale: i64) -> Result<BigDecimal> {
    if scale > 0 {
        return Err(Error::InvalidScale { scale });
    }
    Ok(BigDecimal::new(value, -scale))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn test_scale_of() {
        assert_eq!(scale_of(&dec("120")), 1);
        assert_eq!(scale_of(&dec("123")), 0);
        assert_eq!(scale_of(&dec("1.25")), -2);
        assert_eq!(scale_of(&dec("-0.001")), -3);
        assert_eq!(scale_of(&dec("0")), 0);
    }

    #[test]
    fn test_exponent() {
        assert_eq!(exponent(&dec("123")), 2);
        assert_eq!(exponent(&dec("0.05")), -2);
    }

    #[test]
    fn test_rescale_same_scale_is_significand() {
        for s in ["120", "1.25", "-42", "0.0001", "9000000"] {
            let v = dec(s);
            assert_eq!(rescale(&v, scale_of(&v)).unwrap(), significand(&v), "{s}");
        }
    }

    #[test]
    fn test_rescale_down() {
        assert_eq!(rescale(&dec("1.25"), -4).unwrap(), BigInt::from(12500));
        assert_eq!(rescale(&dec("-3"), -2).unwrap(), BigInt::from(-300));
    }

    #[test]
    fn test_rescale_up() {
        assert_eq!(rescale(&dec("120"), 1).unwrap(), BigInt::from(12));
        let err = rescale(&dec("123"), 1).unwrap_err();
        assert!(matches!(err, Error::ArithmeticRescale { scale: 1, .. }));
    }

    #[test]
    fn test_from_scaled_integer() {
        assert_eq!(from_scaled_integer(BigInt::from(125), -2).unwrap(), dec("1.25"));
        assert_eq!(from_scaled_integer(BigInt::from(7), 0).unwrap(), dec("7"));
        assert!(matches!(
            from_scaled_integer(BigInt::from(5), 1),
            Err(Error::InvalidScale { scale: 1 })
        ));
    }
}
