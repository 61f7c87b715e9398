//! Fixed-scale decimal helpers for curve arithmetic.
//!
//! Every ledger quantity is truncated toward zero at [`SCALE`] fractional
//! digits. The one exception is the pool left behind by a sell, which is
//! rounded up so repeated trades can never drain value out of rounding error.

use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use std::str::FromStr;

use crate::core::{Error, Result};

/// Fractional digits kept on every ledger value.
pub const SCALE: u32 = 18;

/// Truncate toward zero at the ledger scale.
#[inline]
pub fn trunc(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(SCALE, RoundingStrategy::ToZero)
}

/// Round up at the ledger scale, for values the pool must never undershoot.
#[inline]
pub fn ceil(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(SCALE, RoundingStrategy::ToPositiveInfinity)
}

pub fn mul(a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_mul(b).map(trunc).ok_or(Error::Overflow("multiplication"))
}

pub fn div(a: Decimal, b: Decimal) -> Result<Decimal> {
    if b.is_zero() {
        return Err(Error::Overflow("division by zero"));
    }
    a.checked_div(b).ok_or(Error::Overflow("division"))
}

pub fn add(a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_add(b).ok_or(Error::Overflow("addition"))
}

/// `base ^ exp` for a non-negative base.
///
/// Integral exponents go through exact repeated multiplication; fractional
/// ones through `exp(ln(base) * exp)`.
pub fn pow(base: Decimal, exp: Decimal) -> Result<Decimal> {
    if base.is_zero() {
        return Ok(Decimal::ZERO);
    }
    base.checked_powd(exp.normalize())
        .ok_or(Error::Overflow("exponentiation"))
}

/// Parse a caller-supplied trade amount.
pub fn parse_amount(input: &str) -> Result<Decimal> {
    let raw = input.trim();
    let value = Decimal::from_str(raw)
        .map_err(|_| Error::InvalidAmount(format!("'{}' is not a number", raw)))?;
    ensure_positive(trunc(value))
}

pub fn ensure_positive(value: Decimal) -> Result<Decimal> {
    if value <= Decimal::ZERO {
        return Err(Error::InvalidAmount(format!("{} must be positive", value)));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trunc_rounds_toward_zero() {
        let third = Decimal::ONE / Decimal::from(3);
        let t = trunc(third);
        assert_eq!(t.scale(), SCALE);
        assert_eq!(t.to_string(), "0.333333333333333333");

        let two_thirds = Decimal::from(2) / Decimal::from(3);
        assert_eq!(trunc(two_thirds).to_string(), "0.666666666666666666");
        assert_eq!(trunc(-two_thirds).to_string(), "-0.666666666666666666");
    }

    #[test]
    fn test_ceil_rounds_up() {
        let third = Decimal::ONE / Decimal::from(3);
        assert_eq!(ceil(third).to_string(), "0.333333333333333334");
        assert_eq!(ceil(Decimal::from(40)), Decimal::from(40));
    }

    #[test]
    fn test_integral_pow_is_exact() {
        let ratio = Decimal::from_str("7.1875").unwrap();
        let r = pow(ratio, Decimal::from(5)).unwrap();
        // 7.1875^5 = 19181.79690837860107421875
        assert_eq!(r, Decimal::from_str("19181.79690837860107421875").unwrap());
    }

    #[test]
    fn test_fractional_pow_is_close() {
        let r = pow(Decimal::from(32), Decimal::new(2, 1)).unwrap();
        let err = (r - Decimal::from(2)).abs();
        assert!(err < Decimal::new(1, 8), "32^0.2 = {}", r);
    }

    #[test]
    fn test_pow_zero_base() {
        assert_eq!(pow(Decimal::ZERO, Decimal::new(2, 1)).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_pow_overflow() {
        let r = pow(Decimal::from(1_000_000), Decimal::from(10));
        assert!(matches!(r, Err(Error::Overflow(_))));
    }

    #[test]
    fn test_div_by_zero() {
        assert!(div(Decimal::ONE, Decimal::ZERO).is_err());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(" 100 ").unwrap(), Decimal::from(100));
        assert_eq!(parse_amount("0.5").unwrap(), Decimal::new(5, 1));
        assert!(matches!(parse_amount("abc"), Err(Error::InvalidAmount(_))));
        assert!(matches!(parse_amount("0"), Err(Error::InvalidAmount(_))));
        assert!(matches!(parse_amount("-3"), Err(Error::InvalidAmount(_))));
    }
}
