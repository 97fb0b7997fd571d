// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.
#![allow(clippy::float_cmp, clippy::as_conversions)]

use core::cmp::Ordering;
use core::fmt::{self, Debug, Display, Formatter};
use core::str::FromStr;

use serde::ser::Serializer;
use serde::Serialize;

use crate::error::EvaluationError;

/// Numeric value. Integers stay exact until an operation overflows, at which
/// point the result falls back to a float.
#[derive(Clone, Copy)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(&self) -> f64 {
        match *self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    /// The value as an integer, when it has no fractional part.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Number::Int(i) => Some(i),
            Number::Float(f) if f.is_finite() && f.fract() == 0.0 => {
                let i = f as i64;
                ((i as f64) == f).then_some(i)
            }
            Number::Float(_) => None,
        }
    }

    pub fn is_integer(&self) -> bool {
        self.as_i64().is_some()
    }

    pub fn is_zero(&self) -> bool {
        match *self {
            Number::Int(i) => i == 0,
            Number::Float(f) => f == 0.0,
        }
    }

    pub fn add(&self, rhs: &Number) -> Number {
        match (*self, *rhs) {
            (Number::Int(a), Number::Int(b)) => a
                .checked_add(b)
                .map_or_else(|| Number::Float(a as f64 + b as f64), Number::Int),
            (a, b) => Number::Float(a.as_f64() + b.as_f64()),
        }
    }

    pub fn sub(&self, rhs: &Number) -> Number {
        match (*self, *rhs) {
            (Number::Int(a), Number::Int(b)) => a
                .checked_sub(b)
                .map_or_else(|| Number::Float(a as f64 - b as f64), Number::Int),
            (a, b) => Number::Float(a.as_f64() - b.as_f64()),
        }
    }

    pub fn mul(&self, rhs: &Number) -> Number {
        match (*self, *rhs) {
            (Number::Int(a), Number::Int(b)) => a
                .checked_mul(b)
                .map_or_else(|| Number::Float(a as f64 * b as f64), Number::Int),
            (a, b) => Number::Float(a.as_f64() * b.as_f64()),
        }
    }

    /// True division. Integral quotients of integers stay integers.
    pub fn divide(&self, rhs: &Number) -> Result<Number, EvaluationError> {
        if rhs.is_zero() {
            return Err(EvaluationError::DivisionByZero);
        }
        match (*self, *rhs) {
            (Number::Int(a), Number::Int(b)) if b != -1 && a % b == 0 => Ok(Number::Int(a / b)),
            (a, b) => Ok(Number::Float(a.as_f64() / b.as_f64())),
        }
    }

    /// Modulo whose result takes the sign of the divisor.
    pub fn modulo(&self, rhs: &Number) -> Result<Number, EvaluationError> {
        if rhs.is_zero() {
            return Err(EvaluationError::DivisionByZero);
        }
        match (*self, *rhs) {
            (Number::Int(a), Number::Int(b)) => match a.checked_rem(b) {
                Some(r) if r != 0 && ((r < 0) != (b < 0)) => Ok(Number::Int(r + b)),
                Some(r) => Ok(Number::Int(r)),
                // i64::MIN % -1
                None => Ok(Number::Int(0)),
            },
            (a, b) => {
                let (a, b) = (a.as_f64(), b.as_f64());
                let mut r = a % b;
                if r != 0.0 && ((r < 0.0) != (b < 0.0)) {
                    r += b;
                }
                Ok(Number::Float(r))
            }
        }
    }

    pub fn pow(&self, rhs: &Number) -> Result<Number, EvaluationError> {
        if let (Number::Int(base), Number::Int(exp)) = (*self, *rhs) {
            if let Ok(exp) = u32::try_from(exp) {
                if let Some(v) = base.checked_pow(exp) {
                    return Ok(Number::Int(v));
                }
            }
        }
        if self.is_zero() && rhs.as_f64() < 0.0 {
            return Err(EvaluationError::DivisionByZero);
        }
        Ok(Number::Float(self.as_f64().powf(rhs.as_f64())))
    }

    pub fn neg(&self) -> Number {
        match *self {
            Number::Int(i) => i
                .checked_neg()
                .map_or_else(|| Number::Float(-(i as f64)), Number::Int),
            Number::Float(f) => Number::Float(-f),
        }
    }

    pub fn floor(&self) -> Number {
        match *self {
            Number::Int(_) => *self,
            Number::Float(f) => Self::integral(f.floor()),
        }
    }

    pub fn ceil(&self) -> Number {
        match *self {
            Number::Int(_) => *self,
            Number::Float(f) => Self::integral(f.ceil()),
        }
    }

    fn integral(f: f64) -> Number {
        match Number::Float(f).as_i64() {
            Some(i) => Number::Int(i),
            None => Number::Float(f),
        }
    }

    pub fn format_decimal(&self) -> String {
        match *self {
            Number::Int(i) => i.to_string(),
            Number::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e16 => {
                format!("{f:.1}")
            }
            Number::Float(f) => f.to_string(),
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Number {}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Exact ordering of an integer against a float. Integers above 2^53 are not
// rounded, so the order stays transitive across kinds.
fn cmp_int_float(i: i64, f: f64) -> Ordering {
    // 2^63, the first float above every i64.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if f.is_nan() {
        return (i as f64).total_cmp(&f);
    }
    if f >= LIMIT {
        return Ordering::Less;
    }
    if f < -LIMIT {
        return Ordering::Greater;
    }
    let whole = f.trunc();
    i.cmp(&(whole as i64))
        .then_with(|| 0.0_f64.total_cmp(&(f - whole)))
}

// Floats compare by `total_cmp`, except that -0.0 and 0.0 are equal.
fn cmp_floats(a: f64, b: f64) -> Ordering {
    if a == b {
        Ordering::Equal
    } else {
        a.total_cmp(&b)
    }
}

impl Ord for Number {
    fn cmp(&self, other: &Self) -> Ordering {
        match (*self, *other) {
            (Number::Int(a), Number::Int(b)) => a.cmp(&b),
            (Number::Int(a), Number::Float(b)) => cmp_int_float(a, b),
            (Number::Float(a), Number::Int(b)) => cmp_int_float(b, a).reverse(),
            (Number::Float(a), Number::Float(b)) => cmp_floats(a, b),
        }
    }
}

impl Debug for Number {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_decimal())
    }
}

impl Display for Number {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_decimal())
    }
}

impl Serialize for Number {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match *self {
            Number::Int(i) => serializer.serialize_i64(i),
            Number::Float(f) => serializer.serialize_f64(f),
        }
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::Int(value)
    }
}

impl From<i32> for Number {
    fn from(value: i32) -> Self {
        Number::Int(i64::from(value))
    }
}

impl From<u64> for Number {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(i) => Number::Int(i),
            Err(_) => Number::Float(value as f64),
        }
    }
}

impl From<usize> for Number {
    fn from(value: usize) -> Self {
        Number::from(value as u64)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Float(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseNumberError;

impl FromStr for Number {
    type Err = ParseNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(i) = s.parse::<i64>() {
            return Ok(Number::Int(i));
        }
        match s.parse::<f64>() {
            // Reject spellings like "inf" and "NaN" that are not numeric literals.
            Ok(f) if s.bytes().any(|b| b.is_ascii_digit()) => Ok(Number::Float(f)),
            _ => Err(ParseNumberError),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_equality() {
        assert_eq!(Number::Int(1), Number::Float(1.0));
        assert!(Number::Int(1) < Number::Float(1.0001));
        assert_ne!(Number::Int(3), Number::Float(3.5));
    }

    #[test]
    fn large_integers_compare_exactly_with_floats() {
        let odd = Number::Int(9_007_199_254_740_993);
        let even = Number::Int(9_007_199_254_740_992);
        let float = Number::Float(9_007_199_254_740_992.0);
        assert_eq!(even, float);
        assert!(odd > float);
        assert!(float < odd);
        assert_ne!(odd, even);

        assert!(Number::Int(i64::MAX) < Number::Float(9_223_372_036_854_775_808.0));
        assert_eq!(Number::Int(i64::MIN), Number::Float(-9_223_372_036_854_775_808.0));
        assert!(Number::Int(-3) > Number::Float(-3.5));
        assert!(Number::Int(-3) < Number::Float(-2.5));
        assert!(Number::Int(0) < Number::Float(f64::INFINITY));
        assert!(Number::Int(0) > Number::Float(f64::NEG_INFINITY));
        assert_eq!(Number::Int(0), Number::Float(-0.0));
        assert_eq!(Number::Float(0.0), Number::Float(-0.0));
    }

    #[test]
    fn overflow_falls_back_to_float() {
        let big = Number::Int(i64::MAX);
        assert!(matches!(big.add(&Number::Int(1)), Number::Float(_)));
        assert!(matches!(
            Number::Int(2).pow(&Number::Int(80)).unwrap(),
            Number::Float(_)
        ));
    }

    #[test]
    fn division_and_modulo() {
        assert_eq!(
            Number::Int(21).divide(&Number::Int(5)).unwrap(),
            Number::Float(4.2)
        );
        assert!(matches!(
            Number::Int(8).divide(&Number::Int(2)).unwrap(),
            Number::Int(4)
        ));
        assert_eq!(
            Number::Int(-7).modulo(&Number::Int(3)).unwrap(),
            Number::Int(2)
        );
        assert_eq!(
            Number::Int(1).divide(&Number::Int(0)),
            Err(EvaluationError::DivisionByZero)
        );
    }

    #[test]
    fn parse_rejects_words() {
        assert_eq!("1".parse::<Number>(), Ok(Number::Int(1)));
        assert_eq!(" 2.5 ".parse::<Number>(), Ok(Number::Float(2.5)));
        assert!("inf".parse::<Number>().is_err());
        assert!("abc".parse::<Number>().is_err());
    }
}
