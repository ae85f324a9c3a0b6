use std::ops::{Add, Div, Mul, Neg, Sub};

use num::{Integer, One, Zero};

use crate::scheme::Scheme;

/// Numeric view of a value. Mixing an `Int` with a `Double` promotes the
/// result to `Double`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Number {
    Int(i64),
    Double(f64),
}

impl Number {
    pub fn from_scheme(value: &Scheme) -> Option<Number> {
        value
            .as_int()
            .map(Number::Int)
            .or_else(|| value.as_double().map(Number::Double))
    }

    pub fn to_scheme(self) -> Scheme {
        match self {
            Number::Int(n) => Scheme::int(n),
            Number::Double(d) => Scheme::double(d),
        }
    }

    /// Comparisons and mixed arithmetic happen on doubles.
    pub fn to_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Double(d) => d,
        }
    }

    pub fn is_double(&self) -> bool {
        matches!(self, Number::Double(_))
    }

    /// Integer modulo whose result takes the sign of the divisor. `None` when
    /// the divisor is zero.
    pub fn modulo(a: i64, b: i64) -> Option<i64> {
        match b {
            0 => None,
            // Avoids the overflow of `i64::MIN % -1`.
            -1 => Some(0),
            _ => Some(a.mod_floor(&b)),
        }
    }
}

macro_rules! impl_binary_ops {
    { $(($optrait:ident, $opname:ident, $intop:ident)),* } => {
        $(
            impl $optrait<Number> for Number {
                type Output = Number;

                fn $opname(self, other: Number) -> Number {
                    match (self, other) {
                        (Number::Int(a), Number::Int(b)) => match a.$intop(b) {
                            Some(n) => Number::Int(n),
                            // Overflow falls back to double arithmetic.
                            None => Number::Double($optrait::$opname(a as f64, b as f64)),
                        },
                        (a, b) => Number::Double($optrait::$opname(a.to_f64(), b.to_f64())),
                    }
                }
            }
        )*
    }
}

impl_binary_ops! {
    (Add, add, checked_add),
    (Sub, sub, checked_sub),
    (Mul, mul, checked_mul)
}

/// Stays an `Int` only when the division is exact. Dividing by zero is the
/// caller's problem.
impl Div<Number> for Number {
    type Output = Number;

    fn div(self, other: Number) -> Number {
        if let (Number::Int(a), Number::Int(b)) = (self, other) {
            if let (Some(0), Some(q)) = (a.checked_rem(b), a.checked_div(b)) {
                return Number::Int(q);
            }
        }
        Number::Double(self.to_f64() / other.to_f64())
    }
}

impl Neg for Number {
    type Output = Number;

    fn neg(self) -> Number {
        match self {
            Number::Int(n) => n
                .checked_neg()
                .map_or(Number::Double(-(n as f64)), Number::Int),
            Number::Double(d) => Number::Double(-d),
        }
    }
}

impl Zero for Number {
    fn zero() -> Number {
        Number::Int(0)
    }

    fn is_zero(&self) -> bool {
        match *self {
            Number::Int(n) => n == 0,
            Number::Double(d) => d == 0.0,
        }
    }
}

impl One for Number {
    fn one() -> Number {
        Number::Int(1)
    }
}

#[test]
fn test_int_stays_int() {
    assert_eq!(Number::Int(2) + Number::Int(3), Number::Int(5));
    assert_eq!(Number::Int(2) * Number::Int(3), Number::Int(6));
}

#[test]
fn test_double_promotion() {
    assert_eq!(Number::Int(1) + Number::Double(2.0), Number::Double(3.0));
    assert_eq!(Number::Double(1.5) - Number::Int(1), Number::Double(0.5));
    assert!((Number::Int(2) * Number::Double(0.5)).is_double());
}

#[test]
fn test_overflow_promotes() {
    assert_eq!(
        Number::Int(i64::MAX) + Number::Int(1),
        Number::Double(i64::MAX as f64 + 1.0)
    );
    assert_eq!(
        Number::Int(i64::MIN) - Number::Int(1),
        Number::Double(i64::MIN as f64 - 1.0)
    );
    assert!((Number::Int(i64::MAX) * Number::Int(2)).is_double());
    assert_eq!(-Number::Int(i64::MIN), Number::Double(-(i64::MIN as f64)));
    assert_eq!(-Number::Int(5), Number::Int(-5));
}

#[test]
fn test_division_exactness() {
    assert_eq!(Number::Int(6) / Number::Int(2), Number::Int(3));
    assert_eq!(Number::Int(7) / Number::Int(2), Number::Double(3.5));
    assert_eq!(Number::one() / Number::Int(4), Number::Double(0.25));
    assert_eq!(Number::Int(6) / Number::Double(2.0), Number::Double(3.0));
}

#[test]
fn test_modulo_sign_follows_divisor() {
    assert_eq!(Number::modulo(-7, 3), Some(2));
    assert_eq!(Number::modulo(7, -3), Some(-2));
    assert_eq!(Number::modulo(7, 3), Some(1));
    assert_eq!(Number::modulo(-6, 3), Some(0));
    assert_eq!(Number::modulo(i64::MIN, -1), Some(0));
    assert_eq!(Number::modulo(5, 0), None);
}

#[test]
fn test_zero() {
    assert!(Number::zero().is_zero());
    assert!(Number::Double(0.0).is_zero());
    assert!(!Number::Double(0.1).is_zero());
}
