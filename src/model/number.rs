//! The numeric value type flowing through the expression algebra.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Add;
use std::ops::Mul;
use std::ops::Neg;
use std::ops::Rem;
use std::ops::Sub;

/// A number produced by evaluating an [`Expression`](crate::model::Expression).
///
/// Variable domains are always sets of exact integers (the system only models `IntVar`s), but
/// evaluation can produce a real number: division always true-divides, matching the host
/// semantics the original solver was built against.
#[derive(Debug, Clone, Copy)]
pub enum Number {
    Int(i64),
    Real(f64),
}

impl Number {
    /// Returns the value as an `f64`, for comparisons and arithmetic that must mix integers and
    /// reals.
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Real(r) => r,
        }
    }

    /// Returns `Some(i64)` if this number is an exact integer (either an `Int`, or a `Real` with
    /// no fractional part).
    pub fn as_i64(self) -> Option<i64> {
        match self {
            Number::Int(n) => Some(n),
            Number::Real(r) if r.fract() == 0.0 => Some(r as i64),
            Number::Real(_) => None,
        }
    }

    pub fn is_zero(self) -> bool {
        self.as_f64() == 0.0
    }

    pub fn is_one(self) -> bool {
        self.as_f64() == 1.0
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(n) => write!(f, "{n}"),
            Number::Real(r) => write!(f, "{r}"),
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
        Number::Int(value as i64)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Real(value)
    }
}

/// Exact equality of evaluated numbers, as required by the no-tolerance comparison contract:
/// two integers compare exactly, two reals compare exactly, and a mixed pair compares exactly
/// once promoted to `f64`. Hand-implemented (rather than derived) so a mixed pair doesn't compare
/// unequal purely on enum discriminant, which would make `Int(1) == Real(1.0)` false and disagree
/// with `partial_cmp`, which already promotes.
impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a == b,
            _ => self.as_f64() == other.as_f64(),
        }
    }
}

impl Eq for Number {}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a.partial_cmp(b),
            _ => self.as_f64().partial_cmp(&other.as_f64()),
        }
    }
}

impl Add for Number {
    type Output = Number;

    fn add(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Number::Int(a), Number::Int(b)) => Number::Int(a + b),
            _ => Number::Real(self.as_f64() + rhs.as_f64()),
        }
    }
}

impl Sub for Number {
    type Output = Number;

    fn sub(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Number::Int(a), Number::Int(b)) => Number::Int(a - b),
            _ => Number::Real(self.as_f64() - rhs.as_f64()),
        }
    }
}

impl Mul for Number {
    type Output = Number;

    fn mul(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Number::Int(a), Number::Int(b)) => Number::Int(a * b),
            _ => Number::Real(self.as_f64() * rhs.as_f64()),
        }
    }
}

impl Rem for Number {
    type Output = Number;

    fn rem(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Number::Int(a), Number::Int(b)) => Number::Int(a % b),
            _ => Number::Real(self.as_f64() % rhs.as_f64()),
        }
    }
}

impl Neg for Number {
    type Output = Number;

    fn neg(self) -> Self::Output {
        match self {
            Number::Int(n) => Number::Int(-n),
            Number::Real(r) => Number::Real(-r),
        }
    }
}

/// True division, matching the source's `/` operator: always produces a [`Number::Real`], even
/// when the result happens to be integral.
pub(crate) fn true_divide(lhs: Number, rhs: Number) -> Number {
    Number::Real(lhs.as_f64() / rhs.as_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_arithmetic_stays_exact() {
        assert_eq!(Number::Int(3) + Number::Int(4), Number::Int(7));
        assert_eq!(Number::Int(3) * Number::Int(4), Number::Int(12));
    }

    #[test]
    fn division_always_promotes_to_real() {
        assert_eq!(true_divide(Number::Int(4), Number::Int(2)), Number::Real(2.0));
    }

    #[test]
    fn mixed_comparison_uses_exact_f64_equality() {
        assert_eq!(Number::Int(2), Number::Real(2.0));
        assert_ne!(Number::Int(2), Number::Real(2.0001));
    }

    #[test]
    fn as_i64_rejects_fractional_reals() {
        assert_eq!(Number::Real(2.0).as_i64(), Some(2));
        assert_eq!(Number::Real(2.5).as_i64(), None);
    }
}
