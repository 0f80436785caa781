use std::cmp::Ordering;
use std::fmt;

use num_bigint::BigInt;
use num_traits::{FromPrimitive, ToPrimitive, Zero};

use crate::heap::Heap;
use crate::value::Value;

/// A number lifted out of the heap for arithmetic. Integers that outgrow
/// `i64` continue as `Big`; results are narrowed again when they fit.
#[derive(Debug, Clone, PartialEq)]
pub enum Num {
    Int(i64),
    Big(BigInt),
    Float(f64),
}

impl Num {
    pub fn from_value(val: Value, heap: &Heap) -> Option<Num> {
        match val {
            Value::Int(n) => Some(Num::Int(n)),
            Value::Float(x) => Some(Num::Float(x)),
            Value::BigInt(id) => Some(Num::Big(heap.bigint(id).clone())),
            _ => None,
        }
    }

    pub fn into_value(self, heap: &mut Heap) -> Value {
        match self.normalize() {
            Num::Int(n) => Value::Int(n),
            Num::Float(x) => Value::Float(x),
            Num::Big(n) => heap.alloc_bigint(n),
        }
    }

    fn normalize(self) -> Num {
        match self {
            Num::Big(n) => match n.to_i64() {
                Some(small) => Num::Int(small),
                None => Num::Big(n),
            },
            other => other,
        }
    }

    fn to_big(&self) -> Option<BigInt> {
        match self {
            Num::Int(n) => Some(BigInt::from(*n)),
            Num::Big(n) => Some(n.clone()),
            Num::Float(_) => None,
        }
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            Num::Int(n) => *n as f64,
            Num::Big(n) => n.to_f64().unwrap_or(f64::NAN),
            Num::Float(x) => *x,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Num::Float(_))
    }

    fn is_zero(&self) -> bool {
        match self {
            Num::Int(n) => *n == 0,
            Num::Big(n) => n.is_zero(),
            Num::Float(x) => *x == 0.0,
        }
    }

    /// Apply one of the integer operations, falling back to bignums when
    /// the `i64` form overflows and to floats when either side is a float.
    fn combine(
        self,
        other: Num,
        small: fn(i64, i64) -> Option<i64>,
        big: fn(BigInt, BigInt) -> BigInt,
        float: fn(f64, f64) -> f64,
    ) -> Num {
        if self.is_float() || other.is_float() {
            return Num::Float(float(self.to_f64(), other.to_f64()));
        }
        if let (Num::Int(a), Num::Int(b)) = (&self, &other) {
            if let Some(n) = small(*a, *b) {
                return Num::Int(n);
            }
        }
        match (self.to_big(), other.to_big()) {
            (Some(a), Some(b)) => Num::Big(big(a, b)).normalize(),
            _ => Num::Float(f64::NAN),
        }
    }

    pub fn add(self, other: Num) -> Num {
        self.combine(other, i64::checked_add, |a, b| a + b, |a, b| a + b)
    }

    pub fn sub(self, other: Num) -> Num {
        self.combine(other, i64::checked_sub, |a, b| a - b, |a, b| a - b)
    }

    pub fn mul(self, other: Num) -> Num {
        self.combine(other, i64::checked_mul, |a, b| a * b, |a, b| a * b)
    }

    /// Integer division truncates toward zero; an integer zero divisor is
    /// an error while a float one follows IEEE rules.
    pub fn div(self, other: Num) -> Result<Num, String> {
        if !self.is_float() && !other.is_float() && other.is_zero() {
            return Err("division by zero".into());
        }
        Ok(self.combine(other, i64::checked_div, |a, b| a / b, |a, b| a / b))
    }

    /// Remainder of truncating division: the result takes the sign of the
    /// dividend.
    pub fn rem(self, other: Num) -> Result<Num, String> {
        if !self.is_float() && !other.is_float() && other.is_zero() {
            return Err("division by zero".into());
        }
        Ok(self.combine(other, i64::checked_rem, |a, b| a % b, |a, b| a % b))
    }

    pub fn neg(self) -> Num {
        Num::Int(0).sub(self)
    }

    /// Numeric ordering across kinds; `None` only when a NaN is involved.
    pub fn compare(&self, other: &Num) -> Option<Ordering> {
        match (self, other) {
            (Num::Int(a), Num::Int(b)) => Some(a.cmp(b)),
            (Num::Float(_), _) | (_, Num::Float(_)) => self.to_f64().partial_cmp(&other.to_f64()),
            _ => {
                let a = self.to_big()?;
                let b = other.to_big()?;
                Some(a.cmp(&b))
            }
        }
    }

    /// Equality without crossing the integer/float divide.
    pub fn eql(&self, other: &Num) -> bool {
        match (self, other) {
            (Num::Float(a), Num::Float(b)) => a == b,
            (Num::Float(_), _) | (_, Num::Float(_)) => false,
            _ => self.compare(other) == Some(Ordering::Equal),
        }
    }

    /// Drop the fraction of a float; integers pass through.
    pub fn truncate(self) -> Result<Num, String> {
        match self {
            Num::Float(x) => BigInt::from_f64(x.trunc())
                .map(|n| Num::Big(n).normalize())
                .ok_or_else(|| format!("cannot truncate {:?}", x)),
            other => Ok(other),
        }
    }
}

impl fmt::Display for Num {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Num::Int(n) => write!(f, "{}", n),
            Num::Big(n) => write!(f, "{}", n),
            Num::Float(x) => write!(f, "{:?}", x),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn big(text: &str) -> Num {
        Num::Big(text.parse().unwrap())
    }

    #[test]
    fn overflow_promotes_and_narrows_back() {
        let sum = Num::Int(i64::MAX).add(Num::Int(1));
        assert_eq!(sum, big("9223372036854775808"));
        assert_eq!(sum.sub(Num::Int(1)), Num::Int(i64::MAX));
        assert_eq!(Num::Int(i64::MIN).neg(), big("9223372036854775808"));
    }

    #[test]
    fn mixed_arithmetic_goes_float() {
        assert_eq!(Num::Int(1).add(Num::Float(0.5)), Num::Float(1.5));
        assert_eq!(Num::Float(3.0).mul(Num::Int(2)), Num::Float(6.0));
    }

    #[test]
    fn division_truncates_toward_zero() {
        assert_eq!(Num::Int(7).div(Num::Int(2)), Ok(Num::Int(3)));
        assert_eq!(Num::Int(-7).div(Num::Int(2)), Ok(Num::Int(-3)));
        assert_eq!(Num::Int(1).div(Num::Int(0)), Err("division by zero".to_string()));
        assert_eq!(Num::Int(i64::MIN).div(Num::Int(-1)), Ok(big("9223372036854775808")));
        assert_eq!(Num::Float(1.0).div(Num::Int(4)), Ok(Num::Float(0.25)));
    }

    #[test]
    fn remainder_follows_dividend_sign() {
        assert_eq!(Num::Int(7).rem(Num::Int(3)), Ok(Num::Int(1)));
        assert_eq!(Num::Int(-7).rem(Num::Int(3)), Ok(Num::Int(-1)));
        assert_eq!(Num::Int(7).rem(Num::Int(-3)), Ok(Num::Int(1)));
        assert_eq!(Num::Int(i64::MIN).rem(Num::Int(-1)), Ok(Num::Int(0)));
        assert_eq!(big("-100000000000000000000").rem(Num::Int(7)), Ok(Num::Int(-2)));
        assert_eq!(Num::Float(-7.5).rem(Num::Int(2)), Ok(Num::Float(-1.5)));
    }

    #[test]
    fn comparison_and_eql() {
        assert_eq!(Num::Int(1).compare(&Num::Float(1.5)), Some(Ordering::Less));
        assert_eq!(big("100000000000000000000").compare(&Num::Int(5)), Some(Ordering::Greater));
        assert!(Num::Int(2).eql(&Num::Int(2)));
        assert!(!Num::Int(2).eql(&Num::Float(2.0)));
        assert!(Num::Float(2.0).eql(&Num::Float(2.0)));
    }

    #[test]
    fn truncate_floats() {
        assert_eq!(Num::Float(-2.7).truncate(), Ok(Num::Int(-2)));
        assert_eq!(Num::Float(1e20).truncate(), Ok(big("100000000000000000000")));
        assert!(Num::Float(f64::NAN).truncate().is_err());
    }
}
