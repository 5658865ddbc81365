use std::cmp::Ordering;
use std::fmt;

use num::complex::Complex;
use num::{BigInt, BigRational, One, Signed, ToPrimitive, Zero};

use crate::error::EvalError;

/// An exact number from the three-level tower `Int ⊂ Rational ⊂ Complex`.
///
/// Construction always canonicalizes downward: a complex number with zero
/// imaginary part demotes to a rational, an integral rational demotes to an
/// integer. This way structural equality (and [`Hash`]) coincide with numeric
/// equality, and membership tests against `Int`/`Real` reduce to a variant
/// check.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum Number {
    Integer(BigInt),
    Rational(BigRational),
    Complex(Complex<BigRational>),
}

impl Number {
    pub fn integer(value: impl Into<BigInt>) -> Self {
        Self::Integer(value.into())
    }

    pub fn zero() -> Self {
        Self::Integer(BigInt::zero())
    }

    pub fn one() -> Self {
        Self::Integer(BigInt::one())
    }

    /// Canonicalizes a rational: integral values demote to [`Number::Integer`].
    pub fn from_rational(value: BigRational) -> Self {
        if value.is_integer() {
            Self::Integer(value.to_integer())
        } else {
            Self::Rational(value)
        }
    }

    /// Canonicalizes a complex: a zero imaginary part demotes further down.
    pub fn from_complex(value: Complex<BigRational>) -> Self {
        if value.im.is_zero() {
            Self::from_rational(value.re)
        } else {
            Self::Complex(value)
        }
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Self::Integer(i) if i.is_zero())
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Self::Integer(_))
    }

    /// Whether this is an integer `>= 0`.
    pub fn is_whole(&self) -> bool {
        matches!(self, Self::Integer(i) if !i.is_negative())
    }

    /// Whether this is an integer `>= 1`.
    pub fn is_natural(&self) -> bool {
        matches!(self, Self::Integer(i) if i.is_positive())
    }

    /// Whether this number has no imaginary part.
    pub fn is_real(&self) -> bool {
        !matches!(self, Self::Complex(_))
    }

    /// The value as a rational, if it is real.
    pub fn as_rational(&self) -> Option<BigRational> {
        match self {
            Self::Integer(i) => Some(BigRational::from(i.clone())),
            Self::Rational(r) => Some(r.clone()),
            Self::Complex(_) => None,
        }
    }

    fn as_complex(&self) -> Complex<BigRational> {
        match self {
            Self::Integer(i) => Complex::from(BigRational::from(i.clone())),
            Self::Rational(r) => Complex::from(r.clone()),
            Self::Complex(c) => c.clone(),
        }
    }

    pub fn add(&self, other: &Self) -> Self {
        Self::from_complex(self.as_complex() + other.as_complex())
    }

    pub fn sub(&self, other: &Self) -> Self {
        Self::from_complex(self.as_complex() - other.as_complex())
    }

    pub fn mul(&self, other: &Self) -> Self {
        Self::from_complex(self.as_complex() * other.as_complex())
    }

    pub fn div(&self, other: &Self) -> Result<Self, EvalError> {
        if other.as_complex().is_zero() {
            return Err(EvalError::DivisionByZero);
        }
        Ok(Self::from_complex(self.as_complex() / other.as_complex()))
    }

    pub fn neg(&self) -> Self {
        Self::from_complex(-self.as_complex())
    }

    pub fn conj(&self) -> Self {
        Self::from_complex(self.as_complex().conj())
    }

    /// Exact exponentiation by an integer exponent.
    ///
    /// Non-integer exponents have no exact value in this tower and are
    /// rejected, as are `0^0`, negative powers of zero and exponents that do
    /// not fit into an `i64`.
    pub fn pow(&self, exponent: &Self) -> Result<Self, EvalError> {
        let Self::Integer(exponent) = exponent else {
            return Err(EvalError::Inexact(format!("^{exponent}")));
        };
        let exp = exponent.to_i64().ok_or(EvalError::ExponentTooLarge)?;

        let base = self.as_complex();
        if base.is_zero() {
            return match exp.cmp(&0) {
                Ordering::Greater => Ok(Self::zero()),
                Ordering::Equal => Err(EvalError::ZeroToZero),
                Ordering::Less => Err(EvalError::DivisionByZero),
            };
        }
        if exp == 0 {
            return Ok(Self::one());
        }

        let positive = pow_by_squaring(&base, exp.unsigned_abs());
        if exp > 0 {
            Ok(Self::from_complex(positive))
        } else {
            Ok(Self::from_complex(positive.inv()))
        }
    }

    /// Orders two real numbers; [`None`] if either has an imaginary part.
    pub fn cmp_real(&self, other: &Self) -> Option<Ordering> {
        Some(self.as_rational()?.cmp(&other.as_rational()?))
    }

    /// Absolute value; only exact for real numbers.
    pub fn abs(&self) -> Result<Self, EvalError> {
        match self.as_rational() {
            Some(r) => Ok(Self::from_rational(r.abs())),
            None => Err(EvalError::Inexact("abs".to_string())),
        }
    }

    /// Mathematical modulus with a non-negative result, e.g. `-5 mod 3 == 1`.
    pub fn modulo(&self, other: &Self) -> Result<Self, EvalError> {
        let (Self::Integer(lhs), Self::Integer(rhs)) = (self, other) else {
            return Err(EvalError::InvalidOperand {
                op: "mod".to_string(),
                operand: format!("({self}, {other})"),
            });
        };
        if rhs.is_zero() {
            return Err(EvalError::DivisionByZero);
        }
        let rem = ((lhs % rhs) + rhs) % rhs;
        Ok(Self::Integer(rem))
    }
}

fn pow_by_squaring(base: &Complex<BigRational>, mut exp: u64) -> Complex<BigRational> {
    let mut result = Complex::from(BigRational::one());
    let mut square = base.clone();
    while exp > 0 {
        if exp & 1 == 1 {
            result *= square.clone();
        }
        exp >>= 1;
        if exp > 0 {
            square = square.clone() * square;
        }
    }
    result
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{i}"),
            Self::Rational(r) => write!(f, "{r}"),
            Self::Complex(c) => {
                if c.im.is_negative() {
                    write!(f, "{}{}i", c.re, c.im)
                } else {
                    write!(f, "{}+{}i", c.re, c.im)
                }
            }
        }
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Self::Integer(BigInt::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rational(numer: i64, denom: i64) -> Number {
        Number::from_rational(BigRational::new(BigInt::from(numer), BigInt::from(denom)))
    }

    #[test]
    fn canonicalization() {
        // 4/2 demotes to the integer 2
        assert_eq!(rational(4, 2), Number::from(2));
        // 3+0i demotes all the way down
        let three = Complex::from(BigRational::from(BigInt::from(3)));
        assert_eq!(Number::from_complex(three), Number::from(3));
        assert_ne!(rational(1, 2), Number::from(0));
    }

    #[test]
    fn predicates() {
        assert!(Number::from(0).is_whole());
        assert!(!Number::from(0).is_natural());
        assert!(Number::from(1).is_natural());
        assert!(!Number::from(-1).is_whole());
        assert!(rational(1, 2).is_real());
        assert!(!rational(1, 2).is_integer());
    }

    #[test]
    fn exact_arithmetic() {
        let half = rational(1, 2);
        assert_eq!(half.add(&half), Number::from(1));
        assert_eq!(Number::from(3).div(&Number::from(2)).unwrap(), rational(3, 2));
        assert_eq!(
            Number::from(7).div(&Number::from(0)),
            Err(EvalError::DivisionByZero)
        );
    }

    #[test]
    fn pow() {
        assert_eq!(
            Number::from(2).pow(&Number::from(10)).unwrap(),
            Number::from(1024)
        );
        assert_eq!(Number::from(2).pow(&Number::from(-2)).unwrap(), rational(1, 4));
        assert_eq!(Number::from(5).pow(&Number::from(0)).unwrap(), Number::from(1));
        assert_eq!(
            Number::from(0).pow(&Number::from(0)),
            Err(EvalError::ZeroToZero)
        );
        assert!(Number::from(2).pow(&rational(1, 2)).is_err());
    }

    #[test]
    fn modulo() {
        assert_eq!(
            Number::from(4).modulo(&Number::from(3)).unwrap(),
            Number::from(1)
        );
        assert_eq!(
            Number::from(-5).modulo(&Number::from(3)).unwrap(),
            Number::from(1)
        );
    }
}
