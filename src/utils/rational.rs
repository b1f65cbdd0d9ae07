//! Exact rational numbers
//!
//! Token accounting for the rate limiter is done on fractions kept in lowest
//! terms, so that fractional credit accumulated over long sessions never
//! drifts. Only the final wait is turned into a `Duration`.

use serde::{Deserialize, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Div, Mul, Sub};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const NANOS_PER_SEC: i128 = 1_000_000_000;

/// Rational parsing/construction errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RationalError {
    #[error("Denominator cannot be zero")]
    ZeroDenominator,

    #[error("Invalid rational literal: {0}")]
    Invalid(String),
}

/// A fraction `num / den` with `den > 0`, always reduced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "(i64, i64)")]
pub struct Rational {
    num: i128,
    den: i128,
}

fn gcd(mut a: i128, mut b: i128) -> i128 {
    a = a.abs();
    b = b.abs();
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

impl Rational {
    pub const ZERO: Rational = Rational { num: 0, den: 1 };
    pub const ONE: Rational = Rational { num: 1, den: 1 };

    /// Create a reduced fraction
    pub fn new(num: i128, den: i128) -> Result<Self, RationalError> {
        if den == 0 {
            return Err(RationalError::ZeroDenominator);
        }
        Ok(Self::reduced(num, den))
    }

    /// Whole number
    pub fn integer(value: i128) -> Self {
        Self { num: value, den: 1 }
    }

    fn reduced(num: i128, den: i128) -> Self {
        let sign = if den < 0 { -1 } else { 1 };
        let g = gcd(num, den).max(1);
        Self {
            num: sign * num / g,
            den: sign * den / g,
        }
    }

    pub fn numer(&self) -> i128 {
        self.num
    }

    pub fn denom(&self) -> i128 {
        self.den
    }

    pub fn is_positive(&self) -> bool {
        self.num > 0
    }

    pub fn is_negative(&self) -> bool {
        self.num < 0
    }

    /// Multiplicative inverse, `None` for zero
    pub fn recip(self) -> Option<Self> {
        if self.num == 0 {
            None
        } else {
            Some(Self::reduced(self.den, self.num))
        }
    }

    /// Exact number of seconds in a duration
    pub fn from_duration(duration: Duration) -> Self {
        Self::reduced(duration.as_nanos() as i128, NANOS_PER_SEC)
    }

    /// Seconds to a duration, rounding up to the next nanosecond.
    ///
    /// Negative values clamp to zero.
    pub fn to_duration(self) -> Duration {
        if self.num <= 0 {
            return Duration::ZERO;
        }
        let scaled = self.num * NANOS_PER_SEC;
        let nanos = (scaled + self.den - 1) / self.den;
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }
}

impl Default for Rational {
    fn default() -> Self {
        Self::ZERO
    }
}

impl TryFrom<(i64, i64)> for Rational {
    type Error = RationalError;

    fn try_from((num, den): (i64, i64)) -> Result<Self, Self::Error> {
        Self::new(num as i128, den as i128)
    }
}

impl Serialize for Rational {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.num, self.den).serialize(serializer)
    }
}

impl Add for Rational {
    type Output = Rational;

    fn add(self, rhs: Rational) -> Rational {
        let g = gcd(self.den, rhs.den);
        let den = self.den / g * rhs.den;
        Rational::reduced(self.num * (den / self.den) + rhs.num * (den / rhs.den), den)
    }
}

impl Sub for Rational {
    type Output = Rational;

    fn sub(self, rhs: Rational) -> Rational {
        self + Rational { num: -rhs.num, den: rhs.den }
    }
}

impl Mul for Rational {
    type Output = Rational;

    fn mul(self, rhs: Rational) -> Rational {
        // Cross-reduce first to keep intermediates small
        let g1 = gcd(self.num, rhs.den).max(1);
        let g2 = gcd(rhs.num, self.den).max(1);
        Rational::reduced(
            (self.num / g1) * (rhs.num / g2),
            (self.den / g2) * (rhs.den / g1),
        )
    }
}

impl Div for Rational {
    type Output = Rational;

    /// Panics on division by zero, like integer division.
    fn div(self, rhs: Rational) -> Rational {
        match rhs.recip() {
            Some(inverse) => self * inverse,
            None => panic!("division of a rational by zero"),
        }
    }
}

impl Ord for Rational {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.num * other.den).cmp(&(other.num * self.den))
    }
}

impl PartialOrd for Rational {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

impl FromStr for Rational {
    type Err = RationalError;

    /// Accepts `"n/d"` or `"n"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RationalError::Invalid(s.to_string());
        match s.split_once('/') {
            Some((num, den)) => {
                let num = num.trim().parse::<i128>().map_err(|_| invalid())?;
                let den = den.trim().parse::<i128>().map_err(|_| invalid())?;
                Rational::new(num, den)
            }
            None => s
                .trim()
                .parse::<i128>()
                .map(Rational::integer)
                .map_err(|_| invalid()),
        }
    }
}
