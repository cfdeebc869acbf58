//! Extended-precision accumulator.
//!
//! [`Extended`] is an unevaluated sum `hi + lo` of two `f64` values with
//! `|lo| <= ulp(hi) / 2`, giving roughly 106 bits of significand. Addition
//! uses error-free two-sum and multiplication uses an FMA-based two-product,
//! so the product of two `f64` values is represented exactly.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Extended {
    hi: f64,
    lo: f64,
}

#[inline(always)]
fn two_sum(a: f64, b: f64) -> (f64, f64) {
    let s = a + b;
    let bb = s - a;
    let err = (a - (s - bb)) + (b - bb);
    (s, err)
}

#[inline(always)]
fn quick_two_sum(a: f64, b: f64) -> (f64, f64) {
    let s = a + b;
    let err = b - (s - a);
    (s, err)
}

#[inline(always)]
fn two_prod(a: f64, b: f64) -> (f64, f64) {
    let p = a * b;
    let err = a.mul_add(b, -p);
    (p, err)
}

impl Extended {
    pub const ZERO: Extended = Extended { hi: 0.0, lo: 0.0 };

    pub const fn from_f64(value: f64) -> Self {
        Self { hi: value, lo: 0.0 }
    }

    /// Exact product of two `f64` values.
    #[inline(always)]
    pub fn product(a: f64, b: f64) -> Self {
        let (hi, lo) = two_prod(a, b);
        Self { hi, lo }
    }

    pub fn hi(&self) -> f64 {
        self.hi
    }

    pub fn lo(&self) -> f64 {
        self.lo
    }

    /// Nearest `f64` to the represented value.
    #[inline(always)]
    pub fn to_f64(self) -> f64 {
        self.hi + self.lo
    }

    pub fn abs(self) -> Self {
        if self.hi < 0.0 || (self.hi == 0.0 && self.lo < 0.0) {
            -self
        } else {
            self
        }
    }

    pub fn max(self, other: Self) -> Self {
        if other > self {
            other
        } else {
            self
        }
    }

    pub fn is_finite(&self) -> bool {
        self.hi.is_finite() && self.lo.is_finite()
    }
}

impl From<f64> for Extended {
    fn from(value: f64) -> Self {
        Self::from_f64(value)
    }
}

impl From<f32> for Extended {
    fn from(value: f32) -> Self {
        Self::from_f64(value as f64)
    }
}

impl Add for Extended {
    type Output = Extended;

    #[inline(always)]
    fn add(self, rhs: Extended) -> Extended {
        let (s, e) = two_sum(self.hi, rhs.hi);
        let (t, f) = two_sum(self.lo, rhs.lo);
        let (s, e) = quick_two_sum(s, e + t);
        let (hi, lo) = quick_two_sum(s, e + f);
        Extended { hi, lo }
    }
}

impl AddAssign for Extended {
    #[inline(always)]
    fn add_assign(&mut self, rhs: Extended) {
        *self = *self + rhs;
    }
}

impl Neg for Extended {
    type Output = Extended;

    fn neg(self) -> Extended {
        Extended {
            hi: -self.hi,
            lo: -self.lo,
        }
    }
}

impl Sub for Extended {
    type Output = Extended;

    #[inline(always)]
    fn sub(self, rhs: Extended) -> Extended {
        self + (-rhs)
    }
}

impl Mul for Extended {
    type Output = Extended;

    #[inline(always)]
    fn mul(self, rhs: Extended) -> Extended {
        let (p, e) = two_prod(self.hi, rhs.hi);
        let e = e + (self.hi * rhs.lo + self.lo * rhs.hi);
        let (hi, lo) = quick_two_sum(p, e);
        Extended { hi, lo }
    }
}

impl PartialOrd for Extended {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.hi.partial_cmp(&other.hi)? {
            Ordering::Equal => self.lo.partial_cmp(&other.lo),
            ordering => Some(ordering),
        }
    }
}

impl fmt::Display for Extended {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:e}", self.to_f64())
    }
}
