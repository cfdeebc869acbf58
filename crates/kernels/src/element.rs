//! Element types and their precision contracts.
//!
//! Every kernel is generic over [`Element`]. The trait binds an element type
//! to the wider accumulator used by reductions, its machine epsilon and the
//! tolerance constants the verifier applies. Everything here is resolved at
//! compile time, so nothing branches on the element type inside a hot loop.

use crate::config::DataType;
use crate::wide::Extended;
use std::fmt::{Debug, Display};
use std::ops::{Add, Mul};

/// Accumulator arithmetic needed by the reduction kernels.
pub trait Accumulator: Copy + Add<Output = Self> + Mul<Output = Self> {
    const ZERO: Self;
}

impl Accumulator for f64 {
    const ZERO: Self = 0.0;
}

impl Accumulator for Extended {
    const ZERO: Self = Extended::ZERO;
}

/// Tolerance pair `|test - ref| <= atol + rtol * max(|test|, |ref|)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToleranceConstants {
    pub rtol: f64,
    pub atol: f64,
}

/// Constants of the magnitude-adaptive dot-product tolerance:
/// `atol = max(eps_scale * eps * sum|x*y| + bias, sqrt_scale * sqrt(m))`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReductionToleranceConstants {
    pub rtol: f64,
    pub eps_scale: f64,
    pub bias: f64,
    pub sqrt_scale: f64,
}

pub trait Element:
    Copy
    + Default
    + PartialOrd
    + Debug
    + Display
    + Send
    + Sync
    + Add<Output = Self>
    + Mul<Output = Self>
    + 'static
{
    /// Accumulator used inside reductions.
    type Wide: Accumulator;

    const DTYPE: DataType;
    const ZERO: Self;
    const EPSILON: f64;
    const ELEMENTWISE_TOLERANCE: ToleranceConstants;
    const REDUCTION_TOLERANCE: ReductionToleranceConstants;

    fn from_f64(value: f64) -> Self;
    fn to_f64(self) -> f64;
    fn widen(self) -> Self::Wide;
    fn narrow(wide: Self::Wide) -> Self;

    /// Lossless conversion into the oracle's precision.
    fn to_extended(self) -> Extended {
        Extended::from(self.to_f64())
    }
}

impl Element for f32 {
    type Wide = f64;

    const DTYPE: DataType = DataType::F32;
    const ZERO: Self = 0.0;
    const EPSILON: f64 = f32::EPSILON as f64;
    const ELEMENTWISE_TOLERANCE: ToleranceConstants = ToleranceConstants {
        rtol: 1e-6,
        atol: 1e-7,
    };
    const REDUCTION_TOLERANCE: ReductionToleranceConstants = ReductionToleranceConstants {
        rtol: 1e-6,
        eps_scale: 128.0,
        bias: 1e-12,
        sqrt_scale: 8.0,
    };

    #[inline(always)]
    fn from_f64(value: f64) -> Self {
        value as f32
    }

    #[inline(always)]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline(always)]
    fn widen(self) -> f64 {
        self as f64
    }

    #[inline(always)]
    fn narrow(wide: f64) -> Self {
        wide as f32
    }
}

impl Element for f64 {
    type Wide = Extended;

    const DTYPE: DataType = DataType::F64;
    const ZERO: Self = 0.0;
    const EPSILON: f64 = f64::EPSILON;
    const ELEMENTWISE_TOLERANCE: ToleranceConstants = ToleranceConstants {
        rtol: 1e-12,
        atol: 1e-13,
    };
    const REDUCTION_TOLERANCE: ReductionToleranceConstants = ReductionToleranceConstants {
        rtol: 1e-12,
        eps_scale: 8.0,
        bias: 1e-18,
        sqrt_scale: 1e-6,
    };

    #[inline(always)]
    fn from_f64(value: f64) -> Self {
        value
    }

    #[inline(always)]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline(always)]
    fn widen(self) -> Extended {
        Extended::from(self)
    }

    #[inline(always)]
    fn narrow(wide: Extended) -> Self {
        wide.to_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widened_product<T: Element>(a: T, b: T) -> T::Wide {
        a.widen() * b.widen()
    }

    #[test]
    fn single_precision_products_are_exact_in_double() {
        let a = 1.0f32 + f32::EPSILON;
        let p = widened_product(a, a);
        assert_eq!(p, (a as f64) * (a as f64));
        assert_ne!(f32::narrow(p) as f64, p);
    }

    #[test]
    fn double_precision_widens_to_extended() {
        let a = 1.0f64 + f64::EPSILON;
        let p = widened_product(a, a);
        assert_eq!(p, Extended::product(a, a));
        assert_eq!(<f64 as Element>::DTYPE, DataType::F64);
    }

    #[test]
    fn single_precision_tolerances_are_looser() {
        assert!(f32::ELEMENTWISE_TOLERANCE.rtol > f64::ELEMENTWISE_TOLERANCE.rtol);
        assert!(f32::REDUCTION_TOLERANCE.sqrt_scale > f64::REDUCTION_TOLERANCE.sqrt_scale);
    }
}
