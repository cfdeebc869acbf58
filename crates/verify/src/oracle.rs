//! Reference results the verifier compares against.
//!
//! The dot-product oracle runs compensated summation in [`Extended`]
//! precision and also returns `sum(|x*y|)`, which scales the reduction
//! tolerance. Element-wise references evaluate the same expression as the
//! kernels in the element type, walking the access pattern through the
//! addressing iterators instead of the kernels' inlined index arithmetic.
//! Nothing in this module is timed.

use vecbench_kernels::addressing::AccessPattern;
use vecbench_kernels::config::{AddressingMode, StencilCoefficients};
use vecbench_kernels::element::Element;
use vecbench_kernels::wide::Extended;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DotReference {
    /// Compensated sum of products.
    pub sum: Extended,
    /// Sum of absolute products.
    pub abs_sum: Extended,
    /// Number of products accumulated.
    pub visited: usize,
}

/// Compensated dot product in the addressing mode of the kernel under test.
pub fn reference_dot<T: Element>(
    x: &[T],
    y: &[T],
    mode: AddressingMode,
    stride: usize,
) -> DotReference {
    let n = y.len();
    let mut sum = Extended::ZERO;
    let mut compensation = Extended::ZERO;
    let mut abs_sum = Extended::ZERO;
    let mut visited = 0;

    for access in AccessPattern::new(mode, n, stride) {
        let product = x[access.read].to_extended() * y[access.write].to_extended();
        let corrected = product - compensation;
        let next = sum + corrected;
        compensation = (next - sum) - corrected;
        sum = next;
        abs_sum += product.abs();
        visited += 1;
    }

    DotReference {
        sum,
        abs_sum,
        visited,
    }
}

/// `out[i] = alpha * x[j] + out[i]`; `out` must start as a copy of the initial `y`.
pub fn reference_scaled_add<T: Element>(
    alpha: T,
    x: &[T],
    out: &mut [T],
    mode: AddressingMode,
    stride: usize,
) {
    let n = out.len();
    for access in AccessPattern::new(mode, n, stride) {
        out[access.write] = alpha * x[access.read] + out[access.write];
    }
}

/// `out[i] = x[j] * y[i]`; `out` must start as a copy of the initial `z`.
pub fn reference_multiply<T: Element>(
    x: &[T],
    y: &[T],
    out: &mut [T],
    mode: AddressingMode,
    stride: usize,
) {
    let n = out.len();
    for access in AccessPattern::new(mode, n, stride) {
        out[access.write] = x[access.read] * y[access.write];
    }
}

/// Interior stencil points; `out` must start as a copy of the initial `y`.
pub fn reference_stencil<T: Element>(x: &[T], out: &mut [T], coefficients: StencilCoefficients) {
    let n = out.len();
    let a = T::from_f64(coefficients.a);
    let b = T::from_f64(coefficients.b);
    let c = T::from_f64(coefficients.c);
    for i in 1..n.saturating_sub(1) {
        out[i] = a * x[i - 1] + b * x[i] + c * x[i + 1];
    }
}
