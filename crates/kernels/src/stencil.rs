//! Fixed 3-point stencil: `y[i] = a*x[i-1] + b*x[i] + c*x[i+1]`.
//!
//! The stencil ignores stride and addressing mode and writes interior points
//! `1..n-1` only. Problems shorter than three elements are left untouched.

use crate::config::{AddressingMode, KernelKind, StencilCoefficients};
use crate::element::Element;
use crate::kernel::{Operands, VectorKernel};

/// Interior points written by the stencil for a problem of size `n`.
pub fn interior_len(n: usize) -> usize {
    n.saturating_sub(2)
}

#[inline(never)]
pub fn stencil3<T: Element>(x: &[T], y: &mut [T], a: T, b: T, c: T) {
    let n = y.len();
    if n < 3 {
        return;
    }
    let x = &x[..n];
    for (yi, w) in y[1..n - 1].iter_mut().zip(x.windows(3)) {
        *yi = a * w[0] + b * w[1] + c * w[2];
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Stencil3<T> {
    a: T,
    b: T,
    c: T,
    mode: AddressingMode,
}

impl<T: Element> Stencil3<T> {
    pub fn new(coefficients: StencilCoefficients, mode: AddressingMode) -> Self {
        Self {
            a: T::from_f64(coefficients.a),
            b: T::from_f64(coefficients.b),
            c: T::from_f64(coefficients.c),
            mode,
        }
    }
}

impl<T: Element> VectorKernel<T> for Stencil3<T> {
    fn name(&self) -> &'static str {
        "stencil3"
    }

    fn kind(&self) -> KernelKind {
        KernelKind::Stencil
    }

    /// Reported for row bookkeeping only; the access pattern never changes.
    fn mode(&self) -> AddressingMode {
        self.mode
    }

    fn run(&self, operands: &mut Operands<'_, T>) -> Option<T> {
        stencil3(operands.x, operands.y, self.a, self.b, self.c);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn boundaries_are_preserved() {
        let x = vec![1.0f64; 6];
        let mut y = vec![-7.0f64; 6];
        stencil3(&x, &mut y, 0.9, 1.1, 0.8);
        assert_eq!(y[0], -7.0);
        assert_eq!(y[5], -7.0);
        for value in &y[1..5] {
            assert_abs_diff_eq!(*value, 2.8, epsilon = 1e-12);
        }
    }

    #[test]
    fn short_problems_are_untouched() {
        let x = vec![1.0f32, 2.0];
        let mut y = vec![5.0f32, 6.0];
        stencil3(&x, &mut y, 1.0, 1.0, 1.0);
        assert_eq!(y, vec![5.0, 6.0]);
        assert_eq!(interior_len(2), 0);
        assert_eq!(interior_len(10), 8);
    }

    #[test]
    fn weights_follow_position() {
        let x = vec![1.0f64, 2.0, 4.0, 8.0];
        let mut y = vec![0.0f64; 4];
        stencil3(&x, &mut y, 1.0, 10.0, 100.0);
        assert_eq!(y, vec![0.0, 421.0, 842.0, 0.0]);
    }
}
