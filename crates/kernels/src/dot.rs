//! Dot-product kernels with a fixed accumulation order.
//!
//! Four partial sums in the element type's wide accumulator are updated in
//! lock-step and combined as `(s0 + s1) + (s2 + s3)`. The order depends only
//! on `n` and the stride, never on the run.

use crate::addressing::{index_step, next_index};
use crate::config::{AddressingMode, KernelKind};
use crate::element::{Accumulator, Element};
use crate::kernel::{Operands, VectorKernel};

/// `sum(x[j] * y[i])` over all `i`, with `j` striding and wrapping.
#[inline(never)]
pub fn dot_index<T: Element>(x: &[T], y: &[T], stride: usize) -> T {
    let n = y.len();
    if n == 0 {
        return T::ZERO;
    }
    let x = &x[..n];
    let step = index_step(stride, n);
    let zero = <T::Wide as Accumulator>::ZERO;
    let (mut s0, mut s1, mut s2, mut s3) = (zero, zero, zero, zero);
    let mut j = 0;

    let mut quads = y.chunks_exact(4);
    for quad in &mut quads {
        s0 = s0 + x[j].widen() * quad[0].widen();
        j = next_index(j, step, n);
        s1 = s1 + x[j].widen() * quad[1].widen();
        j = next_index(j, step, n);
        s2 = s2 + x[j].widen() * quad[2].widen();
        j = next_index(j, step, n);
        s3 = s3 + x[j].widen() * quad[3].widen();
        j = next_index(j, step, n);
    }
    for &yi in quads.remainder() {
        s0 = s0 + x[j].widen() * yi.widen();
        j = next_index(j, step, n);
    }

    T::narrow((s0 + s1) + (s2 + s3))
}

/// `sum(x[i] * y[i])` for `i = 0, stride, 2*stride, ...`.
#[inline(never)]
pub fn dot_sample<T: Element>(x: &[T], y: &[T], stride: usize) -> T {
    let n = y.len();
    let x = &x[..n];
    let stride = stride.max(1);
    let span = stride.saturating_mul(4);
    let zero = <T::Wide as Accumulator>::ZERO;
    let (mut s0, mut s1, mut s2, mut s3) = (zero, zero, zero, zero);

    let mut i = 0;
    while span <= n - i {
        s0 = s0 + x[i].widen() * y[i].widen();
        s1 = s1 + x[i + stride].widen() * y[i + stride].widen();
        s2 = s2 + x[i + 2 * stride].widen() * y[i + 2 * stride].widen();
        s3 = s3 + x[i + 3 * stride].widen() * y[i + 3 * stride].widen();
        i += span;
    }
    while i < n {
        s0 = s0 + x[i].widen() * y[i].widen();
        i += stride;
    }

    T::narrow((s0 + s1) + (s2 + s3))
}

#[derive(Debug, Clone, Copy)]
pub struct DotProduct {
    mode: AddressingMode,
}

impl DotProduct {
    pub fn new(mode: AddressingMode) -> Self {
        Self { mode }
    }
}

impl<T: Element> VectorKernel<T> for DotProduct {
    fn name(&self) -> &'static str {
        match self.mode {
            AddressingMode::Index => "dot-index",
            AddressingMode::Sample => "dot-sample",
        }
    }

    fn kind(&self) -> KernelKind {
        KernelKind::Dot
    }

    fn mode(&self) -> AddressingMode {
        self.mode
    }

    fn run(&self, operands: &mut Operands<'_, T>) -> Option<T> {
        let value = match self.mode {
            AddressingMode::Index => dot_index(operands.x, operands.y, operands.stride),
            AddressingMode::Sample => dot_sample(operands.x, operands.y, operands.stride),
        };
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn empty_dot_is_zero() {
        assert_eq!(dot_index::<f32>(&[], &[], 1), 0.0);
        assert_eq!(dot_sample::<f64>(&[], &[], 3), 0.0);
    }

    #[test]
    fn tail_elements_are_included() {
        let x: Vec<f64> = (1..=7).map(|v| v as f64).collect();
        let y = vec![1.0f64; 7];
        assert_eq!(dot_index(&x, &y, 1), 28.0);
        assert_eq!(dot_sample(&x, &y, 1), 28.0);
        // samples 1, 3, 5, 7
        assert_eq!(dot_sample(&x, &y, 2), 16.0);
        // samples 1, 4, 7
        assert_eq!(dot_sample(&x, &y, 3), 12.0);
    }

    #[test]
    fn index_mode_pairs_wrapped_reads_with_sequential_writes() {
        let x = vec![1.0f32, 2.0, 3.0, 4.0, 5.0];
        let y = vec![1.0f32, 10.0, 100.0, 1000.0, 10000.0];
        // stride 2 reads x[0], x[2], x[4], x[1], x[3]
        let expected = 1.0 + 30.0 + 500.0 + 2000.0 + 40000.0;
        assert_eq!(dot_index(&x, &y, 2), expected);
    }

    #[test]
    fn single_precision_accumulates_wide() {
        // 1 + 2^-24 repeated is lost entirely by an f32 accumulator.
        let n = 1 << 12;
        let mut x = vec![f32::EPSILON / 2.0; n];
        x[0] = 1.0;
        let y = vec![1.0f32; n];
        let exact = 1.0 + (n - 1) as f64 * (f32::EPSILON as f64 / 2.0);
        assert_abs_diff_eq!(dot_index(&x, &y, 1) as f64, exact, epsilon = 1e-6);
    }

    #[test]
    fn double_precision_survives_cancellation() {
        let x = vec![1e16f64, 1.0, -1e16, 1.0, 1.0];
        let y = vec![1.0f64; 5];
        assert_eq!(dot_index(&x, &y, 1), 3.0);
    }
}
