//! Scaled-add kernels: `y = a*x + y`.

use crate::addressing::{index_step, next_index};
use crate::config::{AddressingMode, KernelKind};
use crate::element::Element;
use crate::kernel::{Operands, VectorKernel};

/// `y[i] = a * x[j] + y[i]` for every `i`, with `j` striding and wrapping.
#[inline(never)]
pub fn scaled_add_index<T: Element>(a: T, x: &[T], y: &mut [T], stride: usize) {
    let n = y.len();
    if n == 0 {
        return;
    }
    let x = &x[..n];
    let step = index_step(stride, n);
    let mut j = 0;
    for yi in y.iter_mut() {
        *yi = a * x[j] + *yi;
        j = next_index(j, step, n);
    }
}

/// `y[i] = a * x[i] + y[i]` for `i = 0, stride, 2*stride, ...`.
#[inline(never)]
pub fn scaled_add_sample<T: Element>(a: T, x: &[T], y: &mut [T], stride: usize) {
    let n = y.len();
    let x = &x[..n];
    for i in (0..n).step_by(stride.max(1)) {
        y[i] = a * x[i] + y[i];
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ScaledAdd<T> {
    alpha: T,
    mode: AddressingMode,
}

impl<T: Element> ScaledAdd<T> {
    pub fn new(alpha: T, mode: AddressingMode) -> Self {
        Self { alpha, mode }
    }
}

impl<T: Element> VectorKernel<T> for ScaledAdd<T> {
    fn name(&self) -> &'static str {
        match self.mode {
            AddressingMode::Index => "saxpy-index",
            AddressingMode::Sample => "saxpy-sample",
        }
    }

    fn kind(&self) -> KernelKind {
        KernelKind::ScaledAdd
    }

    fn mode(&self) -> AddressingMode {
        self.mode
    }

    fn run(&self, operands: &mut Operands<'_, T>) -> Option<T> {
        match self.mode {
            AddressingMode::Index => {
                scaled_add_index(self.alpha, operands.x, operands.y, operands.stride)
            }
            AddressingMode::Sample => {
                scaled_add_sample(self.alpha, operands.x, operands.y, operands.stride)
            }
        }
        None
    }
}
