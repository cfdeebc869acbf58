//! Elementwise multiply kernels: `z = x * y`.

use crate::addressing::{index_step, next_index};
use crate::config::{AddressingMode, KernelKind};
use crate::element::Element;
use crate::kernel::{Operands, VectorKernel};

/// `z[i] = x[j] * y[i]` for every `i`, with `j` striding and wrapping.
#[inline(never)]
pub fn multiply_index<T: Element>(x: &[T], y: &[T], z: &mut [T], stride: usize) {
    let n = z.len();
    if n == 0 {
        return;
    }
    let x = &x[..n];
    let y = &y[..n];
    let step = index_step(stride, n);
    let mut j = 0;
    for (zi, &yi) in z.iter_mut().zip(y) {
        *zi = x[j] * yi;
        j = next_index(j, step, n);
    }
}

/// `z[i] = x[i] * y[i]` for `i = 0, stride, 2*stride, ...`.
#[inline(never)]
pub fn multiply_sample<T: Element>(x: &[T], y: &[T], z: &mut [T], stride: usize) {
    let n = z.len();
    let x = &x[..n];
    let y = &y[..n];
    for i in (0..n).step_by(stride.max(1)) {
        z[i] = x[i] * y[i];
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Multiply {
    mode: AddressingMode,
}

impl Multiply {
    pub fn new(mode: AddressingMode) -> Self {
        Self { mode }
    }
}

impl<T: Element> VectorKernel<T> for Multiply {
    fn name(&self) -> &'static str {
        match self.mode {
            AddressingMode::Index => "mul-index",
            AddressingMode::Sample => "mul-sample",
        }
    }

    fn kind(&self) -> KernelKind {
        KernelKind::Multiply
    }

    fn mode(&self) -> AddressingMode {
        self.mode
    }

    fn run(&self, operands: &mut Operands<'_, T>) -> Option<T> {
        match self.mode {
            AddressingMode::Index => {
                multiply_index(operands.x, operands.y, operands.z, operands.stride)
            }
            AddressingMode::Sample => {
                multiply_sample(operands.x, operands.y, operands.z, operands.stride)
            }
        }
        None
    }
}
