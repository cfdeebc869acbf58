//! Kernel trait and operand bundle.

use crate::config::{AddressingMode, KernelKind};
use crate::element::Element;
use anyhow::{ensure, Result};
use std::sync::Arc;

/// Borrowed working buffers for one kernel call.
///
/// `y` and `z` hold exactly `n` elements; `x` holds at least `n` (a
/// misaligned view may sit inside a larger allocation).
pub struct Operands<'a, T> {
    pub x: &'a [T],
    pub y: &'a mut [T],
    pub z: &'a mut [T],
    pub stride: usize,
}

impl<'a, T: Element> Operands<'a, T> {
    pub fn new(x: &'a [T], y: &'a mut [T], z: &'a mut [T], stride: usize) -> Self {
        Self { x, y, z, stride }
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        let n = self.y.len();
        ensure!(
            self.x.len() >= n,
            "x holds {} elements but the problem size is {}",
            self.x.len(),
            n
        );
        ensure!(
            self.z.len() == n,
            "z holds {} elements but the problem size is {}",
            self.z.len(),
            n
        );
        Ok(())
    }
}

/// A kernel bound to one element type and one addressing mode.
///
/// Implementations are resolved once per run by the registry; `run` is the
/// only thing called inside the timed region. Reductions return their scalar,
/// element-wise kernels return `None` and leave their result in `y` or `z`.
pub trait VectorKernel<T: Element>: Send + Sync {
    fn name(&self) -> &'static str;
    fn kind(&self) -> KernelKind;
    fn mode(&self) -> AddressingMode;
    fn run(&self, operands: &mut Operands<'_, T>) -> Option<T>;
}

pub type DynVectorKernel<T> = Arc<dyn VectorKernel<T>>;
