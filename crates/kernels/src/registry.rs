//! Kernel registry for lookup and discovery.

use crate::config::{AddressingMode, KernelKind, StencilCoefficients, SCALED_ADD_ALPHA};
use crate::dot::DotProduct;
use crate::element::Element;
use crate::kernel::{DynVectorKernel, VectorKernel};
use crate::multiply::Multiply;
use crate::saxpy::ScaledAdd;
use crate::stencil::Stencil3;
use anyhow::{anyhow, Result};
use std::sync::Arc;

/// Per-element-type dispatch table.
///
/// Lookups happen once per run, before any buffer is touched; the resolved
/// kernel is then called directly from the timed loop.
pub struct KernelRegistry<T: Element> {
    kernels: Vec<DynVectorKernel<T>>,
}

impl<T: Element> Clone for KernelRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            kernels: self.kernels.clone(),
        }
    }
}

impl<T: Element> Default for KernelRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Element> KernelRegistry<T> {
    pub fn new() -> Self {
        Self {
            kernels: Vec::new(),
        }
    }

    pub fn with_default_kernels() -> Self {
        let alpha = T::from_f64(SCALED_ADD_ALPHA);
        let coefficients = StencilCoefficients::default();
        let mut registry = Self::new();
        for mode in [AddressingMode::Index, AddressingMode::Sample] {
            registry.register(ScaledAdd::new(alpha, mode));
            registry.register(DotProduct::new(mode));
            registry.register(Multiply::new(mode));
            registry.register(Stencil3::<T>::new(coefficients, mode));
        }
        registry
    }

    pub fn register<K>(&mut self, kernel: K)
    where
        K: VectorKernel<T> + 'static,
    {
        self.kernels.push(Arc::new(kernel));
    }

    pub fn find(&self, kind: KernelKind, mode: AddressingMode) -> Option<DynVectorKernel<T>> {
        self.kernels
            .iter()
            .find(|kernel| kernel.kind() == kind && kernel.mode() == mode)
            .map(Arc::clone)
    }

    pub fn find_by_name(&self, name: &str) -> Option<DynVectorKernel<T>> {
        self.kernels
            .iter()
            .find(|kernel| kernel.name() == name)
            .map(Arc::clone)
    }

    pub fn resolve(&self, kind: KernelKind, mode: AddressingMode) -> Result<DynVectorKernel<T>> {
        self.find(kind, mode).ok_or_else(|| {
            anyhow!(
                "no {} kernel registered for {} addressing ({})",
                kind,
                mode,
                T::DTYPE
            )
        })
    }
}
