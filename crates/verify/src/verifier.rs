//! Verification of kernel output against the reference oracle.

use crate::oracle::{
    reference_dot, reference_multiply, reference_scaled_add, reference_stencil,
};
use crate::tolerance::Tolerance;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use vecbench_kernels::config::{AddressingMode, KernelKind, StencilCoefficients, SCALED_ADD_ALPHA};
use vecbench_kernels::element::Element;
use vecbench_kernels::kernel::{Operands, VectorKernel};

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("failed to allocate {bytes} bytes for verification scratch buffer `{buffer}`")]
    ScratchAllocation { buffer: &'static str, bytes: usize },
    #[error("invalid verification operands: {0}")]
    Operands(String),
}

/// Pass/fail plus the largest error ratio (`|test - ref| / bound`).
///
/// For element-wise kernels the ratio is taken over mismatching elements
/// only, so a passing run reports 0. For the dot product it is the ratio of
/// the single scalar result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub passed: bool,
    pub max_relative_error: f64,
    pub checked: usize,
    pub mismatches: usize,
}

/// Read-only view of the initial state a kernel is verified from.
#[derive(Debug, Clone, Copy)]
pub struct InitialState<'a, T> {
    pub x: &'a [T],
    pub y: &'a [T],
    pub z: &'a [T],
}

#[derive(Debug, Clone, Copy)]
pub struct Verifier {
    kind: KernelKind,
    mode: AddressingMode,
    stride: usize,
    alpha: f64,
    coefficients: StencilCoefficients,
}

impl Verifier {
    pub fn new(kind: KernelKind, mode: AddressingMode, stride: usize) -> Self {
        Self {
            kind,
            mode,
            stride,
            alpha: SCALED_ADD_ALPHA,
            coefficients: StencilCoefficients::default(),
        }
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Re-run `kernel` on scratch copies of `initial` and compare with the oracle.
    ///
    /// `initial` is never written. Mismatches are reported in the outcome;
    /// only scratch allocation failure or malformed operands are errors.
    pub fn verify<T: Element>(
        &self,
        kernel: &dyn VectorKernel<T>,
        initial: InitialState<'_, T>,
    ) -> Result<VerificationOutcome, VerifyError> {
        let mut y_check = scratch_copy(initial.y, "y_check")?;
        let mut z_check = scratch_copy(initial.z, "z_check")?;

        let mut operands = Operands::new(initial.x, &mut y_check, &mut z_check, self.stride);
        operands
            .validate()
            .map_err(|err| VerifyError::Operands(err.to_string()))?;
        let scalar = kernel.run(&mut operands);

        let outcome = match self.kind {
            KernelKind::Dot => {
                let value = scalar.unwrap_or(T::ZERO);
                self.check_dot(value, initial)
            }
            KernelKind::ScaledAdd => {
                let mut expected = scratch_copy(initial.y, "y_ref")?;
                reference_scaled_add(
                    T::from_f64(self.alpha),
                    initial.x,
                    &mut expected,
                    self.mode,
                    self.stride,
                );
                compare_elementwise(&y_check, &expected)
            }
            KernelKind::Multiply => {
                let mut expected = scratch_copy(initial.z, "z_ref")?;
                reference_multiply(initial.x, initial.y, &mut expected, self.mode, self.stride);
                compare_elementwise(&z_check, &expected)
            }
            KernelKind::Stencil => {
                let mut expected = scratch_copy(initial.y, "y_ref")?;
                reference_stencil(initial.x, &mut expected, self.coefficients);
                compare_elementwise(&y_check, &expected)
            }
        };

        if outcome.passed {
            debug!(
                kernel = kernel.name(),
                checked = outcome.checked,
                max_relative_error = outcome.max_relative_error,
                "verification passed"
            );
        } else {
            warn!(
                kernel = kernel.name(),
                dtype = %T::DTYPE,
                mismatches = outcome.mismatches,
                max_relative_error = outcome.max_relative_error,
                "verification failed"
            );
        }

        Ok(outcome)
    }

    fn check_dot<T: Element>(&self, value: T, initial: InitialState<'_, T>) -> VerificationOutcome {
        let reference = reference_dot(initial.x, initial.y, self.mode, self.stride);
        let tolerance = Tolerance::reduction::<T>(reference.abs_sum.to_f64(), reference.visited);
        let (passed, ratio) = tolerance.compare_extended(value.to_extended(), reference.sum);
        VerificationOutcome {
            passed,
            max_relative_error: ratio,
            checked: 1,
            mismatches: usize::from(!passed),
        }
    }
}

/// Element-wise comparison with the fixed per-dtype tolerance.
pub fn compare_elementwise<T: Element>(actual: &[T], expected: &[T]) -> VerificationOutcome {
    let tolerance = Tolerance::elementwise::<T>();
    let mut mismatches = 0;
    let mut max_relative_error = 0.0f64;

    for (&test, &reference) in actual.iter().zip(expected) {
        let (test, reference) = (test.to_f64(), reference.to_f64());
        if !tolerance.admits(test, reference) {
            mismatches += 1;
            let ratio = tolerance.error_ratio(test, reference);
            if ratio > max_relative_error || ratio.is_nan() {
                max_relative_error = ratio;
            }
        }
    }

    let size_matches = actual.len() == expected.len();
    VerificationOutcome {
        passed: mismatches == 0 && size_matches,
        max_relative_error,
        checked: actual.len().min(expected.len()),
        mismatches,
    }
}

fn scratch_copy<T: Element>(source: &[T], buffer: &'static str) -> Result<Vec<T>, VerifyError> {
    let mut copy = Vec::new();
    copy.try_reserve_exact(source.len())
        .map_err(|_| VerifyError::ScratchAllocation {
            buffer,
            bytes: std::mem::size_of_val(source),
        })?;
    copy.extend_from_slice(source);
    Ok(copy)
}
