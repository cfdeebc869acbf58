//! Run configuration.

use crate::fpenv::FloatEnvironment;
use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use vecbench_kernels::config::{AddressingMode, DataType, KernelKind};

pub const MIN_REPS: usize = 9;
pub const MIN_WARMUPS: usize = 2;
pub const DEFAULT_N: usize = 1 << 24;
pub const DEFAULT_SEED: u64 = 12345;

/// Everything one measurement run needs. Built once, normalised, then
/// passed by reference into every stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchConfig {
    pub kernel: KernelKind,
    pub dtype: DataType,
    pub n: usize,
    pub reps: usize,
    pub stride: usize,
    pub misalign: bool,
    pub warmups: usize,
    pub mode: AddressingMode,
    pub verify: bool,
    pub pin_core: Option<usize>,
    pub flush_denormals: bool,
    pub seed: u64,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            kernel: KernelKind::ScaledAdd,
            dtype: DataType::F32,
            n: DEFAULT_N,
            reps: MIN_REPS,
            stride: 1,
            misalign: false,
            warmups: MIN_WARMUPS,
            mode: AddressingMode::Index,
            verify: false,
            pin_core: None,
            flush_denormals: false,
            seed: DEFAULT_SEED,
        }
    }
}

impl BenchConfig {
    pub fn new(kernel: KernelKind, dtype: DataType, n: usize) -> Self {
        Self {
            kernel,
            dtype,
            n,
            ..Self::default()
        }
    }

    /// Apply the floors: at least 9 reps, at least 2 warmups, stride >= 1.
    pub fn normalized(mut self) -> Self {
        self.reps = self.reps.max(MIN_REPS);
        self.warmups = self.warmups.max(MIN_WARMUPS);
        self.stride = self.stride.max(1);
        self
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.reps >= MIN_REPS, "reps must be at least {MIN_REPS}, got {}", self.reps);
        ensure!(
            self.warmups >= MIN_WARMUPS,
            "warmups must be at least {MIN_WARMUPS}, got {}",
            self.warmups
        );
        ensure!(self.stride >= 1, "stride must be at least 1");
        let elements = self.n.checked_add(usize::from(self.misalign));
        ensure!(
            elements
                .and_then(|len| len.checked_mul(self.dtype.element_size_bytes()))
                .is_some_and(|bytes| bytes <= isize::MAX as usize),
            "n = {} {} elements does not fit in memory",
            self.n,
            self.dtype
        );
        Ok(())
    }

    pub fn float_environment(&self) -> FloatEnvironment {
        FloatEnvironment {
            flush_denormals: self.flush_denormals,
        }
    }
}
