//! Kernel configuration structures.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coefficient used by the scaled-add kernel (`y = a*x + y`).
pub const SCALED_ADD_ALPHA: f64 = 1.111;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    F32,
    F64,
}

impl DataType {
    pub fn element_size_bytes(&self) -> usize {
        match self {
            DataType::F32 => 4,
            DataType::F64 => 8,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::F32 => "f32",
            DataType::F64 => "f64",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KernelKind {
    #[serde(rename = "saxpy")]
    ScaledAdd,
    #[serde(rename = "dot")]
    Dot,
    #[serde(rename = "mul")]
    Multiply,
    #[serde(rename = "stencil")]
    Stencil,
}

impl KernelKind {
    pub const ALL: [KernelKind; 4] = [
        KernelKind::ScaledAdd,
        KernelKind::Dot,
        KernelKind::Multiply,
        KernelKind::Stencil,
    ];

    /// Name used in result rows.
    pub fn as_str(&self) -> &'static str {
        match self {
            KernelKind::ScaledAdd => "saxpy",
            KernelKind::Dot => "dot",
            KernelKind::Multiply => "mul",
            KernelKind::Stencil => "stencil",
        }
    }

    pub fn flops_per_element(&self) -> f64 {
        match self {
            KernelKind::ScaledAdd | KernelKind::Dot => 2.0,
            KernelKind::Multiply => 1.0,
            KernelKind::Stencil => 5.0,
        }
    }

    /// Rough traffic model used for the GiB/s column.
    ///
    /// scaled-add reads `x[j]` and read-modify-writes `y[i]`; dot reads two
    /// streams; multiply reads two and writes one; stencil is approximated as
    /// one read stream plus one write stream.
    pub fn bytes_per_element(&self, dtype: DataType) -> f64 {
        let width = dtype.element_size_bytes() as f64;
        match self {
            KernelKind::ScaledAdd | KernelKind::Multiply => 3.0 * width,
            KernelKind::Dot | KernelKind::Stencil => 2.0 * width,
        }
    }

    /// Whether stride and addressing mode change what the kernel touches.
    pub fn honours_stride(&self) -> bool {
        !matches!(self, KernelKind::Stencil)
    }
}

impl fmt::Display for KernelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the stride parameter maps onto memory accesses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AddressingMode {
    /// Loop over all `n` outputs; a secondary read index advances by
    /// `stride` and wraps into `[0, n)`.
    #[default]
    Index,
    /// Loop index advances by `stride`; `ceil(n / stride)` elements are visited.
    Sample,
}

impl AddressingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressingMode::Index => "index",
            AddressingMode::Sample => "sample",
        }
    }
}

impl fmt::Display for AddressingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weights of the fixed 3-point stencil `y[i] = a*x[i-1] + b*x[i] + c*x[i+1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StencilCoefficients {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Default for StencilCoefficients {
    fn default() -> Self {
        Self {
            a: 0.9,
            b: 1.1,
            c: 0.8,
        }
    }
}
