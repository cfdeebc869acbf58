//! vecbench: SIMD advantage and numerical fidelity harness for basic vector
//! kernels.
//!
//! Re-exports the workspace libraries under one roof:
//!
//! - [`kernels`]: element types, addressing, kernels and their registry
//! - [`verify`]: reference oracle, tolerance model and verifier
//! - [`harness`]: buffers, timing, metrics, result rows and the runner

pub use vecbench_harness as harness;
pub use vecbench_kernels as kernels;
pub use vecbench_verify as verify;

pub use vecbench_harness::{BenchConfig, BenchRunner, OutputFormat, ResultRow, RunReport};
pub use vecbench_kernels::config::{AddressingMode, DataType, KernelKind};
