//! Measurement harness for the vecbench kernels.
//!
//! A run allocates 64-byte aligned buffers, snapshots their seeded initial
//! state, warms up on a disposable copy, then times `reps` repetitions with a
//! restore from the snapshot before each one. Latencies are reduced to robust
//! percentiles and turned into GFLOP/s, GiB/s and cycles per element.

pub mod affinity;
pub mod buffers;
pub mod clock;
pub mod config;
pub mod fpenv;
pub mod metrics;
pub mod report;
pub mod runner;
pub mod timing;

#[cfg(feature = "cli")]
pub mod cli;

pub use buffers::{AlignedBuffer, BufferError, BufferSet, BUFFER_ALIGN};
pub use clock::{estimate_cpu_hz, read_cycles, FrequencyProbe};
pub use config::BenchConfig;
pub use fpenv::FloatEnvironment;
pub use metrics::{work_elements, DerivedMetrics};
pub use report::{OutputFormat, ResultRow, RunReport, VerificationStatus, CSV_HEADER};
pub use runner::{run_with_registry, BenchRunner};
pub use timing::{percentile, LatencySummary, TrialRunner};
