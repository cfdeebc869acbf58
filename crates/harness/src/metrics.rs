//! Throughput, bandwidth, and cycles per element from the median latency.

use crate::config::BenchConfig;
use serde::{Deserialize, Serialize};
use vecbench_kernels::addressing::visited_elements;
use vecbench_kernels::config::KernelKind;
use vecbench_kernels::stencil::interior_len;

const BYTES_PER_GIB: f64 = (1u64 << 30) as f64;

/// Elements a run actually processes: interior points for the stencil,
/// visited positions otherwise.
pub fn work_elements(config: &BenchConfig) -> usize {
    match config.kernel {
        KernelKind::Stencil => interior_len(config.n),
        _ => visited_elements(config.mode, config.n, config.stride),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub work_elements: usize,
    pub gflops: f64,
    pub gib_per_s: f64,
    /// NaN when no cycle-counter frequency is available.
    pub cycles_per_element: f64,
}

impl DerivedMetrics {
    /// Metrics are NaN whenever the median is not a positive finite time or
    /// the run processes no elements.
    pub fn derive(config: &BenchConfig, median_ns: f64, cpu_hz: Option<f64>) -> Self {
        let elements = work_elements(config);
        let seconds = median_ns * 1e-9;
        let usable = elements > 0 && seconds > 0.0 && seconds.is_finite();

        let count = elements as f64;
        let flops = config.kernel.flops_per_element() * count;
        let bytes = config.kernel.bytes_per_element(config.dtype) * count;

        let (gflops, gib_per_s) = if usable {
            (flops / seconds / 1e9, bytes / seconds / BYTES_PER_GIB)
        } else {
            (f64::NAN, f64::NAN)
        };

        let cycles_per_element = match cpu_hz {
            Some(hz) if usable && hz > 0.0 => seconds * hz / count,
            _ => f64::NAN,
        };

        Self {
            work_elements: elements,
            gflops,
            gib_per_s,
            cycles_per_element,
        }
    }
}
