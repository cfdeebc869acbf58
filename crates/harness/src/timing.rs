//! Trial timing and latency statistics.

use crate::buffers::{BufferError, BufferSet};
use serde::{Deserialize, Serialize};
use std::hint::black_box;
use std::time::Instant;
use tracing::{debug, warn};
use vecbench_kernels::element::Element;
use vecbench_kernels::kernel::VectorKernel;

/// Robust percentile of positive finite samples.
///
/// Non-positive and non-finite samples are dropped first; nothing left
/// yields NaN. With fewer than 3 samples the upper median is returned for
/// every `q`, fewer than 20 use the nearest rank, and larger sets
/// interpolate linearly between neighbouring ranks.
pub fn percentile(samples: &[f64], q: f64) -> f64 {
    let mut kept: Vec<f64> = samples
        .iter()
        .copied()
        .filter(|v| *v > 0.0 && v.is_finite())
        .collect();
    if kept.is_empty() {
        return f64::NAN;
    }
    kept.sort_by(f64::total_cmp);

    let n = kept.len();
    if n < 3 {
        return kept[n / 2];
    }

    let q = q.clamp(0.0, 1.0);
    let position = q * (n - 1) as f64;
    if n < 20 {
        let index = (position.round() as usize).min(n - 1);
        return kept[index];
    }

    let lower = position.floor() as usize;
    let fraction = position - lower as f64;
    if lower + 1 < n {
        kept[lower] * (1.0 - fraction) + kept[lower + 1] * fraction
    } else {
        kept[lower]
    }
}

/// Median and tails of one run, in nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatencySummary {
    pub median_ns: f64,
    pub p05_ns: f64,
    pub p95_ns: f64,
}

impl LatencySummary {
    pub fn from_samples(samples: &[f64]) -> Self {
        Self {
            median_ns: percentile(samples, 0.50),
            p05_ns: percentile(samples, 0.05),
            p95_ns: percentile(samples, 0.95),
        }
    }
}

/// Drives warmups and timed repetitions of one kernel.
pub struct TrialRunner<'k, T: Element> {
    kernel: &'k dyn VectorKernel<T>,
    stride: usize,
    warmups: usize,
    reps: usize,
}

impl<'k, T: Element> TrialRunner<'k, T> {
    pub fn new(kernel: &'k dyn VectorKernel<T>, stride: usize) -> Self {
        Self {
            kernel,
            stride,
            warmups: 2,
            reps: 9,
        }
    }

    pub fn with_runs(mut self, warmups: usize, reps: usize) -> Self {
        self.warmups = warmups;
        self.reps = reps;
        self
    }

    /// Run the warmups against a disposable copy of `snapshot`.
    ///
    /// Failing to allocate that copy skips warmup rather than the run.
    pub fn warm_up(&self, snapshot: &BufferSet<T>) {
        if self.warmups == 0 {
            return;
        }
        let mut scratch = match snapshot.scratch() {
            Ok(scratch) => scratch,
            Err(err) => {
                warn!(error = %err, "skipping warmup, scratch buffers unavailable");
                return;
            }
        };
        for _ in 0..self.warmups {
            black_box(self.kernel.run(&mut scratch.operands(self.stride)));
        }
        debug!(kernel = self.kernel.name(), warmups = self.warmups, "warmup complete");
    }

    /// One sample per repetition. `working` is restored from `snapshot`
    /// before each repetition and only the kernel call sits inside the
    /// timed region.
    pub fn measure(
        &self,
        working: &mut BufferSet<T>,
        snapshot: &BufferSet<T>,
    ) -> Result<Vec<f64>, BufferError> {
        let mut samples = Vec::with_capacity(self.reps);
        for _ in 0..self.reps {
            working.restore_from(snapshot)?;
            let mut operands = working.operands(self.stride);

            let start = Instant::now();
            let result = self.kernel.run(&mut operands);
            let elapsed = start.elapsed();

            black_box(result);
            samples.push(elapsed.as_secs_f64() * 1e9);
        }
        Ok(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use vecbench_kernels::config::{AddressingMode, KernelKind, SCALED_ADD_ALPHA};
    use vecbench_kernels::registry::KernelRegistry;
    use vecbench_verify::compare_elementwise;
    use vecbench_verify::oracle::reference_scaled_add;

    #[test]
    fn small_sets_use_nearest_rank() {
        let samples = [5.0, 1.0, 4.0, 2.0, 3.0];
        assert_eq!(percentile(&samples, 0.5), 3.0);
        assert_eq!(percentile(&samples, 0.05), 1.0);
        assert_eq!(percentile(&samples, 0.95), 5.0);
    }

    #[test]
    fn tiny_sets_return_upper_median() {
        assert_eq!(percentile(&[7.0], 0.05), 7.0);
        assert_eq!(percentile(&[2.0, 8.0], 0.05), 8.0);
        assert_eq!(percentile(&[2.0, 8.0], 0.95), 8.0);
    }

    #[test]
    fn invalid_samples_are_dropped() {
        assert!(percentile(&[0.0, -1.0, f64::NAN], 0.5).is_nan());
        assert!(percentile(&[], 0.5).is_nan());
        let samples = [0.0, f64::INFINITY, 10.0, 20.0, 30.0, -4.0];
        assert_eq!(percentile(&samples, 0.5), 20.0);
    }

    #[test]
    fn large_sets_interpolate() {
        let samples: Vec<f64> = (1..=21).map(f64::from).collect();
        assert_relative_eq!(percentile(&samples, 0.5), 11.0, max_relative = 1e-12);
        assert_relative_eq!(percentile(&samples, 0.05), 2.0, max_relative = 1e-12);
        assert_relative_eq!(percentile(&samples, 0.95), 20.0, max_relative = 1e-12);
        assert_relative_eq!(percentile(&samples, 0.525), 11.5, max_relative = 1e-12);
    }

    #[test]
    fn percentiles_are_ordered() {
        let samples: Vec<f64> = (0..50).map(|i| 100.0 + ((i * 31) % 17) as f64).collect();
        let summary = LatencySummary::from_samples(&samples);
        assert!(summary.p05_ns <= summary.median_ns);
        assert!(summary.median_ns <= summary.p95_ns);
    }

    #[test]
    fn measure_collects_one_positive_sample_per_rep() {
        let registry = KernelRegistry::<f32>::with_default_kernels();
        let kernel = registry
            .resolve(KernelKind::ScaledAdd, AddressingMode::Index)
            .expect("kernel");
        let mut working = BufferSet::<f32>::allocate(4096, false).expect("allocate");
        working.initialize(1);
        let snapshot = working.snapshot().expect("snapshot");

        let runner = TrialRunner::new(kernel.as_ref(), 1).with_runs(2, 11);
        runner.warm_up(&snapshot);
        assert_eq!(working.y(), snapshot.y());

        let samples = runner.measure(&mut working, &snapshot).expect("measure");
        assert_eq!(samples.len(), 11);
        assert!(samples.iter().all(|s| s.is_finite() && *s >= 0.0));
        assert_ne!(working.y(), snapshot.y());
    }

    #[test]
    fn every_rep_starts_from_the_snapshot() {
        let registry = KernelRegistry::<f64>::with_default_kernels();
        let kernel = registry
            .resolve(KernelKind::ScaledAdd, AddressingMode::Index)
            .expect("kernel");
        let mut working = BufferSet::<f64>::allocate(4096, true).expect("allocate");
        working.initialize(12345);
        let snapshot = working.snapshot().expect("snapshot");

        let runner = TrialRunner::new(kernel.as_ref(), 1).with_runs(2, 9);
        runner.warm_up(&snapshot);
        runner.measure(&mut working, &snapshot).expect("measure");

        let mut expected = snapshot.y().to_vec();
        reference_scaled_add(
            SCALED_ADD_ALPHA,
            snapshot.x_view(),
            &mut expected,
            AddressingMode::Index,
            1,
        );
        let outcome = compare_elementwise(working.y(), &expected);
        assert!(outcome.passed, "nine reps must equal one application: {outcome:?}");
        assert_eq!(working.x_view(), snapshot.x_view());
        assert_eq!(working.z(), snapshot.z());
    }
}
