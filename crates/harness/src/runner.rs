//! One measurement run, from allocation to result row.

use crate::buffers::BufferSet;
use crate::clock::FrequencyProbe;
use crate::config::BenchConfig;
use crate::metrics::DerivedMetrics;
use crate::report::{ResultRow, RunReport};
use crate::timing::{LatencySummary, TrialRunner};
use anyhow::{Context, Result};
use tracing::{debug, info};
use vecbench_kernels::config::DataType;
use vecbench_kernels::element::Element;
use vecbench_kernels::registry::KernelRegistry;
use vecbench_verify::Verifier;

/// Runs configured measurements against one kernel registry per element type.
pub struct BenchRunner {
    registry_f32: KernelRegistry<f32>,
    registry_f64: KernelRegistry<f64>,
    probe: FrequencyProbe,
}

impl Default for BenchRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl BenchRunner {
    pub fn new() -> Self {
        Self {
            registry_f32: KernelRegistry::with_default_kernels(),
            registry_f64: KernelRegistry::with_default_kernels(),
            probe: FrequencyProbe::default(),
        }
    }

    pub fn with_probe(mut self, probe: FrequencyProbe) -> Self {
        self.probe = probe;
        self
    }

    /// Dispatch on the configured element type.
    pub fn run(&self, config: &BenchConfig) -> Result<RunReport> {
        match config.dtype {
            DataType::F32 => run_with_registry(&self.registry_f32, config, &self.probe),
            DataType::F64 => run_with_registry(&self.registry_f64, config, &self.probe),
        }
    }
}

/// Allocate, initialise, snapshot, warm up, measure, reduce, optionally
/// verify, then derive metrics.
///
/// Allocation failure aborts the run with an error; buffers allocated so far
/// are released on return and no report is produced.
pub fn run_with_registry<T: Element>(
    registry: &KernelRegistry<T>,
    config: &BenchConfig,
    probe: &FrequencyProbe,
) -> Result<RunReport> {
    config.validate()?;
    let kernel = registry.resolve(config.kernel, config.mode)?;
    if !config.kernel.honours_stride() && config.stride > 1 {
        info!(
            kernel = %config.kernel,
            stride = config.stride,
            mode = %config.mode,
            "stride and addressing mode have no effect on this kernel"
        );
    }
    let label = || format!("{} {}", config.kernel, T::DTYPE);

    debug!(n = config.n, misalign = config.misalign, dtype = %T::DTYPE, "allocating buffers");
    let mut working = BufferSet::<T>::allocate(config.n, config.misalign)
        .with_context(|| format!("allocating working buffers for {}", label()))?;
    working.initialize(config.seed);

    debug!("snapshotting initial state");
    let snapshot = working
        .snapshot()
        .with_context(|| format!("allocating snapshot buffers for {}", label()))?;

    let trials = TrialRunner::new(kernel.as_ref(), config.stride)
        .with_runs(config.warmups, config.reps);
    trials.warm_up(&snapshot);

    debug!(reps = config.reps, kernel = kernel.name(), "measuring");
    let samples = trials.measure(&mut working, &snapshot)?;
    let latency = LatencySummary::from_samples(&samples);
    debug!(
        median_ns = latency.median_ns,
        p05_ns = latency.p05_ns,
        p95_ns = latency.p95_ns,
        "latency reduced"
    );

    let verification = if config.verify {
        debug!("verifying against reference");
        let verifier = Verifier::new(config.kernel, config.mode, config.stride);
        Some(verifier.verify(kernel.as_ref(), snapshot.initial_state())?)
    } else {
        None
    };

    let cpu_hz = probe.estimate_hz();
    match cpu_hz {
        Some(hz) => info!(ghz = hz / 1e9, "cpu frequency estimated"),
        None => info!("no cycle counter available; cycles per element unavailable"),
    }
    let metrics = DerivedMetrics::derive(config, latency.median_ns, cpu_hz);
    debug!(
        gflops = metrics.gflops,
        gib_per_s = metrics.gib_per_s,
        cpe = metrics.cycles_per_element,
        "metrics derived"
    );

    Ok(RunReport {
        row: ResultRow::new(config, &latency, &metrics, verification.as_ref()),
        mode: config.mode,
        warmups: config.warmups,
        work_elements: metrics.work_elements,
        cpu_hz,
        verification_detail: verification,
        samples_ns: samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::VerificationStatus;
    use std::time::Duration;
    use vecbench_kernels::config::{AddressingMode, KernelKind};

    fn quick_probe() -> FrequencyProbe {
        FrequencyProbe {
            trials: 1,
            settle: Duration::ZERO,
            window: Duration::from_millis(1),
        }
    }

    #[test]
    fn every_kernel_and_dtype_produces_a_verified_row() {
        let runner = BenchRunner::new().with_probe(quick_probe());
        for kind in KernelKind::ALL {
            for dtype in [DataType::F32, DataType::F64] {
                let config = BenchConfig {
                    verify: true,
                    stride: 3,
                    ..BenchConfig::new(kind, dtype, 4096)
                }
                .normalized();
                let report = runner.run(&config).expect("run");
                assert_eq!(report.samples_ns.len(), 9);
                assert_eq!(
                    report.row.verification,
                    VerificationStatus::Passed,
                    "{kind} {dtype}"
                );
                assert!(report.row.median_ns > 0.0);
                assert!(report.row.p05_ns <= report.row.median_ns);
                assert!(report.row.median_ns <= report.row.p95_ns);
            }
        }
    }

    #[test]
    fn sample_mode_reports_visited_work() {
        let runner = BenchRunner::new().with_probe(quick_probe());
        let config = BenchConfig {
            mode: AddressingMode::Sample,
            stride: 16,
            verify: true,
            ..BenchConfig::new(KernelKind::Dot, DataType::F64, 1000)
        }
        .normalized();
        let report = runner.run(&config).expect("run");
        assert_eq!(report.work_elements, 63);
        assert_eq!(report.row.verification, VerificationStatus::Passed);
    }

    #[test]
    fn unverified_run_reports_not_requested() {
        let runner = BenchRunner::new().with_probe(quick_probe());
        let config = BenchConfig::new(KernelKind::Multiply, DataType::F32, 256).normalized();
        let report = runner.run(&config).expect("run");
        assert_eq!(report.row.verification, VerificationStatus::NotRequested);
        assert!(report.row.to_csv().ends_with(",-1,-1"));
    }

    #[test]
    fn invalid_config_is_rejected_before_allocation() {
        let runner = BenchRunner::new().with_probe(quick_probe());
        let config = BenchConfig {
            reps: 2,
            ..BenchConfig::new(KernelKind::Dot, DataType::F32, 16)
        };
        assert!(runner.run(&config).is_err());
    }

    #[test]
    fn strided_stencil_runs_as_unit_stride() {
        let runner = BenchRunner::new().with_probe(quick_probe());
        let base = BenchConfig {
            verify: true,
            ..BenchConfig::new(KernelKind::Stencil, DataType::F64, 514)
        };
        let strided = BenchConfig {
            mode: AddressingMode::Sample,
            stride: 17,
            ..base.clone()
        }
        .normalized();
        assert!(!strided.kernel.honours_stride());

        let plain = runner.run(&base.normalized()).expect("unit stride run");
        let report = runner.run(&strided).expect("strided run");
        assert_eq!(report.work_elements, plain.work_elements);
        assert_eq!(report.work_elements, 512);
        assert_eq!(report.row.stride, 17);
        assert_eq!(report.row.verification, VerificationStatus::Passed);
    }
}
