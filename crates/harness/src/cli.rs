//! CLI wiring for the vecbench harness.

use crate::affinity::pin_current_thread;
use crate::config::{BenchConfig, DEFAULT_N, DEFAULT_SEED, MIN_REPS, MIN_WARMUPS};
use crate::report::{OutputFormat, CSV_HEADER};
use crate::runner::BenchRunner;
use anyhow::Result;
use clap::Parser;
use std::io::{self, Write};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use vecbench_kernels::config::{AddressingMode, DataType, KernelKind};

#[derive(Parser, Debug)]
#[command(
    name = "vecbench",
    about = "Benchmark SIMD vector kernels and check their numerical fidelity"
)]
pub struct Cli {
    #[arg(long, value_enum, default_value = "saxpy")]
    pub kernel: KernelArg,

    #[arg(long, value_enum, default_value = "f32")]
    pub dtype: DtypeArg,

    /// Element count.
    #[arg(long, default_value_t = DEFAULT_N)]
    pub n: usize,

    /// Timed repetitions (raised to at least 9).
    #[arg(long, default_value_t = MIN_REPS)]
    pub reps: usize,

    #[arg(long, default_value_t = 1)]
    pub stride: usize,

    /// Offset the read buffer one element past its 64-byte boundary.
    #[arg(long, default_value_t = false)]
    pub misalign: bool,

    /// Discarded warmup iterations (raised to at least 2).
    #[arg(long, default_value_t = MIN_WARMUPS)]
    pub warmups: usize,

    /// Pin the process to this logical core.
    #[arg(long)]
    pub pin: Option<usize>,

    #[arg(long, default_value_t = false)]
    pub verify: bool,

    #[arg(long = "stride-mode", alias = "stride_mode", value_enum, default_value = "index")]
    pub stride_mode: ModeArg,

    /// Flush subnormals to zero.
    #[arg(long, default_value_t = false)]
    pub ftz: bool,

    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    #[arg(long, value_enum, default_value = "csv")]
    pub format: FormatArg,

    /// Print the CSV column names before the row.
    #[arg(long, default_value_t = false)]
    pub header: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum KernelArg {
    #[value(alias = "scaled-add")]
    Saxpy,
    Dot,
    #[value(alias = "multiply")]
    Mul,
    Stencil,
}

impl From<KernelArg> for KernelKind {
    fn from(value: KernelArg) -> KernelKind {
        match value {
            KernelArg::Saxpy => KernelKind::ScaledAdd,
            KernelArg::Dot => KernelKind::Dot,
            KernelArg::Mul => KernelKind::Multiply,
            KernelArg::Stencil => KernelKind::Stencil,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum DtypeArg {
    #[value(name = "f32", alias = "single")]
    F32,
    #[value(name = "f64", alias = "double")]
    F64,
}

impl From<DtypeArg> for DataType {
    fn from(value: DtypeArg) -> DataType {
        match value {
            DtypeArg::F32 => DataType::F32,
            DtypeArg::F64 => DataType::F64,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum ModeArg {
    Index,
    Sample,
}

impl From<ModeArg> for AddressingMode {
    fn from(value: ModeArg) -> AddressingMode {
        match value {
            ModeArg::Index => AddressingMode::Index,
            ModeArg::Sample => AddressingMode::Sample,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum FormatArg {
    Csv,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> OutputFormat {
        match value {
            FormatArg::Csv => OutputFormat::Csv,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

impl Cli {
    /// Normalised run configuration.
    pub fn bench_config(&self) -> BenchConfig {
        BenchConfig {
            kernel: self.kernel.into(),
            dtype: self.dtype.into(),
            n: self.n,
            reps: self.reps,
            stride: self.stride,
            misalign: self.misalign,
            warmups: self.warmups,
            mode: self.stride_mode.into(),
            verify: self.verify,
            pin_core: self.pin,
            flush_denormals: self.ftz,
            seed: self.seed,
        }
        .normalized()
    }
}

pub fn run_cli(cli: Cli) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();

    let config = cli.bench_config();
    let format = OutputFormat::from(cli.format);

    let environment = config.float_environment().apply()?;
    info!(flush_denormals = environment.flush_denormals, "float environment applied");

    if let Some(core) = config.pin_core {
        match pin_current_thread(core) {
            Ok(()) => info!(core, "pinned to core"),
            Err(err) => warn!(core, error = %err, "core pinning failed; continuing unpinned"),
        }
    }

    let report = BenchRunner::new().run(&config)?;

    let mut stdout = io::stdout().lock();
    if cli.header && format == OutputFormat::Csv {
        writeln!(stdout, "{CSV_HEADER}")?;
    }
    writeln!(stdout, "{}", report.render(format)?)?;
    Ok(())
}
