//! Result rows and their CSV/JSON rendering.

use crate::config::BenchConfig;
use crate::metrics::DerivedMetrics;
use crate::timing::LatencySummary;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use vecbench_kernels::config::{AddressingMode, DataType, KernelKind};
use vecbench_verify::VerificationOutcome;

pub const CSV_HEADER: &str = concat!(
    "kernel,dtype,n,stride,misalign,reps,",
    "median_ns,p05_ns,p95_ns,gflops,cpe,GiBps,verified,max_rel_err"
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    NotRequested,
    Passed,
    Failed,
}

impl VerificationStatus {
    /// Column value: 1 pass, 0 fail, -1 not requested.
    pub fn code(&self) -> i32 {
        match self {
            VerificationStatus::NotRequested => -1,
            VerificationStatus::Passed => 1,
            VerificationStatus::Failed => 0,
        }
    }
}

impl From<Option<&VerificationOutcome>> for VerificationStatus {
    fn from(outcome: Option<&VerificationOutcome>) -> Self {
        match outcome {
            None => VerificationStatus::NotRequested,
            Some(outcome) if outcome.passed => VerificationStatus::Passed,
            Some(_) => VerificationStatus::Failed,
        }
    }
}

/// The fourteen output fields of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub kernel: KernelKind,
    pub dtype: DataType,
    pub n: usize,
    pub stride: usize,
    pub misalign: bool,
    pub reps: usize,
    pub median_ns: f64,
    pub p05_ns: f64,
    pub p95_ns: f64,
    pub gflops: f64,
    pub cycles_per_element: f64,
    pub gib_per_s: f64,
    pub verification: VerificationStatus,
    /// `None` when verification was not requested.
    pub max_relative_error: Option<f64>,
}

impl ResultRow {
    pub fn new(
        config: &BenchConfig,
        latency: &LatencySummary,
        metrics: &DerivedMetrics,
        outcome: Option<&VerificationOutcome>,
    ) -> Self {
        Self {
            kernel: config.kernel,
            dtype: config.dtype,
            n: config.n,
            stride: config.stride,
            misalign: config.misalign,
            reps: config.reps,
            median_ns: latency.median_ns,
            p05_ns: latency.p05_ns,
            p95_ns: latency.p95_ns,
            gflops: metrics.gflops,
            cycles_per_element: metrics.cycles_per_element,
            gib_per_s: metrics.gib_per_s,
            verification: VerificationStatus::from(outcome),
            max_relative_error: outcome.map(|o| o.max_relative_error),
        }
    }

    /// Comma-separated line in [`CSV_HEADER`] order, without a newline.
    ///
    /// Floats use printf conventions: six decimals for timings and rates,
    /// `%.13e` for the error, and `nan`/`inf` for non-finite values.
    pub fn to_csv(&self) -> String {
        let error = match self.max_relative_error {
            Some(error) => scientific(error),
            None => "-1".to_string(),
        };
        [
            self.kernel.to_string(),
            self.dtype.to_string(),
            self.n.to_string(),
            self.stride.to_string(),
            u8::from(self.misalign).to_string(),
            self.reps.to_string(),
            fixed(self.median_ns),
            fixed(self.p05_ns),
            fixed(self.p95_ns),
            fixed(self.gflops),
            fixed(self.cycles_per_element),
            fixed(self.gib_per_s),
            self.verification.code().to_string(),
            error,
        ]
        .join(",")
    }
}

fn non_finite(value: f64) -> Option<&'static str> {
    if value.is_nan() {
        Some("nan")
    } else if value.is_infinite() {
        Some(if value > 0.0 { "inf" } else { "-inf" })
    } else {
        None
    }
}

/// `%.6f`.
fn fixed(value: f64) -> String {
    match non_finite(value) {
        Some(text) => text.to_string(),
        None => format!("{value:.6}"),
    }
}

/// `%.13e`: signed exponent of at least two digits.
fn scientific(value: f64) -> String {
    if let Some(text) = non_finite(value) {
        return text.to_string();
    }
    let formatted = format!("{value:.13e}");
    let Some((mantissa, exponent)) = formatted.split_once('e') else {
        return formatted;
    };
    match exponent.parse::<i32>() {
        Ok(exponent) => {
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exponent.unsigned_abs())
        }
        Err(_) => formatted,
    }
}

/// Everything a run produced: the row plus the context behind it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    #[serde(flatten)]
    pub row: ResultRow,
    pub mode: AddressingMode,
    pub warmups: usize,
    pub work_elements: usize,
    pub cpu_hz: Option<f64>,
    pub verification_detail: Option<VerificationOutcome>,
    pub samples_ns: Vec<f64>,
}

impl RunReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Csv => Ok(self.row.to_csv()),
            OutputFormat::Json => self.to_json(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> ResultRow {
        ResultRow {
            kernel: KernelKind::ScaledAdd,
            dtype: DataType::F32,
            n: 1024,
            stride: 1,
            misalign: true,
            reps: 9,
            median_ns: 1500.25,
            p05_ns: 1400.0,
            p95_ns: 1700.5,
            gflops: 1.365333,
            cycles_per_element: 4.5,
            gib_per_s: 7.62939453125,
            verification: VerificationStatus::NotRequested,
            max_relative_error: None,
        }
    }

    #[test]
    fn csv_row_has_fourteen_fields_in_order() {
        let line = sample_row().to_csv();
        let fields: Vec<&str> = line.split(',').collect();
        assert_eq!(fields.len(), 14);
        assert_eq!(CSV_HEADER.split(',').count(), 14);
        assert_eq!(
            line,
            concat!(
                "saxpy,f32,1024,1,1,9,",
                "1500.250000,1400.000000,1700.500000,1.365333,4.500000,7.629395,-1,-1"
            )
        );
    }

    #[test]
    fn verified_rows_carry_status_and_error() {
        let outcome = VerificationOutcome {
            passed: false,
            max_relative_error: 2.5,
            checked: 10,
            mismatches: 3,
        };
        let mut row = sample_row();
        row.verification = VerificationStatus::from(Some(&outcome));
        row.max_relative_error = Some(outcome.max_relative_error);
        let line = row.to_csv();
        assert!(line.ends_with(",0,2.5000000000000e+00"), "{line}");
        assert_eq!(VerificationStatus::Passed.code(), 1);
    }

    #[test]
    fn csv_floats_follow_printf_conventions() {
        let mut row = sample_row();
        row.gflops = f64::NAN;
        row.cycles_per_element = f64::NAN;
        row.gib_per_s = f64::INFINITY;
        row.verification = VerificationStatus::Passed;
        row.max_relative_error = Some(3.0e-17);
        let line = row.to_csv();
        assert!(
            line.ends_with(",1700.500000,nan,nan,inf,1,3.0000000000000e-17"),
            "{line}"
        );

        row.max_relative_error = Some(0.0);
        assert!(row.to_csv().ends_with(",1,0.0000000000000e+00"));
        row.max_relative_error = Some(f64::NAN);
        assert!(row.to_csv().ends_with(",1,nan"));
        assert_eq!(scientific(-1.25e120), "-1.2500000000000e+120");
        assert_eq!(fixed(f64::NEG_INFINITY), "-inf");
    }

    #[test]
    fn json_report_flattens_row() {
        let report = RunReport {
            row: sample_row(),
            mode: AddressingMode::Sample,
            warmups: 2,
            work_elements: 1024,
            cpu_hz: None,
            verification_detail: None,
            samples_ns: vec![1500.25],
        };
        let value: serde_json::Value =
            serde_json::from_str(&report.render(OutputFormat::Json).expect("json")).expect("parse");
        assert_eq!(value["kernel"], "saxpy");
        assert_eq!(value["mode"], "sample");
        assert_eq!(value["verification"], "not_requested");
        assert!(value["cpu_hz"].is_null());
    }
}
