//! Cycle counter and CPU frequency estimation.

use serde::{Deserialize, Serialize};
use std::hint::spin_loop;
use std::thread;
use std::time::{Duration, Instant};

/// Read the time-stamp counter between two load fences so surrounding
/// instructions cannot drift across the read.
#[cfg(target_arch = "x86_64")]
#[inline(always)]
pub fn read_cycles() -> Option<u64> {
    use std::arch::x86_64::{_mm_lfence, _rdtsc};
    // SAFETY: LFENCE and RDTSC are part of the x86_64 baseline.
    unsafe {
        _mm_lfence();
        let cycles = _rdtsc();
        _mm_lfence();
        Some(cycles)
    }
}

#[cfg(not(target_arch = "x86_64"))]
#[inline(always)]
pub fn read_cycles() -> Option<u64> {
    None
}

/// Parameters of the busy-wait frequency estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyProbe {
    pub trials: usize,
    /// Sleep before each trial so the core leaves any idle state.
    pub settle: Duration,
    /// Busy-wait length of each trial.
    pub window: Duration,
}

impl Default for FrequencyProbe {
    fn default() -> Self {
        Self {
            trials: 5,
            settle: Duration::from_millis(5),
            window: Duration::from_millis(50),
        }
    }
}

impl FrequencyProbe {
    /// Median of per-trial `cycles / seconds`, or `None` when the platform has
    /// no cycle counter or no trial produced a usable estimate.
    pub fn estimate_hz(&self) -> Option<f64> {
        let mut estimates = Vec::with_capacity(self.trials);
        for _ in 0..self.trials {
            thread::sleep(self.settle);
            if let Some(hz) = self.trial() {
                estimates.push(hz);
            }
        }
        median(&mut estimates)
    }

    fn trial(&self) -> Option<f64> {
        let c0 = read_cycles()?;
        let t0 = Instant::now();
        while t0.elapsed() < self.window {
            spin_loop();
        }
        let c1 = read_cycles()?;
        let seconds = t0.elapsed().as_secs_f64();

        let cycles = c1.wrapping_sub(c0) as f64;
        let hz = cycles / seconds;
        (seconds > 0.0 && cycles > 0.0 && hz.is_finite()).then_some(hz)
    }
}

fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    Some(values[values.len() / 2])
}

/// Frequency estimate with the default probe.
pub fn estimate_cpu_hz() -> Option<f64> {
    FrequencyProbe::default().estimate_hz()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_of_odd_and_empty() {
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&mut [4.0, 1.0]), Some(4.0));
        assert_eq!(median(&mut []), None);
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn counter_is_monotonic_and_frequency_plausible() {
        let a = read_cycles().expect("tsc");
        let b = read_cycles().expect("tsc");
        assert!(b >= a);

        let probe = FrequencyProbe {
            trials: 3,
            settle: Duration::from_millis(1),
            window: Duration::from_millis(10),
        };
        let hz = probe.estimate_hz().expect("estimate");
        assert!(hz > 1e7 && hz < 1e11, "implausible frequency {hz}");
    }

    #[cfg(not(target_arch = "x86_64"))]
    #[test]
    fn no_counter_means_no_estimate() {
        assert_eq!(read_cycles(), None);
        assert_eq!(estimate_cpu_hz(), None);
    }
}
