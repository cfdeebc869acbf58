//! Floating-point environment: round-to-nearest, optional flush-to-zero.
//!
//! Configured once per process on the main thread, before any buffer is
//! touched. Threads spawned afterwards inherit the control register.

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::debug;

static APPLIED: OnceLock<FloatEnvironment> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FloatEnvironment {
    /// Flush subnormal results to zero and treat subnormal inputs as zero.
    pub flush_denormals: bool,
}

impl FloatEnvironment {
    /// Configure the calling thread. Repeating the same configuration is a
    /// no-op; asking for a different one after the first call is an error.
    pub fn apply(self) -> Result<FloatEnvironment> {
        let applied = *APPLIED.get_or_init(|| {
            self.apply_to_current_thread();
            debug!(flush_denormals = self.flush_denormals, "float environment configured");
            self
        });
        ensure!(
            applied == self,
            "float environment already configured as {applied:?}, cannot switch to {self:?}"
        );
        Ok(applied)
    }

    #[cfg(target_arch = "x86_64")]
    #[allow(deprecated)]
    fn apply_to_current_thread(self) {
        use std::arch::x86_64::{_mm_getcsr, _mm_setcsr};

        const ROUNDING_CONTROL: u32 = 0x6000;
        const FLUSH_TO_ZERO: u32 = 0x8000;
        const DENORMALS_ARE_ZERO: u32 = 0x0040;

        // SAFETY: only the rounding and denormal control bits change; the
        // exception masks keep their current values.
        unsafe {
            let mut csr = _mm_getcsr() & !ROUNDING_CONTROL;
            if self.flush_denormals {
                csr |= FLUSH_TO_ZERO | DENORMALS_ARE_ZERO;
            } else {
                csr &= !(FLUSH_TO_ZERO | DENORMALS_ARE_ZERO);
            }
            _mm_setcsr(csr);
        }
    }

    #[cfg(target_arch = "aarch64")]
    fn apply_to_current_thread(self) {
        use std::arch::asm;

        const ROUNDING_MODE: u64 = 0b11 << 22;
        const FLUSH_TO_ZERO: u64 = 1 << 24;

        let mut fpcr: u64;
        // SAFETY: reading and writing FPCR has no memory effects; only the
        // rounding mode and FZ bits are modified.
        unsafe {
            asm!("mrs {}, fpcr", out(reg) fpcr, options(nomem, nostack));
            fpcr &= !ROUNDING_MODE;
            if self.flush_denormals {
                fpcr |= FLUSH_TO_ZERO;
            } else {
                fpcr &= !FLUSH_TO_ZERO;
            }
            asm!("msr fpcr, {}", in(reg) fpcr, options(nomem, nostack));
        }
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    fn apply_to_current_thread(self) {
        if self.flush_denormals {
            tracing::warn!(
                "flush-to-zero is not supported on this architecture; subnormals are kept"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::hint::black_box;
    use std::thread;

    #[test]
    fn repeated_default_is_accepted() {
        let first = FloatEnvironment::default().apply().expect("first apply");
        let second = FloatEnvironment::default().apply().expect("same config again");
        assert_eq!(first, second);
        assert!(FloatEnvironment {
            flush_denormals: true
        }
        .apply()
        .is_err());
    }

    #[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
    #[test]
    fn flush_mode_zeroes_subnormal_results() {
        let flushed = thread::spawn(|| {
            FloatEnvironment {
                flush_denormals: true,
            }
            .apply_to_current_thread();
            black_box(f64::MIN_POSITIVE) / black_box(4.0)
        })
        .join()
        .expect("thread");
        assert_eq!(flushed, 0.0);

        let kept = thread::spawn(|| {
            FloatEnvironment::default().apply_to_current_thread();
            black_box(f64::MIN_POSITIVE) / black_box(4.0)
        })
        .join()
        .expect("thread");
        assert!(kept > 0.0 && !kept.is_normal());
    }
}
