//! Pinning the measuring thread to one CPU core.

use anyhow::{bail, Result};

/// Restrict the calling thread to `core`.
///
/// Callers treat failure as a warning; measurement proceeds unpinned.
#[cfg(target_os = "linux")]
pub fn pin_current_thread(core: usize) -> Result<()> {
    let capacity = libc::CPU_SETSIZE as usize;
    if core >= capacity {
        bail!("core {core} is outside the affinity mask (max {})", capacity - 1);
    }

    // SAFETY: `set` is a correctly sized, zero-initialised cpu_set_t and
    // `core` is within its capacity; pid 0 targets the calling thread.
    let rc = unsafe {
        let mut set: libc::cpu_set_t = std::mem::zeroed();
        libc::CPU_SET(core, &mut set);
        libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set)
    };
    if rc != 0 {
        bail!(
            "sched_setaffinity to core {core} failed: {}",
            std::io::Error::last_os_error()
        );
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
pub fn pin_current_thread(core: usize) -> Result<()> {
    bail!("pinning to core {core} is not supported on this platform")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_core_is_an_error() {
        let err = std::thread::spawn(|| pin_current_thread(usize::MAX))
            .join()
            .expect("thread");
        assert!(err.is_err());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn pinning_to_an_allowed_core_succeeds() {
        // SAFETY: zeroed cpu_set_t filled by the kernel for this thread.
        let allowed = unsafe {
            let mut set: libc::cpu_set_t = std::mem::zeroed();
            let rc = libc::sched_getaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &mut set);
            assert_eq!(rc, 0);
            (0..libc::CPU_SETSIZE as usize).find(|&cpu| libc::CPU_ISSET(cpu, &set))
        };
        let core = allowed.expect("at least one allowed core");
        std::thread::spawn(move || pin_current_thread(core))
            .join()
            .expect("thread")
            .expect("pin to allowed core");
    }
}
