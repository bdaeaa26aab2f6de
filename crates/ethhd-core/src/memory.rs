//! Process and page hardening for secret material
//!
//! - [`disable_core_dumps`] sets `RLIMIT_CORE` to zero so a crash never
//!   writes seeds or keys to disk.
//! - [`mlock`] / [`munlock`] pin a region so it is never swapped out.
//!
//! All of it is best-effort. Containers and unprivileged users often cannot
//! lock memory; failures are logged and reported through the return value.

use std::sync::atomic::{AtomicBool, Ordering};

static CORE_DUMPS_DISABLED: AtomicBool = AtomicBool::new(false);

/// Disable core dumps for the current process. Idempotent.
///
/// Returns `true` if core dumps are disabled.
pub fn disable_core_dumps() -> bool {
    if CORE_DUMPS_DISABLED.swap(true, Ordering::SeqCst) {
        return true;
    }

    #[cfg(unix)]
    {
        let ok = unix::set_core_limit_zero();
        if !ok {
            CORE_DUMPS_DISABLED.store(false, Ordering::SeqCst);
        }
        ok
    }

    #[cfg(not(unix))]
    {
        CORE_DUMPS_DISABLED.store(false, Ordering::SeqCst);
        log::warn!("core dump prevention is not supported on this platform");
        false
    }
}

/// Lock `len` bytes at `ptr` into RAM.
///
/// # Safety
///
/// `ptr` must point to a live allocation of at least `len` bytes, and the
/// region must be unlocked (or the process must exit) before it is freed.
pub unsafe fn mlock(ptr: *const u8, len: usize) -> bool {
    if len == 0 {
        return true;
    }

    #[cfg(unix)]
    {
        unix::mlock(ptr, len)
    }

    #[cfg(not(unix))]
    {
        let _ = ptr;
        log::warn!("mlock is not supported on this platform ({} bytes)", len);
        false
    }
}

/// Unlock a region previously passed to [`mlock`].
///
/// # Safety
///
/// `ptr` and `len` must match an earlier successful [`mlock`] call.
pub unsafe fn munlock(ptr: *const u8, len: usize) -> bool {
    if len == 0 {
        return true;
    }

    #[cfg(unix)]
    {
        unix::munlock(ptr, len)
    }

    #[cfg(not(unix))]
    {
        let _ = (ptr, len);
        true
    }
}

#[cfg(unix)]
mod unix {
    pub fn set_core_limit_zero() -> bool {
        let rlim = libc::rlimit {
            rlim_cur: 0,
            rlim_max: 0,
        };
        // SAFETY: setrlimit only reads the struct we pass.
        let rc = unsafe { libc::setrlimit(libc::RLIMIT_CORE, &rlim) };
        if rc != 0 {
            log::warn!(
                "failed to disable core dumps: {}",
                std::io::Error::last_os_error()
            );
            return false;
        }
        true
    }

    pub unsafe fn mlock(ptr: *const u8, len: usize) -> bool {
        if libc::mlock(ptr as *const libc::c_void, len) != 0 {
            log::warn!(
                "mlock of {} bytes failed, secret may be swappable: {}",
                len,
                std::io::Error::last_os_error()
            );
            return false;
        }
        true
    }

    pub unsafe fn munlock(ptr: *const u8, len: usize) -> bool {
        libc::munlock(ptr as *const libc::c_void, len) == 0
    }
}
