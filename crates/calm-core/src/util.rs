//! Host queries used across calm

use std::num::NonZeroUsize;

/// Check if running as root
pub fn is_root() -> bool {
    get_uid() == 0
}

/// Get current effective UID
pub fn get_uid() -> u32 {
    unsafe { libc::geteuid() }
}

/// Get current effective GID
pub fn get_gid() -> u32 {
    unsafe { libc::getegid() }
}

/// Number of CPUs visible to this process, never less than one.
pub fn cpu_count() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}
