//! Process lifecycle helpers used between clone and exec.
//!
//! Parent-death signal handling, keep-capabilities, controlling terminal
//! assignment, start-time identity, resource limits, and image replacement.

pub mod exec;
pub mod prctl;
pub mod proc;
pub mod rlimit;
pub mod tty;

pub use exec::{execv, execve_resolved, resolve_executable};
pub use prctl::{
    LinuxProcessControl, ParentDeathSignal, ProcessControl, clear_keep_caps, set_keep_caps,
};
pub use proc::{ProcessIdentitySample, process_start_time};
pub use rlimit::set_rlimit;
pub use tty::set_controlling_terminal;

use warden_common::error::Errno;

/// Converts a nix errno into the raw value carried by workspace errors.
pub(crate) const fn raw_errno(errno: nix::errno::Errno) -> Errno {
    Errno(errno as i32)
}
