//! Controlling terminal assignment for interactive containers.

use warden_common::error::{Result, WardenError};

use super::raw_errno;

/// Makes stdin the controlling terminal of the calling process.
///
/// The caller must be a session leader without a controlling terminal,
/// which holds right after `setsid(2)` in the cloned child.
///
/// # Errors
///
/// Returns [`WardenError::IoctlFailed`] if `TIOCSCTTY` is rejected.
pub fn set_controlling_terminal() -> Result<()> {
    // SAFETY: TIOCSCTTY takes an integer argument (0: do not steal) and no
    // pointers; fd 0 is only read by the kernel.
    let rc = unsafe { libc::ioctl(libc::STDIN_FILENO, libc::TIOCSCTTY, 0) };
    if rc != 0 {
        return Err(WardenError::IoctlFailed {
            errno: raw_errno(nix::errno::Errno::last()),
        });
    }
    tracing::debug!("stdin set as controlling terminal");
    Ok(())
}
