//! `prctl(2)` wrappers: parent-death signal and keep-capabilities.
//!
//! The parent-death signal is cleared by the kernel on credential changes
//! and some namespace transitions, so callers re-assert it through
//! [`ParentDeathSignal::restore`] after each of them.

use std::fmt;

use warden_common::error::{Result, WardenError};

use super::raw_errno;

/// Signal delivered to this process when its parent exits. Zero disables it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ParentDeathSignal(pub i32);

impl ParentDeathSignal {
    /// The disabled value.
    pub const NONE: Self = Self(0);

    /// Whether a signal is configured.
    #[must_use]
    pub const fn is_set(self) -> bool {
        self.0 != 0
    }

    /// Reads the calling process's current parent-death signal.
    ///
    /// # Errors
    ///
    /// Returns [`WardenError::PrctlFailed`] if `PR_GET_PDEATHSIG` fails.
    pub fn current() -> Result<Self> {
        LinuxProcessControl.parent_death_signal()
    }

    /// Installs this signal as the parent-death signal.
    ///
    /// # Errors
    ///
    /// Returns [`WardenError::PrctlFailed`] if `PR_SET_PDEATHSIG` fails.
    pub fn set(self) -> Result<()> {
        self.set_with(&LinuxProcessControl)
    }

    /// Re-asserts this signal if the kernel has cleared or changed it.
    ///
    /// # Errors
    ///
    /// Returns [`WardenError::PrctlFailed`] if reading or writing fails.
    pub fn restore(self) -> Result<()> {
        self.restore_with(&LinuxProcessControl)
    }

    /// [`ParentDeathSignal::set`] against an explicit control backend.
    ///
    /// # Errors
    ///
    /// Propagates the backend's error unchanged.
    pub fn set_with(self, ctl: &impl ProcessControl) -> Result<()> {
        ctl.set_parent_death_signal(self)
    }

    /// [`ParentDeathSignal::restore`] against an explicit control backend.
    ///
    /// A zero target is a no-op: restore never clears a signal someone else
    /// installed. Otherwise the current value is read and only written back
    /// when it differs.
    ///
    /// # Errors
    ///
    /// Propagates the backend's error unchanged.
    pub fn restore_with(self, ctl: &impl ProcessControl) -> Result<()> {
        if !self.is_set() {
            return Ok(());
        }
        let current = ctl.parent_death_signal()?;
        if current == self {
            return Ok(());
        }
        tracing::debug!(current = current.0, target = self.0, "restoring parent death signal");
        self.set_with(ctl)
    }
}

impl fmt::Display for ParentDeathSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for ParentDeathSignal {
    fn from(sig: i32) -> Self {
        Self(sig)
    }
}

/// Process-control primitives the lifecycle helpers are built on.
pub trait ProcessControl {
    /// Reads the parent-death signal.
    ///
    /// # Errors
    ///
    /// Returns [`WardenError::PrctlFailed`] on failure.
    fn parent_death_signal(&self) -> Result<ParentDeathSignal>;

    /// Writes the parent-death signal.
    ///
    /// # Errors
    ///
    /// Returns [`WardenError::PrctlFailed`] on failure.
    fn set_parent_death_signal(&self, signal: ParentDeathSignal) -> Result<()>;
}

/// [`ProcessControl`] backed by the real `prctl(2)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinuxProcessControl;

impl ProcessControl for LinuxProcessControl {
    fn parent_death_signal(&self) -> Result<ParentDeathSignal> {
        let mut sig: libc::c_int = 0;
        // SAFETY: PR_GET_PDEATHSIG stores one int through the pointer, which
        // refers to a live local.
        let rc = unsafe { libc::prctl(libc::PR_GET_PDEATHSIG, &raw mut sig) };
        if rc != 0 {
            return Err(WardenError::PrctlFailed {
                errno: raw_errno(nix::errno::Errno::last()),
            });
        }
        Ok(ParentDeathSignal(sig))
    }

    fn set_parent_death_signal(&self, signal: ParentDeathSignal) -> Result<()> {
        #[allow(clippy::cast_sign_loss)]
        let arg = signal.0 as libc::c_ulong;
        // SAFETY: PR_SET_PDEATHSIG takes the signal number by value.
        let rc = unsafe { libc::prctl(libc::PR_SET_PDEATHSIG, arg, 0, 0, 0) };
        if rc != 0 {
            return Err(WardenError::PrctlFailed {
                errno: raw_errno(nix::errno::Errno::last()),
            });
        }
        tracing::debug!(signal = signal.0, "parent death signal set");
        Ok(())
    }
}

/// Keeps permitted capabilities across the next UID change.
///
/// # Errors
///
/// Returns [`WardenError::PrctlFailed`] if `PR_SET_KEEPCAPS` fails.
pub fn set_keep_caps() -> Result<()> {
    nix::sys::prctl::set_keepcaps(true).map_err(|e| WardenError::PrctlFailed {
        errno: raw_errno(e),
    })?;
    tracing::debug!("keep-capabilities set");
    Ok(())
}

/// Lets the next UID change clear permitted capabilities again.
///
/// # Errors
///
/// Returns [`WardenError::PrctlFailed`] if `PR_SET_KEEPCAPS` fails.
pub fn clear_keep_caps() -> Result<()> {
    nix::sys::prctl::set_keepcaps(false).map_err(|e| WardenError::PrctlFailed {
        errno: raw_errno(e),
    })?;
    tracing::debug!("keep-capabilities cleared");
    Ok(())
}
