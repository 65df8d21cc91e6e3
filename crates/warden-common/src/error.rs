//! Unified error types for the Warden workspace.
//!
//! Every failure in the init path is security relevant, so errors are
//! returned to the immediate caller as-is. No variant wraps another one.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::RlimitKind;

/// Raw OS error number carried by syscall failures.
///
/// Kept as the bare integer so it compares exactly; `Display` renders the
/// libc description next to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Errno(pub i32);

impl fmt::Display for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (errno {})",
            std::io::Error::from_raw_os_error(self.0),
            self.0
        )
    }
}

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum WardenError {
    /// The running (OS, architecture) pair has no namespace-join call number.
    #[error("unsupported platform {os}/{arch}")]
    UnsupportedPlatform {
        /// Operating system name.
        os: String,
        /// Architecture name.
        arch: String,
    },

    /// The kernel rejected a namespace join.
    #[error("setns failed: {errno}")]
    NamespaceJoinFailed {
        /// OS error returned by `setns(2)`.
        errno: Errno,
    },

    /// A `prctl(2)` request failed.
    #[error("prctl failed: {errno}")]
    PrctlFailed {
        /// OS error returned by `prctl(2)`.
        errno: Errno,
    },

    /// A device-control request failed.
    #[error("ioctl failed: {errno}")]
    IoctlFailed {
        /// OS error returned by `ioctl(2)`.
        errno: Errno,
    },

    /// The process status record could not be read.
    #[error("process {pid} not found")]
    ProcessNotFound {
        /// Process that was looked up.
        pid: u32,
    },

    /// The process status record has too few fields.
    #[error("malformed stat record for process {pid}: {fields} fields")]
    MalformedStatRecord {
        /// Process that was looked up.
        pid: u32,
        /// Number of fields actually present.
        fields: usize,
    },

    /// The target program could not be resolved on the search path.
    #[error("executable not found: {name:?}")]
    ExecutableNotFound {
        /// Name that was searched for.
        name: String,
    },

    /// `execve(2)` returned, leaving the current image in place.
    #[error("exec failed: {errno}")]
    ExecFailed {
        /// OS error returned by `execve(2)`.
        errno: Errno,
    },

    /// The compiled-in profile template could not be rendered.
    #[error("failed to render security profile: {reason}")]
    ProfileRenderFailed {
        /// What went wrong while rendering.
        reason: String,
    },

    /// The mandatory-access-control subsystem refused the profile transition.
    #[error("failed to apply security profile {name:?}: {errno}")]
    ProfileApplyFailed {
        /// Profile that was requested.
        name: String,
        /// OS error reported by the subsystem.
        errno: Errno,
    },

    /// `setrlimit(2)` failed for one resource.
    #[error("failed to set {kind} limit: {errno}")]
    LimitSetFailed {
        /// Resource whose limit was being applied.
        kind: RlimitKind,
        /// OS error returned by `setrlimit(2)`.
        errno: Errno,
    },

    /// Switching user or group identity failed.
    #[error("failed to set process identity: {errno}")]
    SetIdentityFailed {
        /// OS error returned by the credential syscall.
        errno: Errno,
    },

    /// Adjusting the capability sets failed.
    #[error("capability update failed: {errno}")]
    CapabilityFailed {
        /// OS error returned by `capset(2)`.
        errno: Errno,
    },

    /// The security-label subsystem rejected the label.
    #[error("failed to set process label {label:?}: {errno}")]
    LabelFailed {
        /// Label that was requested.
        label: String,
        /// OS error reported while writing the label.
        errno: Errno,
    },

    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, WardenError>;
