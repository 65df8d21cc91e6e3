//! Process image replacement.
//!
//! A successful exec never returns, so the success type is [`Infallible`]:
//! any `Ok` after the call is unrepresentable.

use std::convert::Infallible;
use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use warden_common::error::{Errno, Result, WardenError};

use super::raw_errno;

/// Resolves `program` on `PATH`, or checks it directly if it has a slash.
///
/// # Errors
///
/// Returns [`WardenError::ExecutableNotFound`] if nothing executable matches.
pub fn resolve_executable(program: &str) -> Result<PathBuf> {
    which::which(program).map_err(|e| {
        tracing::debug!(program, error = %e, "executable lookup failed");
        WardenError::ExecutableNotFound {
            name: program.to_owned(),
        }
    })
}

/// Resolves `program` and replaces the current image with it.
///
/// `args` is the full argument vector including `argv[0]`; `env` holds
/// `KEY=VALUE` entries.
///
/// # Errors
///
/// Returns [`WardenError::ExecutableNotFound`] if resolution fails and
/// [`WardenError::ExecFailed`] if the kernel refuses the image. In both
/// cases the current image is unchanged.
pub fn execv(program: &str, args: &[String], env: &[String]) -> Result<Infallible> {
    let path = resolve_executable(program)?;
    execve_resolved(&path, args, env)
}

/// Calls `execve(2)` on an already-resolved path.
///
/// # Errors
///
/// Returns [`WardenError::ExecFailed`] if an argument contains a NUL byte
/// (`EINVAL`) or the kernel refuses the image.
pub fn execve_resolved(path: &Path, args: &[String], env: &[String]) -> Result<Infallible> {
    let c_path = to_cstring(path.as_os_str().as_bytes())?;
    let c_args = args
        .iter()
        .map(|a| to_cstring(a.as_bytes()))
        .collect::<Result<Vec<_>>>()?;
    let c_env = env
        .iter()
        .map(|e| to_cstring(e.as_bytes()))
        .collect::<Result<Vec<_>>>()?;

    tracing::info!(path = %path.display(), argc = c_args.len(), "replacing process image");
    nix::unistd::execve(&c_path, &c_args, &c_env).map_err(|e| {
        tracing::error!(path = %path.display(), errno = %e, "execve failed");
        WardenError::ExecFailed { errno: raw_errno(e) }
    })
}

fn to_cstring(bytes: &[u8]) -> Result<CString> {
    CString::new(bytes).map_err(|_| WardenError::ExecFailed {
        errno: Errno(libc::EINVAL),
    })
}
