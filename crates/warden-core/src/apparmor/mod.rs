//! AppArmor confinement.
//!
//! Generation ([`profile`]) and enforcement are separate stages: a rendered
//! profile must be loaded by `apparmor_parser` before [`apply_profile`] can
//! name it. Enforcement is deferred: the transition happens at the next
//! `execve(2)`, so it has to be requested before the exec, never after.

pub mod profile;

pub use profile::{FsHostProbe, HostProbe, ProfileDocument, ProfileSpec, generate_profile};

use std::io::Write;
use std::path::{Path, PathBuf};

use warden_common::constants::{
    APPARMOR_ENABLED_PARAM, APPARMOR_EXEC_ATTR, APPARMOR_PARSER, APPARMOR_SECURITYFS,
    CONTAINER_ENV_VAR, LSM_EXEC_ATTR,
};
use warden_common::error::{Errno, Result, WardenError};

/// Reports whether AppArmor confinement is available on this host.
///
/// Always false inside a nested container (the `container` environment
/// variable is set), since the host policy cannot be managed from there.
#[must_use]
pub fn is_enabled() -> bool {
    let nested = std::env::var_os(CONTAINER_ENV_VAR).is_some_and(|v| !v.is_empty());
    is_enabled_in(Path::new("/"), nested)
}

/// [`is_enabled`] against an alternative host root.
#[must_use]
pub fn is_enabled_in(root: &Path, nested: bool) -> bool {
    if nested || !root.join(APPARMOR_SECURITYFS).exists() {
        return false;
    }
    if !root.join(APPARMOR_PARSER).exists() {
        return false;
    }
    std::fs::read(root.join(APPARMOR_ENABLED_PARAM))
        .is_ok_and(|flag| flag.len() > 1 && flag[0] == b'Y')
}

/// The "change profile on next exec" request of the AppArmor subsystem.
pub trait ProfileTransition {
    /// Asks for `name` to become the confinement of the next exec'd image.
    ///
    /// # Errors
    ///
    /// Returns the OS error reported by the subsystem.
    fn change_onexec(&self, name: &str) -> std::result::Result<(), Errno>;
}

/// Requests a deferred transition by writing `exec <name>` to the
/// per-thread AppArmor attribute, as `aa_change_onexec(3)` does.
#[derive(Debug, Clone)]
pub struct ProcAttrTransition {
    attr_path: PathBuf,
    legacy_attr_path: PathBuf,
}

impl ProcAttrTransition {
    /// Transition writer using custom attribute paths.
    #[must_use]
    pub fn with_attr_paths(attr_path: impl Into<PathBuf>, legacy: impl Into<PathBuf>) -> Self {
        Self {
            attr_path: attr_path.into(),
            legacy_attr_path: legacy.into(),
        }
    }

    fn write_attr(path: &Path, command: &str) -> std::io::Result<()> {
        let mut attr = std::fs::OpenOptions::new().write(true).open(path)?;
        attr.write_all(command.as_bytes())
    }
}

impl Default for ProcAttrTransition {
    fn default() -> Self {
        Self::with_attr_paths(APPARMOR_EXEC_ATTR, LSM_EXEC_ATTR)
    }
}

impl ProfileTransition for ProcAttrTransition {
    fn change_onexec(&self, name: &str) -> std::result::Result<(), Errno> {
        let command = format!("exec {name}");
        let result = match Self::write_attr(&self.attr_path, &command) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Self::write_attr(&self.legacy_attr_path, &command)
            }
            other => other,
        };
        result.map_err(|e| Errno(e.raw_os_error().unwrap_or(libc::EIO)))
    }
}

#[cfg(feature = "libapparmor")]
mod ffi {
    #[link(name = "apparmor")]
    unsafe extern "C" {
        pub fn aa_change_onexec(profile: *const libc::c_char) -> libc::c_int;
    }
}

/// Requests the transition through `libapparmor`'s `aa_change_onexec(3)`.
#[cfg(feature = "libapparmor")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LibAppArmor;

#[cfg(feature = "libapparmor")]
impl ProfileTransition for LibAppArmor {
    fn change_onexec(&self, name: &str) -> std::result::Result<(), Errno> {
        let c_name = std::ffi::CString::new(name).map_err(|_| Errno(libc::EINVAL))?;
        // SAFETY: c_name is a valid NUL-terminated string that outlives the
        // call; libapparmor does not keep the pointer.
        let rc = unsafe { ffi::aa_change_onexec(c_name.as_ptr()) };
        let err = std::io::Error::last_os_error();
        drop(c_name);
        if rc != 0 {
            return Err(Errno(err.raw_os_error().unwrap_or(libc::EIO)));
        }
        Ok(())
    }
}

/// Transition backend selected at build time.
#[cfg(feature = "libapparmor")]
pub type DefaultTransition = LibAppArmor;

/// Transition backend selected at build time.
#[cfg(not(feature = "libapparmor"))]
pub type DefaultTransition = ProcAttrTransition;

/// Applies `name` to the next exec using the build's default backend.
///
/// # Errors
///
/// Returns [`WardenError::ProfileApplyFailed`] if the subsystem refuses.
pub fn apply_profile(name: &str) -> Result<()> {
    apply_profile_with(name, &DefaultTransition::default())
}

/// Applies `name` to the next exec through `transition`.
///
/// An empty name means the container opted out of confinement and makes
/// no call at all.
///
/// # Errors
///
/// Returns [`WardenError::ProfileApplyFailed`] naming the profile if the
/// subsystem refuses.
pub fn apply_profile_with(name: &str, transition: &(impl ProfileTransition + ?Sized)) -> Result<()> {
    if name.is_empty() {
        tracing::debug!("no apparmor profile requested");
        return Ok(());
    }
    transition.change_onexec(name).map_err(|errno| {
        tracing::error!(profile = name, %errno, "apparmor transition refused");
        WardenError::ProfileApplyFailed {
            name: name.to_owned(),
            errno,
        }
    })?;
    tracing::info!(profile = name, "apparmor profile armed for exec");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[derive(Default)]
    struct RecordingTransition {
        calls: RefCell<Vec<String>>,
        fail_with: Option<i32>,
    }

    impl ProfileTransition for RecordingTransition {
        fn change_onexec(&self, name: &str) -> std::result::Result<(), Errno> {
            self.calls.borrow_mut().push(name.to_owned());
            self.fail_with.map_or(Ok(()), |code| Err(Errno(code)))
        }
    }

    #[test]
    fn empty_name_makes_no_calls() {
        let transition = RecordingTransition::default();
        apply_profile_with("", &transition).unwrap();
        assert!(transition.calls.borrow().is_empty());
    }

    #[test]
    fn named_profile_is_requested_once() {
        let transition = RecordingTransition::default();
        apply_profile_with("warden-default", &transition).unwrap();
        assert_eq!(*transition.calls.borrow(), ["warden-default"]);
    }

    #[test]
    fn refusal_carries_name_and_errno() {
        let transition = RecordingTransition {
            fail_with: Some(libc::EACCES),
            ..RecordingTransition::default()
        };
        match apply_profile_with("confined", &transition).unwrap_err() {
            WardenError::ProfileApplyFailed { name, errno } => {
                assert_eq!(name, "confined");
                assert_eq!(errno, Errno(libc::EACCES));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn proc_attr_writes_exec_command() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let attr = dir.path().join("apparmor-exec");
        std::fs::write(&attr, "").unwrap();
        let transition = ProcAttrTransition::with_attr_paths(&attr, dir.path().join("legacy"));

        transition.change_onexec("confined").unwrap();

        assert_eq!(std::fs::read_to_string(&attr).unwrap(), "exec confined");
    }

    #[test]
    fn proc_attr_falls_back_to_legacy_attribute() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let legacy = dir.path().join("exec");
        std::fs::write(&legacy, "").unwrap();
        let transition = ProcAttrTransition::with_attr_paths(dir.path().join("missing"), &legacy);

        transition.change_onexec("confined").unwrap();

        assert_eq!(std::fs::read_to_string(&legacy).unwrap(), "exec confined");
    }

    #[test]
    fn proc_attr_reports_errno_when_both_missing() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let transition =
            ProcAttrTransition::with_attr_paths(dir.path().join("a"), dir.path().join("b"));
        assert_eq!(
            transition.change_onexec("confined"),
            Err(Errno(libc::ENOENT))
        );
    }

    fn host_root(enabled_flag: Option<&str>, parser: bool) -> tempfile::TempDir {
        let root = tempfile::tempdir().expect("failed to create tempdir");
        std::fs::create_dir_all(root.path().join(APPARMOR_SECURITYFS)).unwrap();
        if parser {
            let parser_path = root.path().join(APPARMOR_PARSER);
            std::fs::create_dir_all(parser_path.parent().unwrap()).unwrap();
            std::fs::write(parser_path, "").unwrap();
        }
        if let Some(flag) = enabled_flag {
            let param = root.path().join(APPARMOR_ENABLED_PARAM);
            std::fs::create_dir_all(param.parent().unwrap()).unwrap();
            std::fs::write(param, flag).unwrap();
        }
        root
    }

    #[test]
    fn enabled_when_flag_starts_with_y() {
        let root = host_root(Some("Y\n"), true);
        assert!(is_enabled_in(root.path(), false));
    }

    #[test]
    fn disabled_inside_nested_container() {
        let root = host_root(Some("Y\n"), true);
        assert!(!is_enabled_in(root.path(), true));
    }

    #[test]
    fn disabled_when_flag_is_n_or_too_short() {
        assert!(!is_enabled_in(host_root(Some("N\n"), true).path(), false));
        assert!(!is_enabled_in(host_root(Some("Y"), true).path(), false));
        assert!(!is_enabled_in(host_root(None, true).path(), false));
    }

    #[test]
    fn disabled_without_parser_or_securityfs() {
        assert!(!is_enabled_in(host_root(Some("Y\n"), false).path(), false));
        let empty = tempfile::tempdir().expect("failed to create tempdir");
        assert!(!is_enabled_in(empty.path(), false));
    }

    #[cfg(feature = "libapparmor")]
    #[test]
    fn libapparmor_refusal_carries_kernel_errno() {
        let errno = LibAppArmor
            .change_onexec("warden-no-such-profile-7f3a")
            .unwrap_err();
        assert!(errno.0 > 0);
        assert_ne!(errno, Errno(libc::EIO));
    }
}
