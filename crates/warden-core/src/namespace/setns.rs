//! Architecture-aware `setns(2)`.
//!
//! The call number differs per architecture. Each supported target is a
//! [`Platform`] variant; anything else fails with `UnsupportedPlatform`
//! instead of guessing a number.

use std::fmt;

use warden_common::error::{Result, WardenError};

/// (OS, architecture) pairs with a known `setns(2)` call number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// 32-bit x86.
    LinuxX86,
    /// x86-64.
    LinuxX86_64,
    /// 32-bit ARM.
    LinuxArm,
    /// 64-bit ARM.
    LinuxAarch64,
    /// 32-bit big-endian PowerPC.
    LinuxPowerpc,
    /// 64-bit big-endian PowerPC.
    LinuxPowerpc64,
    /// 64-bit little-endian PowerPC.
    LinuxPowerpc64le,
    /// IBM Z.
    LinuxS390x,
}

impl Platform {
    /// Every supported platform.
    pub const ALL: [Self; 8] = [
        Self::LinuxX86,
        Self::LinuxX86_64,
        Self::LinuxArm,
        Self::LinuxAarch64,
        Self::LinuxPowerpc,
        Self::LinuxPowerpc64,
        Self::LinuxPowerpc64le,
        Self::LinuxS390x,
    ];

    /// The platform this binary was compiled for, if supported.
    #[must_use]
    pub const fn current() -> Option<Self> {
        if cfg!(not(target_os = "linux")) {
            None
        } else if cfg!(target_arch = "x86") {
            Some(Self::LinuxX86)
        } else if cfg!(all(target_arch = "x86_64", target_pointer_width = "64")) {
            Some(Self::LinuxX86_64)
        } else if cfg!(target_arch = "arm") {
            Some(Self::LinuxArm)
        } else if cfg!(target_arch = "aarch64") {
            Some(Self::LinuxAarch64)
        } else if cfg!(target_arch = "powerpc") {
            Some(Self::LinuxPowerpc)
        } else if cfg!(all(target_arch = "powerpc64", target_endian = "big")) {
            Some(Self::LinuxPowerpc64)
        } else if cfg!(all(target_arch = "powerpc64", target_endian = "little")) {
            Some(Self::LinuxPowerpc64le)
        } else if cfg!(target_arch = "s390x") {
            Some(Self::LinuxS390x)
        } else {
            None
        }
    }

    /// Resolves an (OS, architecture) pair as named by [`Platform::pair`].
    ///
    /// # Errors
    ///
    /// Returns [`WardenError::UnsupportedPlatform`] naming the pair when it
    /// has no table entry.
    pub fn from_pair(os: &str, arch: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.pair() == (os, arch))
            .ok_or_else(|| WardenError::UnsupportedPlatform {
                os: os.to_owned(),
                arch: arch.to_owned(),
            })
    }

    /// Returns the `(os, arch)` names of this platform.
    #[must_use]
    pub const fn pair(self) -> (&'static str, &'static str) {
        match self {
            Self::LinuxX86 => ("linux", "x86"),
            Self::LinuxX86_64 => ("linux", "x86_64"),
            Self::LinuxArm => ("linux", "arm"),
            Self::LinuxAarch64 => ("linux", "aarch64"),
            Self::LinuxPowerpc => ("linux", "powerpc"),
            Self::LinuxPowerpc64 => ("linux", "powerpc64"),
            Self::LinuxPowerpc64le => ("linux", "powerpc64le"),
            Self::LinuxS390x => ("linux", "s390x"),
        }
    }

    /// `setns(2)` system call number on this platform.
    #[must_use]
    pub const fn setns_syscall(self) -> i64 {
        match self {
            Self::LinuxX86 => 346,
            Self::LinuxX86_64 => 308,
            Self::LinuxArm => 375,
            Self::LinuxAarch64 => 268,
            Self::LinuxPowerpc | Self::LinuxPowerpc64 | Self::LinuxPowerpc64le => 350,
            Self::LinuxS390x => 339,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (os, arch) = self.pair();
        write!(f, "{os}/{arch}")
    }
}

/// Returns the current platform or the error naming the running pair.
///
/// # Errors
///
/// Returns [`WardenError::UnsupportedPlatform`] when the compile target has
/// no table entry.
pub fn current_platform() -> Result<Platform> {
    Platform::current().ok_or_else(|| WardenError::UnsupportedPlatform {
        os: std::env::consts::OS.to_owned(),
        arch: std::env::consts::ARCH.to_owned(),
    })
}

/// Reports the `setns(2)` call number for diagnostics without joining.
///
/// # Errors
///
/// Returns [`WardenError::UnsupportedPlatform`] on unsupported targets.
pub fn setns_syscall() -> Result<i64> {
    current_platform().map(Platform::setns_syscall)
}

/// Moves the calling thread into the namespace referred to by `fd`.
///
/// `flags` restricts the namespace type the descriptor must refer to; an
/// empty set accepts any type.
///
/// # Errors
///
/// Returns [`WardenError::UnsupportedPlatform`] if the call number is
/// unknown, or [`WardenError::NamespaceJoinFailed`] if the kernel refuses.
#[cfg(target_os = "linux")]
pub fn join_namespace(
    fd: std::os::fd::BorrowedFd<'_>,
    flags: nix::sched::CloneFlags,
) -> Result<()> {
    use std::os::fd::AsRawFd;

    use nix::errno::Errno;

    let nr = setns_syscall()?;
    // SAFETY: setns takes an fd and an int; `fd` is borrowed for the call's
    // duration and no pointers are passed.
    let rc = unsafe { libc::syscall(nr as libc::c_long, fd.as_raw_fd(), flags.bits()) };
    if rc != 0 {
        let errno = Errno::last();
        tracing::warn!(fd = fd.as_raw_fd(), nr, %errno, "setns failed");
        return Err(WardenError::NamespaceJoinFailed {
            errno: crate::system::raw_errno(errno),
        });
    }
    tracing::debug!(fd = fd.as_raw_fd(), nr, "joined namespace");
    Ok(())
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns [`WardenError::UnsupportedPlatform`].
#[cfg(not(target_os = "linux"))]
pub fn join_namespace<F>(_fd: F, _flags: i32) -> Result<()> {
    current_platform().map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_supported_pair_resolves_to_positive_number() {
        for platform in Platform::ALL {
            let (os, arch) = platform.pair();
            let resolved = Platform::from_pair(os, arch).unwrap();
            assert_eq!(resolved, platform);
            assert!(resolved.setns_syscall() > 0, "{platform}");
        }
    }

    #[test]
    fn unsupported_pairs_fail_naming_the_pair() {
        for (os, arch) in [
            ("linux", "riscv64"),
            ("linux", "mips"),
            ("freebsd", "x86_64"),
            ("macos", "aarch64"),
            ("linux", ""),
        ] {
            match Platform::from_pair(os, arch) {
                Err(WardenError::UnsupportedPlatform { os: o, arch: a }) => {
                    assert_eq!((o.as_str(), a.as_str()), (os, arch));
                }
                other => panic!("expected UnsupportedPlatform for {os}/{arch}, got {other:?}"),
            }
        }
    }

    #[test]
    fn table_matches_known_numbers() {
        assert_eq!(Platform::LinuxX86_64.setns_syscall(), 308);
        assert_eq!(Platform::LinuxAarch64.setns_syscall(), 268);
        assert_eq!(Platform::LinuxX86.setns_syscall(), 346);
        assert_eq!(Platform::LinuxArm.setns_syscall(), 375);
        assert_eq!(Platform::LinuxS390x.setns_syscall(), 339);
        assert_eq!(Platform::LinuxPowerpc64le.setns_syscall(), 350);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn current_platform_agrees_with_libc() {
        if let Some(platform) = Platform::current() {
            assert_eq!(platform.setns_syscall(), i64::from(libc::SYS_setns));
            assert_eq!(setns_syscall().unwrap(), platform.setns_syscall());
        } else {
            assert!(matches!(
                setns_syscall(),
                Err(WardenError::UnsupportedPlatform { .. })
            ));
        }
    }

    #[cfg(all(target_arch = "x86_64", target_pointer_width = "32"))]
    #[test]
    fn x32_abi_is_unsupported() {
        assert_eq!(Platform::current(), None);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn join_with_non_namespace_fd_reports_errno() {
        use std::os::fd::AsFd;

        if Platform::current().is_none() {
            return;
        }
        let file = std::fs::File::open("/dev/null").unwrap();
        let err = join_namespace(file.as_fd(), nix::sched::CloneFlags::CLONE_NEWNET).unwrap_err();
        match err {
            WardenError::NamespaceJoinFailed { errno } => assert_ne!(errno.0, 0),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
