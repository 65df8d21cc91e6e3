//! Domain primitive types used across the Warden workspace.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WardenError};

/// Resource controlled by `setrlimit(2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RlimitKind {
    /// Address space size.
    As,
    /// Core file size.
    Core,
    /// CPU time in seconds.
    Cpu,
    /// Data segment size.
    Data,
    /// Size of files the process may create.
    Fsize,
    /// Number of file locks.
    Locks,
    /// Bytes that may be locked into memory.
    Memlock,
    /// Bytes in POSIX message queues.
    Msgqueue,
    /// Ceiling for the nice value.
    Nice,
    /// Open file descriptors.
    Nofile,
    /// Processes for the real user ID.
    Nproc,
    /// Resident set size.
    Rss,
    /// Ceiling for the real-time priority.
    Rtprio,
    /// Real-time CPU time in microseconds.
    Rttime,
    /// Queued signals.
    Sigpending,
    /// Stack size.
    Stack,
}

impl RlimitKind {
    /// Returns the kernel constant name, e.g. `RLIMIT_NOFILE`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::As => "RLIMIT_AS",
            Self::Core => "RLIMIT_CORE",
            Self::Cpu => "RLIMIT_CPU",
            Self::Data => "RLIMIT_DATA",
            Self::Fsize => "RLIMIT_FSIZE",
            Self::Locks => "RLIMIT_LOCKS",
            Self::Memlock => "RLIMIT_MEMLOCK",
            Self::Msgqueue => "RLIMIT_MSGQUEUE",
            Self::Nice => "RLIMIT_NICE",
            Self::Nofile => "RLIMIT_NOFILE",
            Self::Nproc => "RLIMIT_NPROC",
            Self::Rss => "RLIMIT_RSS",
            Self::Rtprio => "RLIMIT_RTPRIO",
            Self::Rttime => "RLIMIT_RTTIME",
            Self::Sigpending => "RLIMIT_SIGPENDING",
            Self::Stack => "RLIMIT_STACK",
        }
    }
}

impl fmt::Display for RlimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A soft/hard limit pair for one resource.
///
/// Construction goes through [`ResourceLimit::new`], so `soft <= hard`
/// holds for every value, including deserialized ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawResourceLimit")]
pub struct ResourceLimit {
    kind: RlimitKind,
    soft: u64,
    hard: u64,
}

impl ResourceLimit {
    /// Creates a limit, rejecting a soft value above the hard value.
    ///
    /// # Errors
    ///
    /// Returns [`WardenError::Config`] if `soft > hard`.
    pub fn new(kind: RlimitKind, soft: u64, hard: u64) -> Result<Self> {
        if soft > hard {
            return Err(WardenError::Config {
                message: format!("{kind} soft limit {soft} exceeds hard limit {hard}"),
            });
        }
        Ok(Self { kind, soft, hard })
    }

    /// Resource this limit applies to.
    #[must_use]
    pub const fn kind(&self) -> RlimitKind {
        self.kind
    }

    /// Soft (current) limit.
    #[must_use]
    pub const fn soft(&self) -> u64 {
        self.soft
    }

    /// Hard (maximum) limit.
    #[must_use]
    pub const fn hard(&self) -> u64 {
        self.hard
    }
}

#[derive(Deserialize)]
struct RawResourceLimit {
    kind: RlimitKind,
    soft: u64,
    hard: u64,
}

impl TryFrom<RawResourceLimit> for ResourceLimit {
    type Error = WardenError;

    fn try_from(raw: RawResourceLimit) -> Result<Self> {
        Self::new(raw.kind, raw.soft, raw.hard)
    }
}

/// Linux namespace types that can be joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamespaceKind {
    /// Cgroup root directory.
    Cgroup,
    /// System V IPC and POSIX message queues.
    Ipc,
    /// Mount table.
    #[serde(rename = "mnt", alias = "mount")]
    Mount,
    /// Network stack.
    #[serde(rename = "net", alias = "network")]
    Network,
    /// Process ID space.
    Pid,
    /// User and group ID mappings.
    User,
    /// Hostname and domain name.
    Uts,
}

impl fmt::Display for NamespaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Cgroup => "cgroup",
            Self::Ipc => "ipc",
            Self::Mount => "mnt",
            Self::Network => "net",
            Self::Pid => "pid",
            Self::User => "user",
            Self::Uts => "uts",
        };
        f.write_str(name)
    }
}

/// An existing namespace to enter, usually `/proc/<pid>/ns/<kind>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceDescriptor {
    /// Namespace type, passed to `setns(2)` as the expected kind.
    pub kind: NamespaceKind,
    /// Path to the namespace file.
    pub path: PathBuf,
}

/// Target credentials for the container process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentitySpec {
    /// Real, effective and saved user ID.
    pub uid: u32,
    /// Real, effective and saved group ID.
    pub gid: u32,
    /// Supplementary groups.
    #[serde(default)]
    pub additional_gids: Vec<u32>,
}

/// Linux capability identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Capability {
    /// Allow setting file ownership.
    Chown,
    /// Bypass file read, write and execute permission checks.
    DacOverride,
    /// Bypass permission checks on operations that require the file owner.
    Fowner,
    /// Keep set-user-ID bits when a file is modified.
    Fsetid,
    /// Allow sending signals to arbitrary processes.
    Kill,
    /// Allow setting group IDs.
    Setgid,
    /// Allow setting user IDs.
    Setuid,
    /// Allow modifying capability sets of the process.
    Setpcap,
    /// Allow binding to privileged ports (< 1024).
    NetBindService,
    /// Allow raw and packet sockets.
    NetRaw,
    /// Allow `chroot(2)`.
    SysChroot,
    /// Broad system administration.
    SysAdmin,
    /// Allow creating special files with `mknod(2)`.
    Mknod,
    /// Allow writing the kernel audit log.
    AuditWrite,
    /// Allow setting file capabilities.
    Setfcap,
}

impl Capability {
    /// Kernel capability number from `linux/capability.h`.
    #[must_use]
    pub const fn number(self) -> u32 {
        match self {
            Self::Chown => 0,
            Self::DacOverride => 1,
            Self::Fowner => 3,
            Self::Fsetid => 4,
            Self::Kill => 5,
            Self::Setgid => 6,
            Self::Setuid => 7,
            Self::Setpcap => 8,
            Self::NetBindService => 10,
            Self::NetRaw => 13,
            Self::SysChroot => 18,
            Self::SysAdmin => 21,
            Self::Mknod => 27,
            Self::AuditWrite => 29,
            Self::Setfcap => 31,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_limit_rejects_soft_above_hard() {
        let err = ResourceLimit::new(RlimitKind::Nofile, 4096, 1024).unwrap_err();
        assert!(matches!(err, WardenError::Config { .. }));
    }

    #[test]
    fn resource_limit_accepts_equal_bounds() {
        let limit = ResourceLimit::new(RlimitKind::Nproc, 64, 64).unwrap();
        assert_eq!(limit.soft(), limit.hard());
    }

    #[test]
    fn deserialized_limit_is_checked() {
        let bad = r#"{"kind":"NOFILE","soft":10,"hard":1}"#;
        assert!(serde_json::from_str::<ResourceLimit>(bad).is_err());

        let good = r#"{"kind":"NOFILE","soft":1024,"hard":4096}"#;
        let limit: ResourceLimit = serde_json::from_str(good).unwrap();
        assert_eq!(limit.kind(), RlimitKind::Nofile);
        assert_eq!(limit.soft(), 1024);
        assert_eq!(limit.hard(), 4096);
    }

    #[test]
    fn namespace_kind_displays_proc_name() {
        assert_eq!(NamespaceKind::Mount.to_string(), "mnt");
        assert_eq!(NamespaceKind::Network.to_string(), "net");
    }

    #[test]
    fn namespace_kind_wire_name_matches_proc_name() {
        let all = [
            NamespaceKind::Cgroup,
            NamespaceKind::Ipc,
            NamespaceKind::Mount,
            NamespaceKind::Network,
            NamespaceKind::Pid,
            NamespaceKind::User,
            NamespaceKind::Uts,
        ];
        for kind in all {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
            let back: NamespaceKind = serde_json::from_str(&json).unwrap();
            assert_eq!(back, kind);
        }
    }

    #[test]
    fn namespace_kind_accepts_long_names() {
        let mount: NamespaceKind = serde_json::from_str("\"mount\"").unwrap();
        let network: NamespaceKind = serde_json::from_str("\"network\"").unwrap();
        assert_eq!(mount, NamespaceKind::Mount);
        assert_eq!(network, NamespaceKind::Network);
    }

    #[test]
    fn capability_numbers_match_kernel_header() {
        assert_eq!(Capability::Chown.number(), 0);
        assert_eq!(Capability::NetBindService.number(), 10);
        assert_eq!(Capability::SysAdmin.number(), 21);
        assert_eq!(Capability::Setfcap.number(), 31);
    }
}
