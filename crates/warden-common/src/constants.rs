//! Well-known host paths and fixed values.

/// Mount point of the process information pseudo-filesystem.
pub const PROC_ROOT: &str = "/proc";

/// 1-indexed position of `starttime` in `/proc/<pid>/stat`, per `proc(5)`.
pub const STAT_START_TIME_FIELD: usize = 22;

/// Kernel sysctl holding the highest capability number.
pub const CAP_LAST_CAP_PATH: &str = "/proc/sys/kernel/cap_last_cap";

/// AppArmor securityfs directory; present when the LSM is loaded.
pub const APPARMOR_SECURITYFS: &str = "sys/kernel/security/apparmor";

/// AppArmor policy loader binary.
pub const APPARMOR_PARSER: &str = "sbin/apparmor_parser";

/// Module parameter reporting whether AppArmor is enabled (`Y`/`N`).
pub const APPARMOR_ENABLED_PARAM: &str = "sys/module/apparmor/parameters/enabled";

/// Global AppArmor tunables, relative to the host root.
pub const APPARMOR_TUNABLES: &str = "etc/apparmor.d/tunables/global";

/// Base AppArmor abstractions, relative to the host root.
pub const APPARMOR_ABSTRACTIONS_BASE: &str = "etc/apparmor.d/abstractions/base";

/// Per-thread AppArmor exec attribute (stacked LSM interface).
pub const APPARMOR_EXEC_ATTR: &str = "/proc/thread-self/attr/apparmor/exec";

/// Legacy per-thread exec attribute shared by all LSMs.
pub const LSM_EXEC_ATTR: &str = "/proc/thread-self/attr/exec";

/// Name of the profile generated when the caller does not pick one.
pub const DEFAULT_PROFILE_NAME: &str = "warden-default";

/// Environment variable set by container managers inside a container.
pub const CONTAINER_ENV_VAR: &str = "container";
