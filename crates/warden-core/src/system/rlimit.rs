//! Resource limits via `setrlimit(2)`.

use nix::sys::resource::{Resource, setrlimit};
use warden_common::error::{Result, WardenError};
use warden_common::types::{ResourceLimit, RlimitKind};

use super::raw_errno;

/// Maps a limit kind to the nix resource identifier.
#[must_use]
pub const fn resource(kind: RlimitKind) -> Resource {
    match kind {
        RlimitKind::As => Resource::RLIMIT_AS,
        RlimitKind::Core => Resource::RLIMIT_CORE,
        RlimitKind::Cpu => Resource::RLIMIT_CPU,
        RlimitKind::Data => Resource::RLIMIT_DATA,
        RlimitKind::Fsize => Resource::RLIMIT_FSIZE,
        RlimitKind::Locks => Resource::RLIMIT_LOCKS,
        RlimitKind::Memlock => Resource::RLIMIT_MEMLOCK,
        RlimitKind::Msgqueue => Resource::RLIMIT_MSGQUEUE,
        RlimitKind::Nice => Resource::RLIMIT_NICE,
        RlimitKind::Nofile => Resource::RLIMIT_NOFILE,
        RlimitKind::Nproc => Resource::RLIMIT_NPROC,
        RlimitKind::Rss => Resource::RLIMIT_RSS,
        RlimitKind::Rtprio => Resource::RLIMIT_RTPRIO,
        RlimitKind::Rttime => Resource::RLIMIT_RTTIME,
        RlimitKind::Sigpending => Resource::RLIMIT_SIGPENDING,
        RlimitKind::Stack => Resource::RLIMIT_STACK,
    }
}

/// Applies one soft/hard limit pair to the calling process.
///
/// # Errors
///
/// Returns [`WardenError::LimitSetFailed`] naming the resource if the
/// kernel rejects the values.
pub fn set_rlimit(limit: &ResourceLimit) -> Result<()> {
    setrlimit(resource(limit.kind()), limit.soft(), limit.hard()).map_err(|e| {
        WardenError::LimitSetFailed {
            kind: limit.kind(),
            errno: raw_errno(e),
        }
    })?;
    tracing::debug!(
        kind = %limit.kind(),
        soft = limit.soft(),
        hard = limit.hard(),
        "resource limit set"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use nix::sys::resource::getrlimit;

    use super::*;

    #[test]
    fn reapplying_current_limit_succeeds() {
        let (soft, hard) = getrlimit(Resource::RLIMIT_NOFILE).unwrap();
        let limit = ResourceLimit::new(RlimitKind::Nofile, soft, hard).unwrap();
        set_rlimit(&limit).unwrap();
        assert_eq!(getrlimit(Resource::RLIMIT_NOFILE).unwrap(), (soft, hard));
    }

    #[test]
    fn raising_hard_limit_without_privilege_names_resource() {
        if nix::unistd::geteuid().is_root() {
            return;
        }
        let (soft, hard) = getrlimit(Resource::RLIMIT_NOFILE).unwrap();
        if hard == libc::RLIM_INFINITY {
            return;
        }
        let limit = ResourceLimit::new(RlimitKind::Nofile, soft, hard + 1).unwrap();
        match set_rlimit(&limit).unwrap_err() {
            WardenError::LimitSetFailed { kind, errno } => {
                assert_eq!(kind, RlimitKind::Nofile);
                assert_eq!(errno.0, libc::EPERM);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
