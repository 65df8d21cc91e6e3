//! Namespace membership for the container process.
//!
//! Wraps `setns(2)` behind [`setns::join_namespace`] and provides the
//! descriptor-driven entry used by the init sequence.

pub mod setns;

pub use setns::{Platform, current_platform, join_namespace, setns_syscall};

#[cfg(target_os = "linux")]
use warden_common::error::{Result, WardenError};
#[cfg(target_os = "linux")]
use warden_common::types::{NamespaceDescriptor, NamespaceKind};

/// Maps a namespace kind to the `CLONE_NEW*` flag `setns(2)` checks against.
#[cfg(target_os = "linux")]
#[must_use]
pub const fn clone_flag(kind: NamespaceKind) -> nix::sched::CloneFlags {
    use nix::sched::CloneFlags;

    match kind {
        NamespaceKind::Cgroup => CloneFlags::CLONE_NEWCGROUP,
        NamespaceKind::Ipc => CloneFlags::CLONE_NEWIPC,
        NamespaceKind::Mount => CloneFlags::CLONE_NEWNS,
        NamespaceKind::Network => CloneFlags::CLONE_NEWNET,
        NamespaceKind::Pid => CloneFlags::CLONE_NEWPID,
        NamespaceKind::User => CloneFlags::CLONE_NEWUSER,
        NamespaceKind::Uts => CloneFlags::CLONE_NEWUTS,
    }
}

/// Enters every namespace in `descriptors`.
///
/// All namespace files are opened before the first join, since joining the
/// mount namespace changes what the remaining paths resolve to. The user
/// namespace is joined first so the rest are entered with its privileges.
///
/// # Errors
///
/// Returns [`WardenError::Io`] if a namespace file cannot be opened, or the
/// first join error unchanged.
#[cfg(target_os = "linux")]
pub fn join_namespaces(descriptors: &[NamespaceDescriptor]) -> Result<()> {
    use std::os::fd::AsFd;

    let mut opened = Vec::with_capacity(descriptors.len());
    for desc in descriptors {
        let file = std::fs::File::open(&desc.path).map_err(|e| WardenError::Io {
            path: desc.path.clone(),
            source: e,
        })?;
        opened.push((desc, file));
    }
    opened.sort_by_key(|(desc, _)| desc.kind != NamespaceKind::User);

    for (desc, file) in &opened {
        join_namespace(file.as_fd(), clone_flag(desc.kind))?;
        tracing::debug!(kind = %desc.kind, path = %desc.path.display(), "entered namespace");
    }
    Ok(())
}
