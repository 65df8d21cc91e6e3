//! Credential switching for the container process.

use nix::unistd::{Gid, Uid, setgroups, setresgid, setresuid};
use warden_common::error::{Result, WardenError};
use warden_common::types::IdentitySpec;

use crate::system::raw_errno;

/// Switches supplementary groups, GID and UID, in that order.
///
/// Groups go first because dropping the UID removes the right to change
/// them.
///
/// # Errors
///
/// Returns [`WardenError::SetIdentityFailed`] on the first failing call.
pub fn set_identity(spec: &IdentitySpec) -> Result<()> {
    let fail = |e| WardenError::SetIdentityFailed { errno: raw_errno(e) };

    let groups: Vec<Gid> = spec.additional_gids.iter().copied().map(Gid::from_raw).collect();
    setgroups(&groups).map_err(fail)?;

    let gid = Gid::from_raw(spec.gid);
    setresgid(gid, gid, gid).map_err(fail)?;

    let uid = Uid::from_raw(spec.uid);
    setresuid(uid, uid, uid).map_err(fail)?;

    tracing::info!(uid = spec.uid, gid = spec.gid, groups = groups.len(), "identity set");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unprivileged_switch_to_root_fails() {
        if nix::unistd::geteuid().is_root() {
            return;
        }
        let err = set_identity(&IdentitySpec::default()).unwrap_err();
        assert!(matches!(err, WardenError::SetIdentityFailed { .. }));
    }
}
