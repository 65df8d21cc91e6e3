//! Linux capability management for least-privilege execution.
//!
//! Drops every capability from the bounding set except the allowlist, then
//! narrows the effective, permitted and inheritable sets to the same list
//! once the target identity is in place.

use warden_common::constants::CAP_LAST_CAP_PATH;
use warden_common::error::{Result, WardenError};
use warden_common::types::Capability;

use crate::system::raw_errno;

const LINUX_CAPABILITY_VERSION_3: u32 = 0x2008_0522;

#[repr(C)]
struct CapUserHeader {
    version: u32,
    pid: libc::c_int,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
struct CapUserData {
    effective: u32,
    permitted: u32,
    inheritable: u32,
}

/// Bit mask with one bit set per retained capability.
#[must_use]
pub fn capability_mask(keep: &[Capability]) -> u64 {
    keep.iter().fold(0, |mask, cap| mask | (1u64 << cap.number()))
}

/// Highest capability number the running kernel knows about.
///
/// # Errors
///
/// Returns [`WardenError::Io`] if the sysctl cannot be read, or
/// [`WardenError::Config`] if it does not hold a number.
pub fn last_capability() -> Result<u32> {
    let raw = std::fs::read_to_string(CAP_LAST_CAP_PATH).map_err(|e| WardenError::Io {
        path: CAP_LAST_CAP_PATH.into(),
        source: e,
    })?;
    raw.trim().parse().map_err(|_| WardenError::Config {
        message: format!("unexpected {CAP_LAST_CAP_PATH} content: {raw:?}"),
    })
}

/// Whether `cap` is set in `mask`. Numbers past the mask width never are.
fn is_retained(mask: u64, cap: u32) -> bool {
    1u64.checked_shl(cap).is_some_and(|bit| mask & bit != 0)
}

/// Removes every capability not in `keep` from the bounding set.
///
/// # Errors
///
/// Returns [`WardenError::PrctlFailed`] if `PR_CAPBSET_DROP` fails, or the
/// error from [`last_capability`].
pub fn drop_bounding_set(keep: &[Capability]) -> Result<()> {
    let mask = capability_mask(keep);
    let last = last_capability()?;
    for cap in (0..=last).filter(|&cap| !is_retained(mask, cap)) {
        // SAFETY: PR_CAPBSET_DROP takes the capability number by value.
        let rc = unsafe { libc::prctl(libc::PR_CAPBSET_DROP, libc::c_ulong::from(cap), 0, 0, 0) };
        if rc != 0 {
            return Err(WardenError::PrctlFailed {
                errno: raw_errno(nix::errno::Errno::last()),
            });
        }
    }
    tracing::debug!(retained = keep.len(), last, "bounding set dropped");
    Ok(())
}

/// Sets the effective, permitted and inheritable sets to exactly `keep`.
///
/// # Errors
///
/// Returns [`WardenError::CapabilityFailed`] if `capset(2)` fails.
pub fn drop_capabilities(keep: &[Capability]) -> Result<()> {
    let mask = capability_mask(keep);
    #[allow(clippy::cast_possible_truncation)]
    let words = [mask as u32, (mask >> 32) as u32];
    let mut header = CapUserHeader {
        version: LINUX_CAPABILITY_VERSION_3,
        pid: 0,
    };
    let data = words.map(|word| CapUserData {
        effective: word,
        permitted: word,
        inheritable: word,
    });
    // SAFETY: header and data are live, correctly laid out for the v3 ABI
    // (two data words), and only read by the kernel apart from the header's
    // version field.
    let rc = unsafe { libc::syscall(libc::SYS_capset, &raw mut header, data.as_ptr()) };
    if rc != 0 {
        return Err(WardenError::CapabilityFailed {
            errno: raw_errno(nix::errno::Errno::last()),
        });
    }
    tracing::info!(retained = keep.len(), "capabilities dropped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_sets_one_bit_per_capability() {
        assert_eq!(capability_mask(&[]), 0);
        assert_eq!(capability_mask(&[Capability::Chown]), 1);
        assert_eq!(
            capability_mask(&[Capability::Kill, Capability::Setfcap]),
            (1 << 5) | (1 << 31)
        );
    }

    #[test]
    fn duplicate_capabilities_collapse() {
        let keep = [Capability::NetBindService, Capability::NetBindService];
        assert_eq!(capability_mask(&keep), 1 << 10);
    }

    #[test]
    fn capabilities_past_mask_width_are_never_retained() {
        assert!(is_retained(1 << 21, 21));
        assert!(!is_retained(1 << 21, 22));
        assert!(!is_retained(u64::MAX, 64));
        assert!(!is_retained(u64::MAX, 200));
    }

    #[test]
    fn kernel_reports_last_capability() {
        let last = last_capability().unwrap();
        assert!(last >= Capability::Setfcap.number());
    }
}
