//! Namespace and identity finalization, the second init step.

use warden_common::config::InitConfig;
use warden_common::error::{Result, WardenError};
use warden_core::system::{self, ParentDeathSignal, ProcessControl};
use warden_core::{capability, identity, namespace};

/// Completes the move into the container.
///
/// Order: enter namespaces, re-assert the parent-death signal, take the
/// controlling terminal, shrink the bounding set, switch identity with
/// keep-capabilities held, drop to the final capability set, re-assert the
/// parent-death signal (credential changes clear it), change directory.
///
/// # Errors
///
/// Returns the first failing sub-operation's error unchanged.
pub fn finalize_namespace(config: &InitConfig, ctl: &impl ProcessControl) -> Result<()> {
    let pdeath = ParentDeathSignal(config.parent_death_signal);

    namespace::join_namespaces(&config.namespaces)?;
    pdeath.restore_with(ctl)?;

    if config.console {
        system::set_controlling_terminal()?;
    }

    if let Some(keep) = &config.capabilities {
        capability::drop_bounding_set(keep)?;
    }
    if let Some(user) = &config.user {
        system::set_keep_caps()?;
        identity::set_identity(user)?;
        system::clear_keep_caps()?;
    }
    if let Some(keep) = &config.capabilities {
        capability::drop_capabilities(keep)?;
    }
    pdeath.restore_with(ctl)?;

    if let Some(cwd) = &config.cwd {
        nix::unistd::chdir(cwd).map_err(|e| WardenError::Io {
            path: cwd.clone(),
            source: e.into(),
        })?;
    }
    tracing::debug!(
        namespaces = config.namespaces.len(),
        user = config.user.is_some(),
        "namespace finalized"
    );
    Ok(())
}
