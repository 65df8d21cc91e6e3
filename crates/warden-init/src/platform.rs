//! OS bindings for each init step.
//!
//! [`InitPlatform`] is the seam between the ordered sequence and the
//! kernel; [`LinuxPlatform`] wires every step to the real primitives.

use std::convert::Infallible;
use std::path::Path;

use warden_common::config::InitConfig;
use warden_common::error::{Errno, Result};
use warden_common::types::ResourceLimit;
use warden_core::apparmor::{DefaultTransition, ProfileTransition};
use warden_core::label::{ProcAttrLabeler, ProcessLabeler};
use warden_core::system::{self, LinuxProcessControl};

/// Primitives the init sequence drives, one per step.
///
/// AppArmor transitions and security labels come from the supertraits.
pub trait InitPlatform: ProfileTransition + ProcessLabeler {
    /// Applies one resource limit.
    ///
    /// # Errors
    ///
    /// Returns `LimitSetFailed` naming the resource.
    fn set_rlimit(&self, limit: &ResourceLimit) -> Result<()>;

    /// Enters namespaces, switches identity, drops capabilities and changes
    /// directory. Either completes fully or fails.
    ///
    /// # Errors
    ///
    /// Returns the first failing sub-operation's error.
    fn finalize_namespace(&self, config: &InitConfig) -> Result<()>;

    /// Replaces the process image. Never returns on success.
    ///
    /// # Errors
    ///
    /// Returns `ExecFailed` with the image left unchanged.
    fn execve(&self, path: &Path, args: &[String], env: &[String]) -> Result<Infallible>;
}

/// [`InitPlatform`] backed by the running Linux kernel.
#[derive(Debug, Default)]
pub struct LinuxPlatform {
    transition: DefaultTransition,
    labeler: ProcAttrLabeler,
    control: LinuxProcessControl,
}

impl LinuxPlatform {
    /// Platform with the build's default AppArmor backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProfileTransition for LinuxPlatform {
    fn change_onexec(&self, name: &str) -> std::result::Result<(), Errno> {
        self.transition.change_onexec(name)
    }
}

impl ProcessLabeler for LinuxPlatform {
    fn set_process_label(&self, label: &str) -> Result<()> {
        self.labeler.set_process_label(label)
    }
}

impl InitPlatform for LinuxPlatform {
    fn set_rlimit(&self, limit: &ResourceLimit) -> Result<()> {
        system::set_rlimit(limit)
    }

    fn finalize_namespace(&self, config: &InitConfig) -> Result<()> {
        crate::finalize::finalize_namespace(config, &self.control)
    }

    fn execve(&self, path: &Path, args: &[String], env: &[String]) -> Result<Infallible> {
        system::execve_resolved(path, args, env)
    }
}
