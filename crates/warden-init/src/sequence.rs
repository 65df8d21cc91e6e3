//! The ordered init sequence.
//!
//! Steps run exactly once, in [`InitStep::ORDER`], and the first failure
//! aborts the run with its error untouched. A failed run leaves the process
//! half-confined; the caller must terminate it rather than continue.

use std::convert::Infallible;
use std::fmt;

use warden_common::config::InitConfig;
use warden_common::error::{Result, WardenError};
use warden_core::apparmor;
use warden_core::system::resolve_executable;

use crate::platform::InitPlatform;

/// One stage of the init sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InitStep {
    /// Apply every resource limit.
    SetLimits,
    /// Enter namespaces, switch identity, drop capabilities, change directory.
    FinalizeNamespace,
    /// Arm the AppArmor transition for the next exec.
    ApplySecurityProfile,
    /// Hand the security label to the labeling subsystem.
    SetSecurityLabel,
    /// Replace the process image.
    Exec,
}

impl InitStep {
    /// Execution order.
    pub const ORDER: [Self; 5] = [
        Self::SetLimits,
        Self::FinalizeNamespace,
        Self::ApplySecurityProfile,
        Self::SetSecurityLabel,
        Self::Exec,
    ];
}

impl fmt::Display for InitStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SetLimits => "set-limits",
            Self::FinalizeNamespace => "finalize-namespace",
            Self::ApplySecurityProfile => "apply-security-profile",
            Self::SetSecurityLabel => "set-security-label",
            Self::Exec => "exec",
        };
        f.write_str(name)
    }
}

/// Init for a process joining an existing container.
///
/// Borrows the config for a single [`SetnsInit::run`], which consumes the
/// initializer so the sequence cannot be restarted.
#[derive(Debug)]
pub struct SetnsInit<'a, P> {
    config: &'a InitConfig,
    platform: P,
}

impl<'a, P: InitPlatform> SetnsInit<'a, P> {
    /// Prepares a run of `config` on `platform`.
    pub const fn new(config: &'a InitConfig, platform: P) -> Self {
        Self { config, platform }
    }

    /// Runs every step and execs the container program.
    ///
    /// Only returns on failure.
    ///
    /// # Errors
    ///
    /// Returns `Config` for an invalid config, otherwise the first failing
    /// step's error exactly as the step produced it.
    pub fn run(self) -> Result<Infallible> {
        self.config.validate()?;
        self.step(InitStep::SetLimits, || self.set_limits())?;
        self.step(InitStep::FinalizeNamespace, || {
            self.platform.finalize_namespace(self.config)
        })?;
        self.step(InitStep::ApplySecurityProfile, || {
            apparmor::apply_profile_with(&self.config.apparmor_profile, &self.platform)
        })?;
        self.step(InitStep::SetSecurityLabel, || self.set_label())?;
        self.step(InitStep::Exec, || self.exec())
    }

    fn step<T>(&self, step: InitStep, action: impl FnOnce() -> Result<T>) -> Result<T> {
        tracing::info!(%step, "init step");
        action().inspect_err(|e| tracing::error!(%step, error = %e, "init step failed"))
    }

    fn set_limits(&self) -> Result<()> {
        self.config
            .rlimits
            .iter()
            .try_for_each(|limit| self.platform.set_rlimit(limit))
    }

    fn set_label(&self) -> Result<()> {
        if self.config.process_label.is_empty() {
            return Ok(());
        }
        self.platform.set_process_label(&self.config.process_label)
    }

    fn exec(&self) -> Result<Infallible> {
        let program = self.config.program().ok_or_else(|| WardenError::Config {
            message: "argument vector is empty".into(),
        })?;
        let path = resolve_executable(program)?;
        self.platform
            .execve(&path, &self.config.args, &self.config.env)
    }
}
