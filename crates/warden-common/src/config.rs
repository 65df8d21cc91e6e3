//! Init configuration handed over by the orchestration layer.
//!
//! The orchestrator serializes an [`InitConfig`] as JSON and writes it to
//! the init pipe; the freshly cloned process reads it back exactly once.

use std::io::Read;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WardenError};
use crate::types::{Capability, IdentitySpec, NamespaceDescriptor, ResourceLimit};

/// Everything the init sequence needs to turn this process into the
/// container's workload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitConfig {
    /// Argument vector. `args[0]` names the program, searched on `PATH`.
    pub args: Vec<String>,
    /// Environment as `KEY=VALUE` entries.
    pub env: Vec<String>,
    /// Resource limits applied before anything else.
    pub rlimits: Vec<ResourceLimit>,
    /// Existing namespaces to enter.
    pub namespaces: Vec<NamespaceDescriptor>,
    /// Credentials to switch to; `None` keeps the current ones.
    pub user: Option<IdentitySpec>,
    /// Capabilities to retain; `None` leaves the capability sets untouched.
    pub capabilities: Option<Vec<Capability>>,
    /// Working directory inside the container.
    pub cwd: Option<PathBuf>,
    /// Make stdin the controlling terminal.
    pub console: bool,
    /// Signal delivered when the parent dies; zero disables it.
    pub parent_death_signal: i32,
    /// AppArmor profile to transition into on exec; empty opts out.
    pub apparmor_profile: String,
    /// Security label for the exec'd program; empty skips labeling.
    pub process_label: String,
}

impl InitConfig {
    /// Creates a config for `args` that inherits the current environment.
    #[must_use]
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            env: std::env::vars().map(|(k, v)| format!("{k}={v}")).collect(),
            ..Self::default()
        }
    }

    /// Decodes a config from the init pipe and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`WardenError::Config`] if the payload is not valid JSON or
    /// fails [`InitConfig::validate`].
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let config: Self = serde_json::from_reader(reader).map_err(|e| WardenError::Config {
            message: format!("malformed init config: {e}"),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks invariants that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`WardenError::Config`] if the argument vector is empty or the
    /// parent-death signal is negative.
    pub fn validate(&self) -> Result<()> {
        if self.args.is_empty() {
            return Err(WardenError::Config {
                message: "argument vector is empty".into(),
            });
        }
        if self.parent_death_signal < 0 {
            return Err(WardenError::Config {
                message: format!("invalid parent death signal {}", self.parent_death_signal),
            });
        }
        Ok(())
    }

    /// Program name to resolve, i.e. `args[0]`.
    #[must_use]
    pub fn program(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }
}
