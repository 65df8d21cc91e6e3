//! Default AppArmor profile generation.
//!
//! The rule body is a compiled-in constant. Only the preamble varies, based
//! on whether the host ships the global tunables and the base abstraction.

use std::fmt::{self, Write as _};
use std::path::{Path, PathBuf};

use warden_common::constants::{
    APPARMOR_ABSTRACTIONS_BASE, APPARMOR_TUNABLES, DEFAULT_PROFILE_NAME,
};
use warden_common::error::{Result, WardenError};

const TUNABLES_IMPORT: &str = "#include <tunables/global>";
const PROC_PREFIX_DEFINITION: &str = "@{PROC}=/proc/";
const ABSTRACTIONS_IMPORT: &str = "#include <abstractions/base>";

const PROFILE_BODY: &str = "\
  network,
  capability,
  file,
  umount,

  deny @{PROC}/sys/fs/** wklx,
  deny @{PROC}/sysrq-trigger rwklx,
  deny @{PROC}/mem rwklx,
  deny @{PROC}/kmem rwklx,
  deny @{PROC}/sys/kernel/[^s][^h][^m]* wklx,
  deny @{PROC}/sys/kernel/*/** wklx,

  deny mount,

  deny /sys/[^f]*/** wklx,
  deny /sys/f[^s]*/** wklx,
  deny /sys/fs/[^c]*/** wklx,
  deny /sys/fs/c[^g]*/** wklx,
  deny /sys/fs/cg[^r]*/** wklx,
  deny /sys/firmware/efi/efivars/** rwklx,
  deny /sys/kernel/security/** rwklx,
";

/// Host capabilities that shape the profile preamble.
pub trait HostProbe {
    /// Whether `tunables/global` is installed.
    fn has_tunables(&self) -> bool;

    /// Whether `abstractions/base` is installed.
    fn has_base_abstractions(&self) -> bool;
}

/// Probes the AppArmor configuration tree under a host root.
#[derive(Debug, Clone)]
pub struct FsHostProbe {
    root: PathBuf,
}

impl FsHostProbe {
    /// Probe rooted at `root` instead of `/`.
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Default for FsHostProbe {
    fn default() -> Self {
        Self::with_root("/")
    }
}

impl HostProbe for FsHostProbe {
    fn has_tunables(&self) -> bool {
        self.root.join(APPARMOR_TUNABLES).exists()
    }

    fn has_base_abstractions(&self) -> bool {
        self.root.join(APPARMOR_ABSTRACTIONS_BASE).exists()
    }
}

/// Inputs of a rendered profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSpec {
    /// Profile name, referenced later by the enforcer.
    pub name: String,
    /// Import `tunables/global` instead of defining `@{PROC}` inline.
    pub tunables: bool,
    /// Import `abstractions/base` inside the profile block.
    pub base_abstractions: bool,
}

impl ProfileSpec {
    /// Builds the spec for `name` from what `probe` finds on the host.
    #[must_use]
    pub fn probe(name: impl Into<String>, probe: &impl HostProbe) -> Self {
        Self {
            name: name.into(),
            tunables: probe.has_tunables(),
            base_abstractions: probe.has_base_abstractions(),
        }
    }

    /// Spec for the stock profile on this host.
    #[must_use]
    pub fn default_profile() -> Self {
        Self::probe(DEFAULT_PROFILE_NAME, &FsHostProbe::default())
    }

    /// Renders the policy text.
    ///
    /// # Errors
    ///
    /// Returns [`WardenError::ProfileRenderFailed`] if the name would break
    /// out of the profile header.
    pub fn render(&self) -> Result<ProfileDocument> {
        if self.name.is_empty()
            || self
                .name
                .chars()
                .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '{' | '}' | ','))
        {
            return Err(WardenError::ProfileRenderFailed {
                reason: format!("invalid profile name {:?}", self.name),
            });
        }
        let mut out = String::with_capacity(PROFILE_BODY.len() + 256);
        self.write_document(&mut out)
            .map_err(|e| WardenError::ProfileRenderFailed {
                reason: e.to_string(),
            })?;
        Ok(ProfileDocument(out))
    }

    fn write_document(&self, out: &mut String) -> fmt::Result {
        if self.tunables {
            writeln!(out, "{TUNABLES_IMPORT}")?;
        } else {
            writeln!(out, "{PROC_PREFIX_DEFINITION}")?;
        }
        writeln!(out)?;
        writeln!(
            out,
            "profile {} flags=(attach_disconnected,mediate_deleted) {{",
            self.name
        )?;
        if self.base_abstractions {
            writeln!(out, "  {ABSTRACTIONS_IMPORT}")?;
            writeln!(out)?;
        }
        out.write_str(PROFILE_BODY)?;
        writeln!(out, "}}")
    }
}

/// Rendered policy text in `apparmor_parser` syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileDocument(String);

impl ProfileDocument {
    /// The policy text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Writes the policy where the external loader expects it.
    ///
    /// # Errors
    ///
    /// Returns [`WardenError::Io`] if the file cannot be written.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, &self.0).map_err(|e| WardenError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        tracing::info!(path = %path.display(), "apparmor profile written");
        Ok(())
    }
}

impl fmt::Display for ProfileDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Renders the profile `name` for the host described by `probe`.
///
/// # Errors
///
/// Returns [`WardenError::ProfileRenderFailed`] if rendering fails.
pub fn generate_profile(name: &str, probe: &impl HostProbe) -> Result<ProfileDocument> {
    let spec = ProfileSpec::probe(name, probe);
    tracing::debug!(
        profile = name,
        tunables = spec.tunables,
        abstractions = spec.base_abstractions,
        "rendering apparmor profile"
    );
    spec.render()
}
