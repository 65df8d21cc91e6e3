//! Security label applied to the next exec'd program.
//!
//! The labeling subsystem is external; the init sequence only hands it an
//! opaque string through [`ProcessLabeler`].

use std::io::Write;
use std::path::PathBuf;

use warden_common::constants::LSM_EXEC_ATTR;
use warden_common::error::{Errno, Result, WardenError};

/// Applies a security label to the current process before exec.
pub trait ProcessLabeler {
    /// Labels the program started by the next `execve(2)`.
    ///
    /// # Errors
    ///
    /// Returns the labeling subsystem's error unchanged.
    fn set_process_label(&self, label: &str) -> Result<()>;
}

/// Writes the label to the LSM exec attribute in procfs.
#[derive(Debug, Clone)]
pub struct ProcAttrLabeler {
    attr_path: PathBuf,
}

impl ProcAttrLabeler {
    /// Labeler writing to a custom attribute file.
    #[must_use]
    pub fn with_attr_path(attr_path: impl Into<PathBuf>) -> Self {
        Self {
            attr_path: attr_path.into(),
        }
    }
}

impl Default for ProcAttrLabeler {
    fn default() -> Self {
        Self::with_attr_path(LSM_EXEC_ATTR)
    }
}

impl ProcessLabeler for ProcAttrLabeler {
    fn set_process_label(&self, label: &str) -> Result<()> {
        let fail = |e: std::io::Error| WardenError::LabelFailed {
            label: label.to_owned(),
            errno: Errno(e.raw_os_error().unwrap_or(libc::EIO)),
        };
        let mut attr = std::fs::OpenOptions::new()
            .write(true)
            .open(&self.attr_path)
            .map_err(fail)?;
        attr.write_all(label.as_bytes()).map_err(fail)?;
        tracing::debug!(label, path = %self.attr_path.display(), "process label set");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_label_to_attribute() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let attr = dir.path().join("exec");
        std::fs::write(&attr, "").unwrap();

        ProcAttrLabeler::with_attr_path(&attr)
            .set_process_label("system_u:system_r:container_t:s0")
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(&attr).unwrap(),
            "system_u:system_r:container_t:s0"
        );
    }

    #[test]
    fn missing_attribute_reports_label_and_errno() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let labeler = ProcAttrLabeler::with_attr_path(dir.path().join("absent/exec"));
        match labeler.set_process_label("x").unwrap_err() {
            WardenError::LabelFailed { label, errno } => {
                assert_eq!(label, "x");
                assert_eq!(errno, Errno(libc::ENOENT));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
