//! Process start time from `/proc/<pid>/stat`, used to detect PID reuse.
//!
//! The record is split on single spaces and field 22 is returned verbatim.
//! A command name containing spaces shifts the fields; this parser does not
//! try to recover from that.

use std::path::Path;

use warden_common::constants::{PROC_ROOT, STAT_START_TIME_FIELD};
use warden_common::error::{Result, WardenError};

/// Returns the start-time token of `pid` as found in `/proc`.
///
/// The token is opaque: compare it for equality, never parse it.
///
/// # Errors
///
/// Returns [`WardenError::ProcessNotFound`] if the record cannot be read and
/// [`WardenError::MalformedStatRecord`] if it has fewer than 22 fields.
pub fn process_start_time(pid: u32) -> Result<String> {
    process_start_time_in(Path::new(PROC_ROOT), pid)
}

/// [`process_start_time`] against an alternative procfs root.
///
/// # Errors
///
/// Same as [`process_start_time`].
pub fn process_start_time_in(proc_root: &Path, pid: u32) -> Result<String> {
    let path = proc_root.join(pid.to_string()).join("stat");
    let record = std::fs::read_to_string(&path).map_err(|e| {
        tracing::debug!(pid, path = %path.display(), error = %e, "stat record unreadable");
        WardenError::ProcessNotFound { pid }
    })?;
    start_time_field(pid, &record)
}

fn start_time_field(pid: u32, record: &str) -> Result<String> {
    let fields: Vec<&str> = record.split(' ').collect();
    match fields.get(STAT_START_TIME_FIELD - 1) {
        Some(token) if fields.len() >= STAT_START_TIME_FIELD => Ok((*token).to_owned()),
        _ => Err(WardenError::MalformedStatRecord {
            pid,
            fields: fields.len(),
        }),
    }
}

/// A pid paired with the start time observed when it was captured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessIdentitySample {
    pid: u32,
    start_time: String,
}

impl ProcessIdentitySample {
    /// Records the current start time of `pid`.
    ///
    /// # Errors
    ///
    /// Propagates [`process_start_time`] errors.
    pub fn capture(pid: u32) -> Result<Self> {
        Self::capture_in(Path::new(PROC_ROOT), pid)
    }

    /// [`ProcessIdentitySample::capture`] against an alternative procfs root.
    ///
    /// # Errors
    ///
    /// Propagates [`process_start_time_in`] errors.
    pub fn capture_in(proc_root: &Path, pid: u32) -> Result<Self> {
        Ok(Self {
            pid,
            start_time: process_start_time_in(proc_root, pid)?,
        })
    }

    /// Builds a sample from previously stored parts.
    #[must_use]
    pub const fn from_parts(pid: u32, start_time: String) -> Self {
        Self { pid, start_time }
    }

    /// The sampled pid.
    #[must_use]
    pub const fn pid(&self) -> u32 {
        self.pid
    }

    /// The sampled start-time token.
    #[must_use]
    pub fn start_time(&self) -> &str {
        &self.start_time
    }

    /// Whether the pid still refers to the sampled process.
    ///
    /// # Errors
    ///
    /// Returns [`WardenError::ProcessNotFound`] if the pid is gone and
    /// [`WardenError::MalformedStatRecord`] if its record is truncated.
    pub fn is_same_process(&self) -> Result<bool> {
        self.is_same_process_in(Path::new(PROC_ROOT))
    }

    /// [`ProcessIdentitySample::is_same_process`] against an alternative
    /// procfs root.
    ///
    /// # Errors
    ///
    /// Same as [`ProcessIdentitySample::is_same_process`].
    pub fn is_same_process_in(&self, proc_root: &Path) -> Result<bool> {
        Ok(process_start_time_in(proc_root, self.pid)? == self.start_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat_record(comm: &str, start: &str) -> String {
        let mut fields = vec!["4242".to_owned(), format!("({comm})"), "S".to_owned()];
        fields.extend((4..STAT_START_TIME_FIELD).map(|i| i.to_string()));
        fields.push(start.to_owned());
        fields.extend(["9999", "42"].map(str::to_owned));
        fields.join(" ")
    }

    fn fake_proc(pid: u32, record: &str) -> tempfile::TempDir {
        let root = tempfile::tempdir().expect("failed to create tempdir");
        let dir = root.path().join(pid.to_string());
        std::fs::create_dir_all(&dir).expect("failed to create pid dir");
        std::fs::write(dir.join("stat"), record).expect("failed to write stat");
        root
    }

    #[test]
    fn returns_field_twenty_two_verbatim() {
        let root = fake_proc(4242, &stat_record("sleep", "0001234567"));
        let token = process_start_time_in(root.path(), 4242).unwrap();
        assert_eq!(token, "0001234567");
    }

    #[test]
    fn exactly_twenty_two_fields_is_enough() {
        let record: Vec<String> = (1..=STAT_START_TIME_FIELD).map(|i| format!("f{i}")).collect();
        let root = fake_proc(7, &record.join(" "));
        assert_eq!(process_start_time_in(root.path(), 7).unwrap(), "f22");
    }

    #[test]
    fn short_record_is_malformed() {
        let record: Vec<String> = (1..STAT_START_TIME_FIELD).map(|i| i.to_string()).collect();
        let root = fake_proc(9, &record.join(" "));
        match process_start_time_in(root.path(), 9).unwrap_err() {
            WardenError::MalformedStatRecord { pid, fields } => {
                assert_eq!(pid, 9);
                assert_eq!(fields, STAT_START_TIME_FIELD - 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_record_is_malformed() {
        let root = fake_proc(10, "");
        assert!(matches!(
            process_start_time_in(root.path(), 10),
            Err(WardenError::MalformedStatRecord { .. })
        ));
    }

    #[test]
    fn missing_pid_is_not_found() {
        let root = tempfile::tempdir().expect("failed to create tempdir");
        assert!(matches!(
            process_start_time_in(root.path(), 31337),
            Err(WardenError::ProcessNotFound { pid: 31337 })
        ));
    }

    #[test]
    fn own_start_time_is_stable() {
        let pid = std::process::id();
        let first = process_start_time(pid).unwrap();
        assert!(!first.is_empty());
        assert_eq!(first, process_start_time(pid).unwrap());
    }

    #[test]
    fn sample_detects_reuse() {
        let root = fake_proc(4242, &stat_record("init", "500"));
        let sample = ProcessIdentitySample::capture_in(root.path(), 4242).unwrap();
        assert!(sample.is_same_process_in(root.path()).unwrap());

        std::fs::write(
            root.path().join("4242").join("stat"),
            stat_record("imposter", "501"),
        )
        .unwrap();
        assert!(!sample.is_same_process_in(root.path()).unwrap());
    }

    #[test]
    fn sample_of_vanished_pid_errors() {
        let root = tempfile::tempdir().expect("failed to create tempdir");
        let sample = ProcessIdentitySample::from_parts(77, "123".into());
        assert!(matches!(
            sample.is_same_process_in(root.path()),
            Err(WardenError::ProcessNotFound { pid: 77 })
        ));
    }
}
