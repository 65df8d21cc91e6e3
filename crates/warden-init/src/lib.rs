//! Container init sequence for the Warden runtime.
//!
//! Runs inside the freshly cloned process, after the orchestrator has set up
//! namespaces and mounts, and ends by replacing the process image with the
//! container's program.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod logging;

#[cfg(target_os = "linux")]
pub mod finalize;
#[cfg(target_os = "linux")]
pub mod platform;
#[cfg(target_os = "linux")]
pub mod sequence;

#[cfg(target_os = "linux")]
pub use platform::{InitPlatform, LinuxPlatform};
#[cfg(target_os = "linux")]
pub use sequence::{InitStep, SetnsInit};
