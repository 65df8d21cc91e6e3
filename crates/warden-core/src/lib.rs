//! # warden-core
//!
//! Low-level Linux confinement primitives for the Warden init sequence.
//!
//! This crate provides safe abstractions over:
//! - **Namespaces**: an architecture-aware `setns(2)` wrapper.
//! - **Process lifecycle**: parent-death signal, keep-capabilities,
//!   controlling terminal, start-time identity, and `execve(2)`.
//! - **Resource limits and credentials**: `setrlimit(2)`, UID/GID switching,
//!   and capability dropping.
//! - **AppArmor**: profile generation and exec-time profile transitions.
//!
//! All unsafe system calls are encapsulated in safe wrappers with
//! proper error handling and `// SAFETY:` documentation.

#![allow(unsafe_code)]
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod apparmor;
pub mod namespace;

#[cfg(target_os = "linux")]
pub mod capability;
#[cfg(target_os = "linux")]
pub mod identity;
#[cfg(target_os = "linux")]
pub mod label;
#[cfg(target_os = "linux")]
pub mod system;
