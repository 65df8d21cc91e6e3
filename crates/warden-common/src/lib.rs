//! # warden-common
//!
//! Shared error taxonomy, domain types, the init configuration model, and
//! well-known host paths used across the Warden workspace.
//!
//! This crate is the leaf of the dependency graph: it depends on no other
//! internal crate and performs no system calls.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
