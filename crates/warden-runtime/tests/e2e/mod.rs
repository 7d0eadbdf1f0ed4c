//! End-to-end tests for the sandbox
//!
//! These tests drive a [`warden_runtime::Sandbox`] with a scripted engine
//! and check what crosses between the host and guest realms.

mod harness;
mod bridge;
mod exceptions;
mod hardening;
mod modules;
mod transform;

pub use harness::*;
