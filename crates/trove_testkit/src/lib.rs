//! # Trove Testkit
//!
//! Test utilities for Trove.
//!
//! This crate provides:
//! - [`fixtures`] - sample drafts, items, and wired store/queue pairs
//! - [`generators`] - proptest strategies for the data model
//! - [`harness`] - a fully wired in-memory engine for end-to-end sync tests
//!
//! The workspace's cross-crate integration suites live in this crate's
//! `tests/` directory.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod harness;

use std::sync::Once;

static TRACING: Once = Once::new();

/// Initializes a `tracing` subscriber honoring `RUST_LOG`, once per
/// process. Safe to call from every test.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
