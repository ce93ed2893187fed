//! Integration test crate for Splice.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It depends on every splice crate to verify they work together.

use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Route `tracing` output through the test harness. Honors `RUST_LOG`;
/// safe to call from every test.
pub fn init_tracing() {
    let _ = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod history;

#[cfg(test)]
mod jobs;
