//! Logging utilities.
//!
//! Every diagnostic this crate produces (compile/link failures, texture load
//! failures, uniform misses) goes through the `log` facade. This module only
//! wires a backend for binaries and tests that want one.

mod init;

pub use init::{init_logging, LoggingConfig};
