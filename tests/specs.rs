//! Behavioral specifications for the vigil daemon binaries.
//!
//! Black-box: invoke the built binaries and verify stdout/stderr/exit codes.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/prelude.rs"]
mod prelude;

#[path = "specs/daemon_help.rs"]
mod daemon_help;
