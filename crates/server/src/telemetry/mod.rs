//! Structured logging and optional OpenTelemetry span export.
//!
//! # Telemetry invariants
//!
//! - **No secret material** in any span attribute or log field: no plaintext
//!   fields, no tokens, no keys, no password hashes. Owner ids and record ids
//!   are fine.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`); `RUST_LOG`
//!   takes precedence when set.

pub mod init;

pub use init::{init_telemetry, shutdown_telemetry};
