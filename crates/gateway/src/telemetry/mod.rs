//! Structured logging and optional OpenTelemetry span export.
//!
//! # Telemetry invariants
//!
//! - **No key material or plaintext** may appear in any span attribute or log
//!   field. Handlers log resource paths and error kinds only.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`), overridden by
//!   `RUST_LOG` when set.

pub mod init;

pub use init::init_telemetry;
