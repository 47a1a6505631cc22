//! Axum middleware layers applied to the router.
//!
//! Request tracing and a per-request timeout. Responses are never compressed:
//! `Content-Length` must equal the plaintext length.
//!
//! The unseal route is kept out of [`REQUEST_TIMEOUT`]'s layer. It enforces
//! [`UNSEAL_TIMEOUT`] itself so that a slow unseal still answers with the
//! uniform failure response instead of a bare `408`.

use std::time::Duration;

/// Per-request timeout layered onto health and fallback routes.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Deadline for loading and decrypting one sealed object.
pub const UNSEAL_TIMEOUT: Duration = Duration::from_secs(30);
