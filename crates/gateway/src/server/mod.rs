//! Axum HTTP(S) server, routing, and request handling.
//!
//! # Responsibilities
//! - Define the Axum router with the unseal, health, and fallback routes.
//! - Validate inbound requests into typed [`request::UnsealRequest`]s.
//! - Serve plain HTTP, or terminate TLS with rustls when configured.

pub mod handlers;
pub mod middleware;
pub mod request;
pub mod router;
pub mod state;
pub mod tls;
