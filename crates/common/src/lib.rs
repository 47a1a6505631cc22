//! Common types, protocol definitions, and errors shared across `seal-gateway` crates.

pub mod error;
pub mod protocol;

pub use error::ServiceError;
