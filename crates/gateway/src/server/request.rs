//! Typed view of an inbound unseal request, validated once at the boundary.

use axum::http::HeaderMap;
use common::ServiceError;
use sealing::PrivateKeyMaterial;

use crate::store::ResourcePath;

/// Everything the core needs from an HTTP request, and nothing more.
#[derive(Debug)]
pub struct UnsealRequest {
    /// Parsed private key; dropped with the request.
    pub private_key: PrivateKeyMaterial,
    /// Sealed object to open, relative to the store root.
    pub resource: ResourcePath,
}

impl UnsealRequest {
    /// Build a request from the key header and the path captured after the
    /// route prefix.
    ///
    /// The path is checked before the key is parsed, so a bad path costs no
    /// RSA work.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::MissingParameter`] if the header is absent, empty, or
    ///   not visible ASCII, or if the path is empty or escapes the root.
    /// - [`ServiceError::CryptoBackend`] if the header is not a private key.
    pub fn from_parts(
        headers: &HeaderMap,
        key_header: &str,
        raw_path: &str,
    ) -> Result<Self, ServiceError> {
        let key_text = headers
            .get(key_header)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ServiceError::MissingParameter(format!("{key_header} header")))?;

        let resource = ResourcePath::parse(raw_path)?;
        let private_key = PrivateKeyMaterial::from_text(key_text)?;

        Ok(Self {
            private_key,
            resource,
        })
    }
}
