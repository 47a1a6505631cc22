//! Common error types shared across crates.

use thiserror::Error;

/// Every failure the sealing core and the gateway can produce.
///
/// Messages carried by the variants describe *what* failed (a path, a length,
/// a backend error string). They never contain key material or plaintext, so
/// the `Display` output is safe to log.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A required input (key, path, blob reference) was absent or empty.
    #[error("missing parameter: {0}")]
    MissingParameter(String),

    /// One of the two sealed artifacts does not exist on disk.
    #[error("artifact not found: {0}")]
    ArtifactNotFound(String),

    /// The envelope blob is shorter than the IV it must start with.
    #[error("malformed envelope: {len} bytes, need at least {iv_len}")]
    MalformedEnvelope { len: usize, iv_len: usize },

    /// The cipher or RSA backend rejected a key, IV, or operation.
    #[error("crypto backend error: {0}")]
    CryptoBackend(String),

    /// The artifacts were present but did not decrypt to usable plaintext.
    #[error("unseal failed: {0}")]
    Unseal(String),

    /// Sealing could not read its input or write its artifacts.
    #[error("seal failed: {0}")]
    Seal(String),

    /// An unexpected I/O failure outside of the cases above.
    #[error("i/o error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl ServiceError {
    /// Stable, machine-readable label for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::MissingParameter(_) => "missing_parameter",
            ServiceError::ArtifactNotFound(_) => "artifact_not_found",
            ServiceError::MalformedEnvelope { .. } => "malformed_envelope",
            ServiceError::CryptoBackend(_) => "crypto_backend",
            ServiceError::Unseal(_) => "unseal",
            ServiceError::Seal(_) => "seal",
            ServiceError::Io { .. } => "io",
        }
    }

    /// `true` when the failure happened while decrypting present artifacts.
    ///
    /// These are security-relevant (wrong key or tampered data), unlike
    /// missing inputs which point at a caller or deployment problem.
    pub fn is_decryption_failure(&self) -> bool {
        matches!(
            self,
            ServiceError::Unseal(_)
                | ServiceError::CryptoBackend(_)
                | ServiceError::MalformedEnvelope { .. }
        )
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        ServiceError::Io {
            context: context.into(),
            source,
        }
    }
}
