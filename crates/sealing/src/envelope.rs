//! Binary codec for the `.env` envelope blob.
//!
//! # Layout
//!
//! ```text
//! +----------------+--------------------------------------+
//! | IV (16 bytes)  | wrapped symmetric key (rest of blob) |
//! +----------------+--------------------------------------+
//! ```
//!
//! Everything here is a pure function of its inputs.

use common::ServiceError;

/// Length of the AES-CBC initialisation vector at the head of every envelope.
pub const IV_LEN: usize = 16;

/// A decoded envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub iv: [u8; IV_LEN],
    /// Symmetric key wrapped under the recipient's RSA public key.
    pub wrapped_key: Vec<u8>,
}

impl Envelope {
    pub fn new(iv: [u8; IV_LEN], wrapped_key: Vec<u8>) -> Self {
        Self { iv, wrapped_key }
    }

    /// Serialise to `iv || wrapped_key`.
    pub fn encode(&self) -> Vec<u8> {
        encode(&self.iv, &self.wrapped_key)
    }
}

/// Concatenate an IV and a wrapped key into an envelope blob.
pub fn encode(iv: &[u8; IV_LEN], wrapped_key: &[u8]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(IV_LEN + wrapped_key.len());
    blob.extend_from_slice(iv);
    blob.extend_from_slice(wrapped_key);
    blob
}

/// Decode an envelope blob using the standard [`IV_LEN`].
///
/// # Errors
///
/// Returns [`ServiceError::MalformedEnvelope`] if `blob` is shorter than [`IV_LEN`].
pub fn decode(blob: &[u8]) -> Result<Envelope, ServiceError> {
    let (iv, wrapped_key) = split(blob, IV_LEN)?;
    let mut iv_bytes = [0u8; IV_LEN];
    iv_bytes.copy_from_slice(iv);
    Ok(Envelope::new(iv_bytes, wrapped_key.to_vec()))
}

/// Split `blob` into its first `iv_len` bytes and the remainder.
///
/// # Errors
///
/// Returns [`ServiceError::MalformedEnvelope`] if `blob` is shorter than `iv_len`.
pub fn split(blob: &[u8], iv_len: usize) -> Result<(&[u8], &[u8]), ServiceError> {
    if blob.len() < iv_len {
        return Err(ServiceError::MalformedEnvelope {
            len: blob.len(),
            iv_len,
        });
    }
    Ok(blob.split_at(iv_len))
}
