//! RSA key material for wrapping and unwrapping the one-time symmetric key.
//!
//! Public keys are accepted as SPKI (`PUBLIC KEY`) or PKCS#1
//! (`RSA PUBLIC KEY`) PEM; private keys as PKCS#8 (`PRIVATE KEY`) or PKCS#1
//! (`RSA PRIVATE KEY`) PEM.

use std::borrow::Cow;
use std::path::Path;

use common::ServiceError;
use rand::rngs::OsRng;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};
use zeroize::Zeroizing;

use crate::cipher::SymmetricKey;

/// The escaped line break some key stores hand out in place of a real one.
const ESCAPED_CRLF: &str = "\\r\\n";

/// Replace every literal `\r\n` escape sequence with a real CRLF.
///
/// Private keys often arrive through a single-line channel such as an HTTP
/// header, where the PEM line breaks are written out as the four characters
/// `\`, `r`, `\`, `n`. Text without that sequence is returned unchanged, so
/// normalising twice is the same as normalising once.
pub fn normalize_private_key(text: &str) -> Cow<'_, str> {
    if text.contains(ESCAPED_CRLF) {
        Cow::Owned(text.replace(ESCAPED_CRLF, "\r\n"))
    } else {
        Cow::Borrowed(text)
    }
}

/// A recipient's RSA public key. Used only for sealing.
#[derive(Debug, Clone)]
pub struct PublicKeyMaterial {
    key: RsaPublicKey,
}

impl PublicKeyMaterial {
    /// Parse a PEM-encoded public key.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::MissingParameter`] for blank input and
    /// [`ServiceError::CryptoBackend`] if the PEM is not an RSA public key.
    pub fn from_pem(pem: &str) -> Result<Self, ServiceError> {
        let pem = pem.trim();
        if pem.is_empty() {
            return Err(ServiceError::MissingParameter("public key".into()));
        }
        let key = RsaPublicKey::from_public_key_pem(pem)
            .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
            .map_err(|e| ServiceError::CryptoBackend(format!("public key rejected: {e}")))?;
        Ok(Self { key })
    }

    /// Read and parse a PEM public key file.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Seal`] if the file cannot be read, otherwise as
    /// [`PublicKeyMaterial::from_pem`].
    pub fn from_pem_file(path: &Path) -> Result<Self, ServiceError> {
        let pem = std::fs::read_to_string(path).map_err(|e| {
            ServiceError::Seal(format!("cannot read public key {}: {e}", path.display()))
        })?;
        Self::from_pem(&pem)
    }

    /// Length in bytes of the RSA modulus, and so of every wrapped key.
    pub fn modulus_len(&self) -> usize {
        self.key.size()
    }

    /// Wrap `key` with RSA PKCS#1 v1.5 encryption.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::CryptoBackend`] if the RSA operation fails.
    pub fn wrap(&self, key: &SymmetricKey) -> Result<Vec<u8>, ServiceError> {
        self.key
            .encrypt(&mut OsRng, Pkcs1v15Encrypt, key.as_bytes())
            .map_err(|e| ServiceError::CryptoBackend(format!("key wrap failed: {e}")))
    }
}

/// A recipient's RSA private key. Used only for unsealing.
///
/// Built per request from caller-supplied text and dropped with it.
#[derive(Clone)]
pub struct PrivateKeyMaterial {
    key: RsaPrivateKey,
}

impl PrivateKeyMaterial {
    /// Normalise escaped line breaks (see [`normalize_private_key`]) and parse
    /// the result as a PEM private key.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::MissingParameter`] for blank input and
    /// [`ServiceError::CryptoBackend`] if the text is not an RSA private key.
    pub fn from_text(text: &str) -> Result<Self, ServiceError> {
        let normalized = normalize_private_key(text);
        let pem = normalized.trim();
        if pem.is_empty() {
            return Err(ServiceError::MissingParameter("private key".into()));
        }
        // The parse error text describes the PEM structure, not its contents.
        let key = RsaPrivateKey::from_pkcs8_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
            .map_err(|e| ServiceError::CryptoBackend(format!("private key rejected: {e}")))?;
        Ok(Self { key })
    }

    /// Recover a symmetric key wrapped by [`PublicKeyMaterial::wrap`].
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Unseal`] if the RSA decryption fails (wrong key
    /// or damaged envelope) or yields a key of the wrong length.
    pub fn unwrap_key(&self, wrapped: &[u8]) -> Result<SymmetricKey, ServiceError> {
        let raw = self
            .key
            .decrypt(Pkcs1v15Encrypt, wrapped)
            .map(Zeroizing::new)
            .map_err(|_| ServiceError::Unseal("wrapped key could not be unwrapped".into()))?;
        SymmetricKey::from_slice(&raw)
    }
}

impl std::fmt::Debug for PrivateKeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material, not even in debug builds.
        f.write_str("PrivateKeyMaterial([REDACTED])")
    }
}
