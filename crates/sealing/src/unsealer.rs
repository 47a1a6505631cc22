//! Unsealing: recover plaintext from a ciphertext blob and its envelope.

use common::ServiceError;

use crate::cipher;
use crate::envelope;
use crate::keys::PrivateKeyMaterial;

/// Decrypt `ciphertext` using the IV and wrapped key in `envelope`.
///
/// `private_key` has already been normalised and parsed (see
/// [`PrivateKeyMaterial::from_text`]). Nothing is written anywhere; the
/// plaintext is returned in memory only.
///
/// # Errors
///
/// - [`ServiceError::MalformedEnvelope`] if the envelope is shorter than the IV.
/// - [`ServiceError::Unseal`] if the key does not unwrap or the ciphertext
///   does not decrypt (wrong key, damaged data).
/// - [`ServiceError::CryptoBackend`] if the cipher rejects the recovered key.
pub fn unseal(
    ciphertext: &[u8],
    envelope: &[u8],
    private_key: &PrivateKeyMaterial,
) -> Result<Vec<u8>, ServiceError> {
    let envelope = envelope::decode(envelope)?;
    let key = private_key.unwrap_key(&envelope.wrapped_key)?;
    cipher::decrypt(ciphertext, &key, &envelope.iv)
}
