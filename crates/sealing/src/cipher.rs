//! AES-256-CBC encryption of whole files with a one-time symmetric key.
//!
//! **Algorithm choice:** AES-256 in CBC mode with PKCS#7 padding, the layout
//! existing `.sealed` files were written with. CBC is not authenticated: a
//! flipped ciphertext bit garbles the plaintext or breaks the padding, but
//! is not otherwise detected.
//!
//! Every symmetric key is used for exactly one file, so IV reuse across
//! objects cannot occur even though the IV is stored in the clear.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use common::ServiceError;
use rand::{rngs::OsRng, RngCore};
use zeroize::ZeroizeOnDrop;

use crate::envelope::IV_LEN;

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// One-time symmetric key for a single sealed object.
///
/// When this type is dropped, the memory is overwritten with zeroes to
/// minimise the window during which plaintext key material lives in RAM.
#[derive(ZeroizeOnDrop)]
pub struct SymmetricKey(Box<[u8; KEY_LEN]>);

impl SymmetricKey {
    /// Generate a fresh key from the OS CSPRNG.
    pub fn generate() -> Self {
        let mut buf = Box::new([0u8; KEY_LEN]);
        OsRng.fill_bytes(&mut buf[..]);
        Self(buf)
    }

    /// Wrap recovered key bytes, which must be exactly [`KEY_LEN`] long.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Unseal`] on a length mismatch: a key of the wrong
    /// size can only come out of an unwrap with the wrong private key or a
    /// damaged envelope.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ServiceError> {
        if bytes.len() != KEY_LEN {
            return Err(ServiceError::Unseal(format!(
                "recovered symmetric key has {} bytes, expected {KEY_LEN}",
                bytes.len()
            )));
        }
        let mut buf = Box::new([0u8; KEY_LEN]);
        buf.copy_from_slice(bytes);
        Ok(Self(buf))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0[..]
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SymmetricKey([REDACTED])")
    }
}

/// Generate a fresh random IV.
pub fn generate_iv() -> [u8; IV_LEN] {
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);
    iv
}

/// Encrypt `plaintext` with AES-256-CBC and PKCS#7 padding.
///
/// # Errors
///
/// Returns [`ServiceError::CryptoBackend`] if the cipher rejects the key or IV.
pub fn encrypt(plaintext: &[u8], key: &SymmetricKey, iv: &[u8]) -> Result<Vec<u8>, ServiceError> {
    let cipher = Aes256CbcEnc::new_from_slices(key.as_bytes(), iv)
        .map_err(|e| ServiceError::CryptoBackend(format!("aes-256-cbc init: {e}")))?;
    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

/// Decrypt AES-256-CBC `ciphertext` and strip the PKCS#7 padding.
///
/// # Errors
///
/// Returns [`ServiceError::CryptoBackend`] if the cipher rejects the key or IV,
/// and [`ServiceError::Unseal`] if the padding is invalid (wrong key, or a
/// damaged or truncated ciphertext).
pub fn decrypt(ciphertext: &[u8], key: &SymmetricKey, iv: &[u8]) -> Result<Vec<u8>, ServiceError> {
    let cipher = Aes256CbcDec::new_from_slices(key.as_bytes(), iv)
        .map_err(|e| ServiceError::CryptoBackend(format!("aes-256-cbc init: {e}")))?;
    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| ServiceError::Unseal("ciphertext padding is invalid".into()))
}
