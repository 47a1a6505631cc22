//! Sealing: encrypt content for a single recipient and persist the artifacts.

use std::path::Path;

use common::ServiceError;
use tracing::{debug, info, warn};

use crate::artifacts::write_sealed;
use crate::cipher::{self, SymmetricKey};
use crate::envelope;
use crate::keys::PublicKeyMaterial;

/// The two blobs making up a sealed object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedObject {
    /// Raw AES-256-CBC output; stored as `P.sealed`.
    pub ciphertext: Vec<u8>,
    /// `iv || wrapped_key`; stored as `P.env`.
    pub envelope: Vec<u8>,
}

/// Options for [`seal_file`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SealOptions {
    /// Remove the plaintext source once both artifacts are written.
    pub delete_source: bool,
}

/// What [`seal_file`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SealOutcome {
    /// Plaintext bytes sealed.
    pub plaintext_len: usize,
    /// `true` only if deletion was requested and succeeded.
    pub source_removed: bool,
}

/// Seal `plaintext` for `recipient`.
///
/// A fresh IV and a fresh 256-bit symmetric key are drawn for every call.
/// The symmetric key is wrapped under the one recipient key; sealing to
/// several recipients is not supported.
///
/// # Errors
///
/// Returns [`ServiceError::CryptoBackend`] if the cipher or the RSA wrap fails.
pub fn seal(plaintext: &[u8], recipient: &PublicKeyMaterial) -> Result<SealedObject, ServiceError> {
    let iv = cipher::generate_iv();
    let key = SymmetricKey::generate();

    let ciphertext = cipher::encrypt(plaintext, &key, &iv)?;
    let wrapped_key = recipient.wrap(&key)?;

    debug!(
        plaintext_len = plaintext.len(),
        ciphertext_len = ciphertext.len(),
        wrapped_key_len = wrapped_key.len(),
        "sealed content"
    );

    Ok(SealedObject {
        ciphertext,
        envelope: envelope::encode(&iv, &wrapped_key),
    })
}

/// Seal the file at `source` and write `output_base.sealed` / `output_base.env`.
///
/// When [`SealOptions::delete_source`] is set, the source is removed after
/// both artifacts are in place. Deletion is best-effort: a failure is logged
/// and reported through [`SealOutcome::source_removed`] but does not undo or
/// fail the seal.
///
/// # Errors
///
/// Returns [`ServiceError::MissingParameter`] for empty paths,
/// [`ServiceError::Seal`] if the source cannot be read or the artifacts cannot
/// be written, and [`ServiceError::CryptoBackend`] from [`seal`].
pub fn seal_file(
    source: &Path,
    output_base: &Path,
    recipient: &PublicKeyMaterial,
    options: SealOptions,
) -> Result<SealOutcome, ServiceError> {
    if source.as_os_str().is_empty() {
        return Err(ServiceError::MissingParameter("source path".into()));
    }
    if output_base.as_os_str().is_empty() {
        return Err(ServiceError::MissingParameter("output path".into()));
    }

    let plaintext = std::fs::read(source)
        .map_err(|e| ServiceError::Seal(format!("cannot read {}: {e}", source.display())))?;

    let sealed = seal(&plaintext, recipient)?;
    write_sealed(output_base, &sealed)?;

    let source_removed = options.delete_source && remove_source(source);
    info!(
        source = %source.display(),
        output = %output_base.display(),
        bytes = plaintext.len(),
        source_removed,
        "file sealed"
    );

    Ok(SealOutcome {
        plaintext_len: plaintext.len(),
        source_removed,
    })
}

fn remove_source(source: &Path) -> bool {
    match std::fs::remove_file(source) {
        Ok(()) => true,
        Err(e) => {
            warn!(source = %source.display(), error = %e, "sealed but could not remove plaintext source");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::SealedPaths;
    use crate::envelope::IV_LEN;
    use crate::test_keys;

    #[test]
    fn envelope_holds_iv_and_modulus_sized_key() {
        let sealed = seal(b"hello", &test_keys::public()).unwrap();
        assert_eq!(sealed.envelope.len(), IV_LEN + test_keys::MODULUS_LEN);
        assert_eq!(sealed.ciphertext.len(), 16);
    }

    #[test]
    fn every_seal_uses_fresh_iv_and_key() {
        let recipient = test_keys::public();
        let a = seal(b"same input", &recipient).unwrap();
        let b = seal(b"same input", &recipient).unwrap();
        assert_ne!(a.envelope[..IV_LEN], b.envelope[..IV_LEN]);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn seal_file_writes_both_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("photo.png");
        std::fs::write(&source, b"png bytes").unwrap();

        let outcome = seal_file(&source, &source, &test_keys::public(), SealOptions::default()).unwrap();

        assert_eq!(outcome.plaintext_len, 9);
        assert!(!outcome.source_removed);
        let paths = SealedPaths::for_base(&source);
        assert!(paths.ciphertext.is_file());
        assert!(paths.envelope.is_file());
        assert!(source.exists(), "source kept unless deletion is requested");
    }

    #[test]
    fn seal_file_can_remove_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("scan.bmp");
        std::fs::write(&source, b"bmp").unwrap();

        let options = SealOptions { delete_source: true };
        let outcome = seal_file(&source, &source, &test_keys::public(), options).unwrap();

        assert!(outcome.source_removed);
        assert!(!source.exists());
        assert!(SealedPaths::for_base(&source).ciphertext.is_file());
    }

    #[test]
    fn seal_file_missing_source_is_seal_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("absent.jpg");
        let err = seal_file(&source, &source, &test_keys::public(), SealOptions::default()).unwrap_err();
        assert!(matches!(err, ServiceError::Seal(_)));
        assert!(!SealedPaths::for_base(&source).envelope.exists());
    }

    #[test]
    fn seal_file_rejects_empty_paths() {
        let err = seal_file(Path::new(""), Path::new("out"), &test_keys::public(), SealOptions::default())
            .unwrap_err();
        assert!(matches!(err, ServiceError::MissingParameter(_)));
    }

    #[test]
    fn failed_removal_does_not_fail_seal() {
        assert!(!remove_source(Path::new("/definitely/not/here.png")));
    }
}
