//! On-disk layout of sealed objects: `P.sealed` and `P.env` next to each other.

use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};

use common::ServiceError;
use tracing::warn;

use crate::envelope::IV_LEN;
use crate::sealer::SealedObject;

/// Suffix of the ciphertext artifact.
pub const CIPHERTEXT_SUFFIX: &str = ".sealed";

/// Suffix of the envelope artifact.
pub const ENVELOPE_SUFFIX: &str = ".env";

/// Paths of the two artifacts belonging to one base path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedPaths {
    pub ciphertext: PathBuf,
    pub envelope: PathBuf,
}

impl SealedPaths {
    /// Derive artifact paths by appending the suffixes to `base`.
    ///
    /// Trailing path separators on `base` are ignored, so `photos/a.png/`
    /// and `photos/a.png` name the same object.
    pub fn for_base(base: &Path) -> Self {
        let base = trim_trailing_separators(base);
        Self {
            ciphertext: with_suffix(base, CIPHERTEXT_SUFFIX),
            envelope: with_suffix(base, ENVELOPE_SUFFIX),
        }
    }
}

#[cfg(unix)]
fn trim_trailing_separators(base: &Path) -> &OsStr {
    use std::os::unix::ffi::OsStrExt;
    let bytes = base.as_os_str().as_bytes();
    match bytes.iter().rposition(|&b| b != b'/') {
        Some(last) => OsStr::from_bytes(&bytes[..=last]),
        None => base.as_os_str(),
    }
}

#[cfg(not(unix))]
fn trim_trailing_separators(base: &Path) -> &OsStr {
    // Non-UTF-8 paths are left untouched rather than rebuilt lossily.
    match base.to_str() {
        Some(raw) => match raw.trim_end_matches(std::path::is_separator) {
            "" => base.as_os_str(),
            trimmed => OsStr::new(trimmed),
        },
        None => base.as_os_str(),
    }
}

fn with_suffix(base: &OsStr, suffix: &str) -> PathBuf {
    let mut path = base.to_owned();
    path.push(suffix);
    PathBuf::from(path)
}

/// Read both artifacts of the object at `base`.
///
/// # Errors
///
/// - [`ServiceError::ArtifactNotFound`] if either file is missing.
/// - [`ServiceError::Io`] for any other read failure.
/// - [`ServiceError::MalformedEnvelope`] if the envelope is shorter than the IV.
pub fn read_sealed(base: &Path) -> Result<SealedObject, ServiceError> {
    let paths = SealedPaths::for_base(base);
    let ciphertext = read_artifact(&paths.ciphertext)?;
    let envelope = read_artifact(&paths.envelope)?;
    if envelope.len() < IV_LEN {
        return Err(ServiceError::MalformedEnvelope {
            len: envelope.len(),
            iv_len: IV_LEN,
        });
    }
    Ok(SealedObject {
        ciphertext,
        envelope,
    })
}

fn read_artifact(path: &Path) -> Result<Vec<u8>, ServiceError> {
    std::fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ServiceError::ArtifactNotFound(path.display().to_string()),
        _ => ServiceError::io(format!("reading {}", path.display()), e),
    })
}

/// Write both artifacts of `sealed` next to `base`.
///
/// Each file is first written under a unique temporary name and then renamed
/// into place. If the envelope cannot be written after the ciphertext was,
/// the ciphertext is removed again, so readers see either a complete object
/// or none.
///
/// # Errors
///
/// Returns [`ServiceError::Seal`] if either artifact cannot be written.
pub fn write_sealed(base: &Path, sealed: &SealedObject) -> Result<(), ServiceError> {
    let paths = SealedPaths::for_base(base);
    write_atomic(&paths.ciphertext, &sealed.ciphertext)?;
    if let Err(e) = write_atomic(&paths.envelope, &sealed.envelope) {
        if let Err(cleanup) = std::fs::remove_file(&paths.ciphertext) {
            warn!(path = %paths.ciphertext.display(), error = %cleanup, "could not remove orphaned ciphertext");
        }
        return Err(e);
    }
    Ok(())
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ServiceError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(format!(".{}.tmp", uuid::Uuid::new_v4().simple()));
    let tmp = PathBuf::from(tmp);

    let result = std::fs::write(&tmp, bytes).and_then(|()| std::fs::rename(&tmp, path));
    result.map_err(|e| {
        let _ = std::fs::remove_file(&tmp);
        ServiceError::Seal(format!("cannot write {}: {e}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object() -> SealedObject {
        SealedObject {
            ciphertext: vec![1; 32],
            envelope: vec![2; IV_LEN + 8],
        }
    }

    #[test]
    fn paths_append_suffixes() {
        let paths = SealedPaths::for_base(Path::new("/srv/photos/a.png"));
        assert_eq!(paths.ciphertext, Path::new("/srv/photos/a.png.sealed"));
        assert_eq!(paths.envelope, Path::new("/srv/photos/a.png.env"));
    }

    #[test]
    fn trailing_separator_is_ignored() {
        assert_eq!(
            SealedPaths::for_base(Path::new("photos/a.png/")),
            SealedPaths::for_base(Path::new("photos/a.png"))
        );
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_base_keeps_its_bytes() {
        use std::os::unix::ffi::OsStrExt;
        let base = Path::new(OsStr::from_bytes(b"photos/\xffa.png//"));
        let paths = SealedPaths::for_base(base);
        assert_eq!(paths.ciphertext.as_os_str().as_bytes(), b"photos/\xffa.png.sealed");
        assert_eq!(paths.envelope.as_os_str().as_bytes(), b"photos/\xffa.png.env");
    }

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("a.png");
        write_sealed(&base, &object()).unwrap();
        assert_eq!(read_sealed(&base).unwrap(), object());

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn missing_envelope_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("a.png");
        std::fs::write(SealedPaths::for_base(&base).ciphertext, b"x").unwrap();
        let err = read_sealed(&base).unwrap_err();
        assert!(matches!(err, ServiceError::ArtifactNotFound(ref p) if p.ends_with(".env")));
    }

    #[test]
    fn missing_ciphertext_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("a.png");
        std::fs::write(SealedPaths::for_base(&base).envelope, [0u8; 64]).unwrap();
        let err = read_sealed(&base).unwrap_err();
        assert!(matches!(err, ServiceError::ArtifactNotFound(ref p) if p.ends_with(".sealed")));
    }

    #[test]
    fn short_envelope_on_disk_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("a.png");
        let paths = SealedPaths::for_base(&base);
        std::fs::write(&paths.ciphertext, b"x").unwrap();
        std::fs::write(&paths.envelope, [0u8; 5]).unwrap();
        assert!(matches!(
            read_sealed(&base).unwrap_err(),
            ServiceError::MalformedEnvelope { len: 5, .. }
        ));
    }

    #[test]
    fn write_into_missing_directory_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("no-such-dir").join("a.png");
        let err = write_sealed(&base, &object()).unwrap_err();
        assert!(matches!(err, ServiceError::Seal(_)));
    }
}
