//! Where the gateway finds sealed artifacts.

use std::path::{Component, Path, PathBuf};

use common::ServiceError;
use sealing::SealedObject;

/// Relative path of a sealed object, as taken from the request URL.
///
/// Only plain file and directory names are allowed; `..`, absolute paths,
/// and empty paths are rejected so a request can never address anything
/// outside the store's root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePath(PathBuf);

impl ResourcePath {
    /// Validate a URL-derived path such as `photos/2017/a.png`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::MissingParameter`] if the path is empty or
    /// contains anything other than normal components.
    pub fn parse(raw: &str) -> Result<Self, ServiceError> {
        let trimmed = raw.trim_matches('/');
        if trimmed.is_empty() || trimmed.contains('\0') || trimmed.contains('\\') {
            return Err(ServiceError::MissingParameter("resource path".into()));
        }
        let path = Path::new(trimmed);
        if !path.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(ServiceError::MissingParameter("resource path".into()));
        }
        Ok(Self(path.to_path_buf()))
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl std::fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.display().fmt(f)
    }
}

/// Source of sealed artifacts.
///
/// Implementations are called from the blocking thread pool and may do
/// synchronous I/O.
#[cfg_attr(test, mockall::automock)]
pub trait ArtifactStore: Send + Sync {
    /// Load both blobs of the object named by `resource`.
    fn load(&self, resource: &ResourcePath) -> Result<SealedObject, ServiceError>;

    /// Whether the store's backing location is currently reachable.
    fn is_available(&self) -> bool;
}

/// [`ArtifactStore`] reading `<base_dir>/<resource>.sealed` and `.env`.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    base_dir: PathBuf,
}

impl FsArtifactStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }
}

impl ArtifactStore for FsArtifactStore {
    fn load(&self, resource: &ResourcePath) -> Result<SealedObject, ServiceError> {
        sealing::read_sealed(&self.base_dir.join(resource.as_path()))
    }

    fn is_available(&self) -> bool {
        self.base_dir.is_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_nested_paths() {
        let p = ResourcePath::parse("/photos/2017/a.png").unwrap();
        assert_eq!(p.as_path(), Path::new("photos/2017/a.png"));
        assert_eq!(p.to_string(), "photos/2017/a.png");
    }

    #[test]
    fn parse_rejects_escapes_and_empties() {
        for raw in ["", "/", "../etc/passwd", "photos/../../x.png", "./a.png", "a\\..\\b.png", "a\0.png"] {
            let err = ResourcePath::parse(raw).unwrap_err();
            assert!(matches!(err, ServiceError::MissingParameter(_)), "{raw:?}");
        }
    }

    #[test]
    fn fs_store_reads_under_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("photos")).unwrap();
        let sealed = SealedObject {
            ciphertext: vec![1; 16],
            envelope: vec![2; 32],
        };
        sealing::write_sealed(&dir.path().join("photos/a.png"), &sealed).unwrap();

        let store = FsArtifactStore::new(dir.path());
        assert!(store.is_available());
        let loaded = store.load(&ResourcePath::parse("photos/a.png").unwrap()).unwrap();
        assert_eq!(loaded, sealed);
    }

    #[test]
    fn fs_store_reports_missing_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path());
        let err = store.load(&ResourcePath::parse("nope.png").unwrap()).unwrap_err();
        assert!(matches!(err, ServiceError::ArtifactNotFound(_)));
    }

    #[test]
    fn missing_base_dir_is_unavailable() {
        assert!(!FsArtifactStore::new("/definitely/not/a/dir").is_available());
    }
}
