//! Shared application state injected into every Axum handler.

use std::sync::Arc;
use std::time::Duration;

use crate::content_type::ContentTypeTable;
use crate::store::ArtifactStore;

use super::middleware::UNSEAL_TIMEOUT;

/// Application state shared across all request handlers.
///
/// Read-only after startup; cloning is a handful of `Arc` bumps.
#[derive(Clone)]
pub struct AppState {
    /// Where sealed artifacts are loaded from.
    pub store: Arc<dyn ArtifactStore>,
    /// Extension → content type mapping for successful responses.
    pub content_types: Arc<ContentTypeTable>,
    /// Name of the HTTP header carrying the caller's private key.
    pub key_header_name: Arc<String>,
    /// How long one load-and-decrypt may take before the request fails.
    pub unseal_timeout: Duration,
}

impl AppState {
    /// Create a new [`AppState`].
    pub fn new(
        store: Arc<dyn ArtifactStore>,
        content_types: ContentTypeTable,
        key_header_name: String,
    ) -> Self {
        Self {
            store,
            content_types: Arc::new(content_types),
            key_header_name: Arc::new(key_header_name),
            unseal_timeout: UNSEAL_TIMEOUT,
        }
    }

    /// Replace the default [`UNSEAL_TIMEOUT`].
    pub fn with_unseal_timeout(mut self, timeout: Duration) -> Self {
        self.unseal_timeout = timeout;
        self
    }
}
