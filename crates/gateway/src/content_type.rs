//! Extension → MIME type table used to label unsealed responses.

use std::collections::HashMap;
use std::path::Path;

use axum::http::HeaderValue;
use thiserror::Error;

/// Table applied when `CONTENT_TYPES` is not set.
pub const DEFAULT_CONTENT_TYPES: &str =
    "jpg=image/jpeg,jpeg=image/jpeg,png=image/png,bmp=image/bmp";

/// Content type for extensions missing from the table.
pub const DEFAULT_FALLBACK: &str = "application/octet-stream";

/// Errors from parsing a content-type table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContentTypeError {
    /// An entry is not of the form `ext=type/subtype`.
    #[error("invalid content-type entry: {0:?}")]
    InvalidEntry(String),

    /// A MIME type cannot be used as an HTTP header value.
    #[error("invalid content type value: {0:?}")]
    InvalidValue(String),
}

/// Closed mapping from lowercase file extension to content type, plus the
/// value served for anything not in the map.
#[derive(Debug, Clone)]
pub struct ContentTypeTable {
    by_extension: HashMap<String, HeaderValue>,
    fallback: HeaderValue,
}

impl ContentTypeTable {
    /// Parse a comma-separated `ext=mime` list, e.g. `"png=image/png,bmp=image/bmp"`.
    ///
    /// Extensions are matched case-insensitively and may be written with or
    /// without a leading dot.
    ///
    /// # Errors
    ///
    /// Returns [`ContentTypeError`] on a malformed entry or header value.
    pub fn parse(table: &str, fallback: &str) -> Result<Self, ContentTypeError> {
        let mut by_extension = HashMap::new();
        for entry in table.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (ext, mime) = entry
                .split_once('=')
                .ok_or_else(|| ContentTypeError::InvalidEntry(entry.to_owned()))?;
            let ext = ext.trim().trim_start_matches('.').to_ascii_lowercase();
            let mime = mime.trim();
            if ext.is_empty() || !mime.contains('/') {
                return Err(ContentTypeError::InvalidEntry(entry.to_owned()));
            }
            by_extension.insert(ext, header_value(mime)?);
        }
        Ok(Self {
            by_extension,
            fallback: header_value(fallback.trim())?,
        })
    }

    /// Content type for `resource`, chosen by the text after its last `.`.
    pub fn for_path(&self, resource: &Path) -> &HeaderValue {
        resource
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.by_extension.get(&ext.to_ascii_lowercase()))
            .unwrap_or(&self.fallback)
    }

    pub fn len(&self) -> usize {
        self.by_extension.len()
    }

    /// True when no extension is mapped and every file gets the fallback.
    pub fn is_empty(&self) -> bool {
        self.by_extension.is_empty()
    }
}

impl Default for ContentTypeTable {
    fn default() -> Self {
        Self {
            by_extension: [
                ("jpg", "image/jpeg"),
                ("jpeg", "image/jpeg"),
                ("png", "image/png"),
                ("bmp", "image/bmp"),
            ]
            .into_iter()
            .map(|(ext, mime)| (ext.to_owned(), HeaderValue::from_static(mime)))
            .collect(),
            fallback: HeaderValue::from_static(DEFAULT_FALLBACK),
        }
    }
}

fn header_value(mime: &str) -> Result<HeaderValue, ContentTypeError> {
    HeaderValue::from_str(mime).map_err(|_| ContentTypeError::InvalidValue(mime.to_owned()))
}
