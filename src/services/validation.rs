//! Upload policy: MIME allow-list and size ceiling, checked before any I/O.
//!
//! The declared content type is trusted as sent; file contents are never sniffed.

use crate::config::StorageConfig;
use thiserror::Error;

pub const DEFAULT_MAX_BYTES: usize = 5 * 1024 * 1024;
pub const DEFAULT_ALLOWED_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/svg+xml",
];

/// Client-caused rejections. All of them map to a 400 response.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No file provided")]
    MissingFile,
    #[error("Invalid file type `{mime}`. Allowed types: {allowed}")]
    UnsupportedType { mime: String, allowed: String },
    #[error("File too large: {size} bytes exceeds the limit of {max} bytes")]
    TooLarge { size: usize, max: usize },
    #[error("File too large: request exceeds the limit of {max} bytes")]
    BodyTooLarge { max: usize },
    #[error("Invalid folder `{folder}`: {reason}")]
    InvalidFolder { folder: String, reason: String },
}

#[derive(Clone, Debug)]
pub struct UploadPolicy {
    allowed_types: Vec<String>,
    max_bytes: usize,
}

impl UploadPolicy {
    /// An empty allow-list rejects every upload.
    pub fn new<I, S>(allowed_types: I, max_bytes: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed_types: allowed_types
                .into_iter()
                .map(|t| essence(t.as_ref()))
                .filter(|t| !t.is_empty())
                .collect(),
            max_bytes,
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(&config.allowed_types, config.max_bytes)
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub fn allowed_types(&self) -> &[String] {
        &self.allowed_types
    }

    /// Accepts `len == max_bytes`; rejects anything larger.
    pub fn validate(&self, len: usize, declared_type: &str) -> Result<(), ValidationError> {
        let mime = essence(declared_type);
        if !self.allowed_types.iter().any(|allowed| *allowed == mime) {
            return Err(ValidationError::UnsupportedType {
                mime: declared_type.to_string(),
                allowed: self.allowed_types.join(", "),
            });
        }

        if len > self.max_bytes {
            return Err(ValidationError::TooLarge {
                size: len,
                max: self.max_bytes,
            });
        }

        Ok(())
    }
}

/// `Image/PNG; charset=binary` -> `image/png`
fn essence(mime: &str) -> String {
    mime.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
