//! Represents a stored upload and the results of inspecting one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Physical storage backend owning an asset.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Files below the public uploads directory.
    Local,
    /// Objects in the managed blob store.
    Cloud,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Local => "local",
            StorageBackend::Cloud => "cloud",
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A backend-relative object key, `{folder}/{filename}`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    /// Sanitized folder, never empty, no leading or trailing `/`.
    pub folder: String,
    /// `{epochMillis}-{token}.{ext}`
    pub filename: String,
}

impl ObjectKey {
    pub fn as_path(&self) -> String {
        format!("{}/{}", self.folder, self.filename)
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.folder, self.filename)
    }
}

/// Everything needed to find an asset again.
///
/// The backend tag is recorded at creation. URLs persisted without it are
/// attributed by shape instead (see `StorageService::classify`).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AssetReference {
    pub url: String,
    pub folder: String,
    pub object_key: String,
    pub backend: StorageBackend,
}

/// Result of a successful upload.
#[derive(Clone, Debug)]
pub struct UploadedAsset {
    pub url: String,
    pub key: ObjectKey,
    pub size: usize,
    pub mime_type: String,
    pub original_name: String,
    pub backend: StorageBackend,
}

impl UploadedAsset {
    pub fn reference(&self) -> AssetReference {
        AssetReference {
            url: self.url.clone(),
            folder: self.key.folder.clone(),
            object_key: self.key.as_path(),
            backend: self.backend,
        }
    }
}

/// What a backend knows about a stored object without downloading it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetMetadata {
    pub size: u64,
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// Answer to an existence probe. Absent and unattributable URLs both report `exists = false`.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExistsReport {
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<DateTime<Utc>>,
}

impl ExistsReport {
    pub fn missing() -> Self {
        Self {
            exists: false,
            size: None,
            uploaded_at: None,
        }
    }

    pub fn found(meta: AssetMetadata) -> Self {
        Self {
            exists: true,
            size: Some(meta.size),
            uploaded_at: meta.uploaded_at,
        }
    }
}
