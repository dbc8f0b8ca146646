//! Backend capability trait, backend selection and URL attribution.

use crate::{
    config::StorageConfig,
    models::asset::{AssetMetadata, ObjectKey, StorageBackend},
    services::{
        blob_backend::BlobBackend,
        local_backend::{LOCAL_URL_PREFIX, LocalBackend},
        storage_service::StorageResult,
    },
};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Url;
use std::sync::Arc;

/// What every physical store offers the facade.
///
/// `delete` and `exists` take the public URL handed out by `put`.
/// Absence is never an error: `delete` succeeds and `exists` yields `None`.
#[async_trait]
pub trait AssetBackend: Send + Sync {
    fn kind(&self) -> StorageBackend;

    /// Store `data` under `key` and return its public URL.
    async fn put(&self, key: &ObjectKey, data: Bytes, content_type: &str) -> StorageResult<String>;

    async fn delete(&self, url: &str) -> StorageResult<()>;

    async fn exists(&self, url: &str) -> StorageResult<Option<AssetMetadata>>;
}

/// Cloud iff running in production with a cloud write credential; local otherwise.
pub fn select_backend(config: &StorageConfig) -> StorageBackend {
    if config.production && config.has_cloud_credential() {
        StorageBackend::Cloud
    } else {
        StorageBackend::Local
    }
}

/// Attribute a stored URL to the backend that produced it.
///
/// Local URLs are root-relative below `/uploads/`. Cloud URLs are absolute
/// http(s) URLs on the blob store's public host or one of its subdomains.
/// Anything else is foreign and yields `None`.
pub fn classify_url(url: &str, config: &StorageConfig) -> Option<StorageBackend> {
    let url = url.trim();
    if url.starts_with(LOCAL_URL_PREFIX) {
        return Some(StorageBackend::Local);
    }

    let parsed = Url::parse(url).ok()?;
    if !matches!(parsed.scheme(), "https" | "http") {
        return None;
    }
    let host = parsed.host_str()?.to_ascii_lowercase();
    let public_host = config.blob_public_host.trim_matches('.').to_ascii_lowercase();
    if public_host.is_empty() {
        return None;
    }
    if host == public_host || host.ends_with(&format!(".{}", public_host)) {
        Some(StorageBackend::Cloud)
    } else {
        None
    }
}

/// The backends a facade dispatches to. The cloud slot is empty without a credential.
#[derive(Clone)]
pub struct Backends {
    pub local: Arc<dyn AssetBackend>,
    pub cloud: Option<Arc<dyn AssetBackend>>,
}

impl Backends {
    /// Build the real backends from configuration.
    pub fn from_config(config: &StorageConfig) -> StorageResult<Self> {
        let local: Arc<dyn AssetBackend> = Arc::new(LocalBackend::new(&config.uploads_root));
        let cloud = BlobBackend::from_config(config)?
            .map(|backend| Arc::new(backend) as Arc<dyn AssetBackend>);
        Ok(Self { local, cloud })
    }
}
