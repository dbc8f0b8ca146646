//! src/services/storage_service.rs
//!
//! StorageService: the only entry point for uploads. It validates, names,
//! picks a backend from the injected `StorageConfig` and dispatches. Delete and
//! exists work from a public URL alone: the URL's shape tells which backend
//! owns it.

use crate::{
    config::StorageConfig,
    models::asset::{AssetReference, ExistsReport, StorageBackend, UploadedAsset},
    services::{
        backend::{AssetBackend, Backends, classify_url, select_backend},
        naming::next_key,
        validation::{UploadPolicy, ValidationError},
    },
};
use bytes::Bytes;
use std::{io, sync::Arc};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Attempts at finding an unused key before giving up on an upload.
const MAX_KEY_ATTEMPTS: usize = 3;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("object key `{0}` already exists")]
    KeyConflict(String),
    #[error("invalid object key `{0}`")]
    InvalidObjectKey(String),
    #[error("cloud storage rejected the credential: {0}")]
    Unauthorized(String),
    #[error("cloud storage returned {status}: {message}")]
    Cloud { status: u16, message: String },
    #[error("cloud storage request timed out: {0}")]
    Timeout(String),
    #[error("cloud storage request failed: {0}")]
    Network(String),
    #[error("storage misconfigured: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Clone)]
pub struct StorageService {
    config: Arc<StorageConfig>,
    policy: Arc<UploadPolicy>,
    backends: Backends,
}

impl StorageService {
    /// Build the service and its real backends from configuration.
    pub fn new(config: StorageConfig) -> StorageResult<Self> {
        let backends = Backends::from_config(&config)?;
        Ok(Self::with_backends(config, backends))
    }

    /// Build the service around caller-supplied backends.
    pub fn with_backends(config: StorageConfig, backends: Backends) -> Self {
        Self {
            policy: Arc::new(UploadPolicy::from_config(&config)),
            config: Arc::new(config),
            backends,
        }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Backend new uploads go to right now. Re-evaluated on every call.
    pub fn active_backend(&self) -> StorageBackend {
        select_backend(&self.config)
    }

    /// Whether the backend new uploads go to was constructed.
    pub fn active_backend_ready(&self) -> bool {
        self.backend(self.active_backend()).is_ok()
    }

    /// Which backend produced `url`, if any.
    pub fn classify(&self, url: &str) -> Option<StorageBackend> {
        classify_url(url, &self.config)
    }

    fn backend(&self, kind: StorageBackend) -> StorageResult<&Arc<dyn AssetBackend>> {
        match kind {
            StorageBackend::Local => Ok(&self.backends.local),
            StorageBackend::Cloud => self.backends.cloud.as_ref().ok_or_else(|| {
                StorageError::Config("cloud storage credential is not configured".into())
            }),
        }
    }

    /// Validate and store one file.
    ///
    /// Validation runs first; a rejected file never reaches a backend.
    /// A key collision reported by the backend triggers a fresh key, up to
    /// `MAX_KEY_ATTEMPTS` times.
    pub async fn upload(
        &self,
        data: Bytes,
        mime_type: &str,
        original_name: &str,
        folder: &str,
    ) -> StorageResult<UploadedAsset> {
        self.policy.validate(data.len(), mime_type)?;
        let mut key = next_key(original_name, folder)?;

        let kind = self.active_backend();
        let backend = self.backend(kind)?;

        let mut attempt = 1;
        let url = loop {
            match backend.put(&key, data.clone(), mime_type).await {
                Ok(url) => break url,
                Err(StorageError::KeyConflict(taken)) if attempt < MAX_KEY_ATTEMPTS => {
                    warn!(key = %taken, attempt, "object key collision, retrying with a new key");
                    attempt += 1;
                    key = next_key(original_name, folder)?;
                }
                Err(err) => return Err(err),
            }
        };

        info!(
            url = %url,
            backend = %backend.kind(),
            size_bytes = data.len(),
            mime_type,
            "asset uploaded"
        );

        Ok(UploadedAsset {
            url,
            key,
            size: data.len(),
            mime_type: mime_type.to_string(),
            original_name: original_name.to_string(),
            backend: kind,
        })
    }

    /// Best-effort removal by URL.
    ///
    /// Already-missing objects and URLs no backend claims both succeed. Only
    /// genuine backend failures (I/O, credential, network, timeout) are errors.
    pub async fn delete(&self, url: &str) -> StorageResult<()> {
        let Some(kind) = self.classify(url) else {
            debug!(url, "url not owned by any backend, skipping delete");
            return Ok(());
        };
        self.backend(kind)?.delete(url).await
    }

    /// Delete using the backend tag recorded at upload time.
    pub async fn delete_reference(&self, reference: &AssetReference) -> StorageResult<()> {
        self.backend(reference.backend)?.delete(&reference.url).await
    }

    /// Advisory existence probe. Never fails: foreign URLs and probe errors
    /// report `exists = false`.
    pub async fn exists(&self, url: &str) -> ExistsReport {
        let Some(kind) = self.classify(url) else {
            return ExistsReport::missing();
        };
        let backend = match self.backend(kind) {
            Ok(backend) => backend,
            Err(err) => {
                debug!(url, error = %err, "no backend available for url");
                return ExistsReport::missing();
            }
        };

        match backend.exists(url).await {
            Ok(Some(meta)) => ExistsReport::found(meta),
            Ok(None) => ExistsReport::missing(),
            Err(err) => {
                warn!(url, backend = %kind, error = %err, "existence probe failed");
                ExistsReport::missing()
            }
        }
    }
}
