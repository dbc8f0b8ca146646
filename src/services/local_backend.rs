//! Local filesystem backend.
//!
//! Files live at `{root}/{folder}/{filename}` and are published as
//! `/uploads/{folder}/{filename}`. The layout is what stored URLs point at,
//! so it must stay stable.

use crate::{
    models::asset::{AssetMetadata, ObjectKey, StorageBackend},
    services::{
        backend::AssetBackend,
        naming::is_key_safe,
        storage_service::{StorageError, StorageResult},
    },
};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::{
    io::ErrorKind,
    path::PathBuf,
    time::Instant,
};
use tokio::{
    fs::{self, OpenOptions},
    io::AsyncWriteExt,
};
use tracing::{debug, info};

pub const LOCAL_URL_PREFIX: &str = "/uploads/";

#[derive(Clone, Debug)]
pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn url_for(key: &str) -> String {
        format!("{}{}", LOCAL_URL_PREFIX, key)
    }

    /// Backend-relative key of a local URL; `None` for foreign or unsafe URLs.
    fn key_from_url(url: &str) -> Option<&str> {
        let rest = url.trim().strip_prefix(LOCAL_URL_PREFIX)?;
        let key = rest.split(['?', '#']).next().unwrap_or(rest);
        is_key_safe(key).then_some(key)
    }

    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        if !is_key_safe(key) {
            return Err(StorageError::InvalidObjectKey(key.to_string()));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl AssetBackend for LocalBackend {
    fn kind(&self) -> StorageBackend {
        StorageBackend::Local
    }

    /// Never overwrites: an existing file at `key` is reported as a key conflict.
    async fn put(&self, key: &ObjectKey, data: Bytes, _content_type: &str) -> StorageResult<String> {
        let key = key.as_path();
        let path = self.key_to_path(&key)?;
        let start = Instant::now();

        if let Some(parent) = path.parent() {
            // create_dir_all tolerates concurrent creators
            fs::create_dir_all(parent).await?;
        }

        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                return Err(StorageError::KeyConflict(key));
            }
            Err(err) => return Err(StorageError::Io(err)),
        };

        let written: std::io::Result<()> = async {
            file.write_all(&data).await?;
            file.flush().await?;
            file.sync_all().await
        }
        .await;
        if let Err(err) = written {
            let _ = fs::remove_file(&path).await;
            return Err(StorageError::Io(err));
        }

        info!(
            path = %path.display(),
            key = %key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "local upload stored"
        );

        Ok(Self::url_for(&key))
    }

    async fn delete(&self, url: &str) -> StorageResult<()> {
        let Some(key) = Self::key_from_url(url) else {
            debug!(url, "not a local asset url, nothing to delete");
            return Ok(());
        };
        let path = self.key_to_path(key)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                info!(path = %path.display(), key, "local asset deleted");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "local asset already missing");
                Ok(())
            }
            Err(err) => Err(StorageError::Io(err)),
        }
    }

    async fn exists(&self, url: &str) -> StorageResult<Option<AssetMetadata>> {
        let Some(key) = Self::key_from_url(url) else {
            return Ok(None);
        };
        let path = self.key_to_path(key)?;

        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(Some(AssetMetadata {
                size: meta.len(),
                uploaded_at: meta.modified().ok().map(DateTime::<Utc>::from),
            })),
            Ok(_) => Ok(None),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StorageError::Io(err)),
        }
    }
}
