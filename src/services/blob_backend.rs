//! Cloud blob backend speaking the blob store's HTTP API.
//!
//! - `PUT    {api}/{key}`      store an object under an explicit key
//! - `GET    {api}/?url={url}` metadata probe, no download
//! - `POST   {api}/delete`     delete by public URL
//!
//! Every request is authenticated with the bearer write token and bounded by
//! the client timeout. The store assigns the public URL it returns from `PUT`.

use crate::{
    config::StorageConfig,
    models::asset::{AssetMetadata, ObjectKey, StorageBackend},
    services::{
        backend::AssetBackend,
        storage_service::{StorageError, StorageResult},
    },
};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

const API_VERSION: &str = "7";

#[derive(Clone, Debug)]
pub struct BlobBackend {
    client: Client,
    api_url: String,
    token: String,
}

#[derive(Deserialize)]
struct PutBlobResponse {
    url: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HeadBlobResponse {
    size: u64,
    uploaded_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
struct DeleteBlobRequest<'a> {
    urls: [&'a str; 1],
}

impl BlobBackend {
    pub fn new(
        api_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> StorageResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StorageError::Config(format!("building blob client: {}", e)))?;

        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    /// `None` when no write credential is configured.
    pub fn from_config(config: &StorageConfig) -> StorageResult<Option<Self>> {
        if !config.has_cloud_credential() {
            return Ok(None);
        }
        let token = config.blob_token.clone().unwrap_or_default();
        Self::new(&config.blob_api_url, token.trim(), config.cloud_timeout).map(Some)
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .bearer_auth(&self.token)
            .header("x-api-version", API_VERSION)
    }
}

#[async_trait]
impl AssetBackend for BlobBackend {
    fn kind(&self) -> StorageBackend {
        StorageBackend::Cloud
    }

    async fn put(&self, key: &ObjectKey, data: Bytes, content_type: &str) -> StorageResult<String> {
        let key = key.as_path();
        let size = data.len();
        let start = Instant::now();

        let response = self
            .request(self.client.put(format!("{}/{}", self.api_url, key)))
            .header("x-content-type", content_type)
            .header("x-add-random-suffix", "0")
            .body(data)
            .send()
            .await
            .map_err(send_error)?;

        if !response.status().is_success() {
            let err = status_error(response).await;
            error!(key = %key, error = %err, "cloud upload failed");
            return Err(err);
        }

        let body: PutBlobResponse = response
            .json()
            .await
            .map_err(|e| decode_error("upload", e))?;

        info!(
            key = %key,
            url = %body.url,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "cloud upload stored"
        );
        Ok(body.url)
    }

    async fn delete(&self, url: &str) -> StorageResult<()> {
        let response = self
            .request(self.client.post(format!("{}/delete", self.api_url)))
            .json(&DeleteBlobRequest { urls: [url] })
            .send()
            .await
            .map_err(send_error)?;

        match response.status() {
            status if status.is_success() => {
                info!(url, "cloud asset deleted");
                Ok(())
            }
            StatusCode::NOT_FOUND => {
                debug!(url, "cloud asset already missing");
                Ok(())
            }
            _ => Err(status_error(response).await),
        }
    }

    async fn exists(&self, url: &str) -> StorageResult<Option<AssetMetadata>> {
        let response = self
            .request(self.client.get(format!("{}/", self.api_url)))
            .query(&[("url", url)])
            .send()
            .await
            .map_err(send_error)?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let head: HeadBlobResponse = response
                    .json()
                    .await
                    .map_err(|e| decode_error("head", e))?;
                Ok(Some(AssetMetadata {
                    size: head.size,
                    uploaded_at: head.uploaded_at,
                }))
            }
            _ => Err(status_error(response).await),
        }
    }
}

fn send_error(err: reqwest::Error) -> StorageError {
    if err.is_timeout() {
        StorageError::Timeout(err.to_string())
    } else {
        StorageError::Network(err.to_string())
    }
}

/// Body reads share the request's deadline, so a stalled body is a timeout too.
fn decode_error(what: &str, err: reqwest::Error) -> StorageError {
    if err.is_timeout() {
        StorageError::Timeout(format!("reading {} response: {}", what, err))
    } else {
        StorageError::Network(format!("decoding {} response: {}", what, err))
    }
}

async fn status_error(response: Response) -> StorageError {
    let status = response.status();
    let message = response.text().await.unwrap_or_default();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StorageError::Unauthorized(message),
        _ => StorageError::Cloud {
            status: status.as_u16(),
            message,
        },
    }
}
