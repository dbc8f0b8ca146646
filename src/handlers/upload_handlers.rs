//! HTTP handlers for the `/upload` resource.
//!
//! - `POST   /upload`          multipart `file` (exactly one) + optional `folder`
//! - `DELETE /upload?url=`     best-effort removal
//! - `GET    /upload?url=`     existence report as JSON
//! - `HEAD   /upload?url=`     same report, carried in `x-asset-*` headers

use crate::{
    errors::AppError,
    models::asset::{ExistsReport, StorageBackend},
    services::{
        naming::DEFAULT_FOLDER, storage_service::StorageService, validation::ValidationError,
    },
};
use axum::{
    Json,
    extract::{Multipart, Query, State, multipart::MultipartError},
    http::{HeaderMap, HeaderName, HeaderValue},
    response::IntoResponse,
};
use bytes::Bytes;
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

const EXISTS_HEADER: HeaderName = HeaderName::from_static("x-asset-exists");
const SIZE_HEADER: HeaderName = HeaderName::from_static("x-asset-size");
const UPLOADED_AT_HEADER: HeaderName = HeaderName::from_static("x-asset-uploaded-at");

#[derive(Debug, Deserialize)]
pub struct UrlQuery {
    pub url: Option<String>,
}

impl UrlQuery {
    fn require(self) -> Result<String, AppError> {
        self.url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .ok_or_else(|| AppError::bad_request("No URL provided"))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub url: String,
    pub filename: String,
    pub original_name: String,
    pub size: usize,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub storage_type: StorageBackend,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

struct FilePart {
    name: String,
    content_type: String,
    data: Bytes,
}

/// `POST /upload`
pub async fn upload_asset(
    State(service): State<StorageService>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let production = service.config().production;
    let max_bytes = service.config().max_bytes;
    let read_error = |err: MultipartError| AppError::from_multipart(err, max_bytes);

    let mut file: Option<FilePart> = None;
    let mut folder = DEFAULT_FOLDER.to_string();

    while let Some(field) = multipart.next_field().await.map_err(read_error)? {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("file") => {
                let name = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(read_error)?;
                // browsers send an empty, unnamed part when nothing was picked
                if name.is_empty() && data.is_empty() {
                    continue;
                }
                if file.is_some() {
                    return Err(AppError::bad_request("Only one file may be uploaded per request"));
                }
                file = Some(FilePart {
                    name,
                    content_type,
                    data,
                });
            }
            Some("folder") => {
                let value = field.text().await.map_err(read_error)?;
                if !value.trim().is_empty() {
                    folder = value;
                }
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| AppError::bad_request(ValidationError::MissingFile.to_string()))?;

    let asset = service
        .upload(file.data, &file.content_type, &file.name, &folder)
        .await
        .map_err(|err| AppError::from_storage(err, "upload", production))?;

    Ok(Json(UploadResponse {
        success: true,
        url: asset.url,
        filename: asset.key.filename,
        original_name: asset.original_name,
        size: asset.size,
        mime_type: asset.mime_type,
        storage_type: asset.backend,
    }))
}

/// `DELETE /upload?url=`
pub async fn delete_asset(
    State(service): State<StorageService>,
    Query(query): Query<UrlQuery>,
) -> Result<Json<DeleteResponse>, AppError> {
    let url = query.require()?;
    let production = service.config().production;

    service
        .delete(&url)
        .await
        .map_err(|err| AppError::from_storage(err, "delete", production))?;

    Ok(Json(DeleteResponse {
        success: true,
        message: "File deleted successfully".into(),
    }))
}

/// `GET`/`HEAD /upload?url=`
///
/// axum answers HEAD through the GET route and drops the body, so the report
/// is mirrored into headers.
pub async fn asset_status(
    State(service): State<StorageService>,
    Query(query): Query<UrlQuery>,
) -> Result<impl IntoResponse, AppError> {
    let url = query.require()?;
    let report = service.exists(&url).await;
    Ok((report_headers(&report), Json(report)))
}

fn report_headers(report: &ExistsReport) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        EXISTS_HEADER,
        HeaderValue::from_static(if report.exists { "true" } else { "false" }),
    );
    if let Some(size) = report.size {
        headers.insert(SIZE_HEADER, HeaderValue::from(size));
    }
    if let Some(uploaded_at) = report.uploaded_at {
        let stamp = uploaded_at.to_rfc3339_opts(SecondsFormat::Millis, true);
        if let Ok(value) = HeaderValue::from_str(&stamp) {
            headers.insert(UPLOADED_AT_HEADER, value);
        }
    }
    headers
}
