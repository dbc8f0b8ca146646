//! Defines routes for the asset upload service.
//!
//! ## Structure
//! - `POST   /upload`         : validate and store a multipart `file`
//! - `DELETE /upload?url=`    : delete an asset by its public URL
//! - `GET    /upload?url=`    : existence report (HEAD answers through the same route)
//! - `GET    /uploads/{*path}`: files written by the local backend
//! - `GET    /healthz`, `GET /readyz`: probes

use crate::{
    handlers::{
        health_handlers::{healthz, readyz},
        upload_handlers::{asset_status, delete_asset, upload_asset},
    },
    services::storage_service::StorageService,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::{services::ServeDir, trace::TraceLayer};

/// Room for multipart boundaries, headers and the `folder` field on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build the router for all asset routes.
///
/// The uploads directory and the request body limit come from the service's
/// configuration. The router carries the `StorageService` to all handlers.
pub fn routes(service: &StorageService) -> Router<StorageService> {
    let config = service.config();
    let body_limit = config.max_bytes.saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route(
            "/upload",
            post(upload_asset)
                .layer(DefaultBodyLimit::max(body_limit))
                .delete(delete_asset)
                .get(asset_status),
        )
        .nest_service("/uploads", ServeDir::new(&config.uploads_root))
        .layer(TraceLayer::new_for_http())
}

/// Router with state attached, ready to serve.
pub fn app(service: StorageService) -> Router {
    routes(&service).with_state(service)
}
