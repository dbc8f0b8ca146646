//! Health & readiness handlers.
//!
//! - GET /healthz  -> simple liveness ("ok")
//! - GET /readyz   -> readiness that checks the uploads directory and backend wiring

use crate::{models::asset::StorageBackend, services::storage_service::StorageService};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use std::collections::HashMap;
use tokio::fs;
use uuid::Uuid;

/// `GET /healthz`
///
/// Very small liveness probe. Always returns 200 OK with a plain JSON body.
/// This endpoint should be cheap and never perform I/O.
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

/// `GET /readyz`
///
/// Readiness probe that:
/// 1. Performs a best-effort write/read/delete in the local uploads root.
/// 2. Confirms the backend uploads are routed to was actually constructed.
///
/// Returns JSON describing each check. HTTP 200 when all checks pass,
/// HTTP 503 when any check fails.
pub async fn readyz(State(service): State<StorageService>) -> impl IntoResponse {
    let root = &service.config().uploads_root;

    // 1) Disk write/read/delete check
    let tmp_path = root.join(format!(".readyz-{}", Uuid::new_v4()));
    let disk_check = match fs::create_dir_all(root).await {
        Err(e) => (false, Some(format!("could not create uploads dir: {}", e))),
        Ok(()) => match fs::write(&tmp_path, b"readyz").await {
            Ok(_) => match fs::read(&tmp_path).await {
                Ok(bytes) => {
                    let cleanup = fs::remove_file(&tmp_path).await;
                    if bytes != b"readyz" {
                        (false, Some("file content mismatch".to_string()))
                    } else if let Err(e) = cleanup {
                        (true, Some(format!("could not remove tmp file: {}", e)))
                    } else {
                        (true, None)
                    }
                }
                Err(e) => {
                    let _ = fs::remove_file(&tmp_path).await; // best-effort cleanup
                    (false, Some(format!("could not read tmp file: {}", e)))
                }
            },
            Err(e) => (false, Some(format!("could not write tmp file: {}", e))),
        },
    };

    // 2) Backend wiring
    let backend = service.active_backend();
    let backend_check = if service.active_backend_ready() {
        (true, None)
    } else {
        (false, Some(format!("{} backend is not configured", backend)))
    };

    let overall_ok = disk_check.0 && backend_check.0;

    let mut checks = HashMap::new();
    checks.insert(
        "disk",
        CheckStatus {
            ok: disk_check.0,
            error: disk_check.1,
        },
    );
    checks.insert(
        "backend",
        CheckStatus {
            ok: backend_check.0,
            error: backend_check.1,
        },
    );

    let body = ReadyResponse {
        status: if overall_ok {
            "ok".into()
        } else {
            "error".into()
        },
        storage_type: backend,
        checks,
    };

    let status = if overall_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReadyResponse {
    status: String,
    storage_type: StorageBackend,
    checks: HashMap<&'static str, CheckStatus>,
}

#[derive(Serialize)]
struct CheckStatus {
    ok: bool,
    error: Option<String>,
}
