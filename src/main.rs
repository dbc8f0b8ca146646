use anyhow::Result;
use asset_store::{AppConfig, StorageService, routes};
use std::{fs, io::ErrorKind};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config ---
    let cfg = AppConfig::from_env_and_args()?;

    tracing::info!("Starting asset-store with config: {:?}", cfg);

    // --- Ensure uploads directory exists ---
    let uploads_root = &cfg.storage.uploads_root;
    if !uploads_root.exists() {
        fs::create_dir_all(uploads_root)?;
        tracing::info!("Created uploads directory at {}", uploads_root.display());
    }

    // --- Initialize core service ---
    let storage = StorageService::new(cfg.storage.clone())?;
    tracing::info!(
        backend = %storage.active_backend(),
        cloud_credential = cfg.storage.has_cloud_credential(),
        "Storage backend selected"
    );

    // --- Build router ---
    let app = routes::routes::app(storage);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
