//! Asset storage service for the CMS admin panel.
//!
//! Uploads are validated, given a collision-resistant key and stored either on
//! local disk (development) or in a cloud blob store (production). Stored
//! assets are later inspected or deleted by their public URL alone.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use config::{AppConfig, StorageConfig};
pub use models::asset::{AssetReference, ExistsReport, StorageBackend, UploadedAsset};
pub use services::storage_service::{StorageError, StorageResult, StorageService};
