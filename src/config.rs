use anyhow::{Context, Result};
use clap::Parser;
use std::{env, fmt, path::PathBuf, time::Duration};

use crate::services::validation::{DEFAULT_ALLOWED_TYPES, DEFAULT_MAX_BYTES};

pub const DEFAULT_BLOB_API_URL: &str = "https://blob.vercel-storage.com";
pub const DEFAULT_BLOB_PUBLIC_HOST: &str = "public.blob.vercel-storage.com";
const DEFAULT_CLOUD_TIMEOUT_SECS: u64 = 30;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage: StorageConfig,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Asset upload service for the CMS admin panel")]
pub struct Args {
    /// Host to bind to (overrides ASSET_STORE_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides ASSET_STORE_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory served under /uploads (overrides ASSET_STORE_UPLOADS_DIR)
    #[arg(long)]
    pub uploads_dir: Option<String>,

    /// Run as a managed/production deployment (overrides ASSET_STORE_PRODUCTION)
    #[arg(long)]
    pub production: bool,

    /// Blob store API base URL (overrides ASSET_STORE_BLOB_API_URL)
    #[arg(long)]
    pub blob_api_url: Option<String>,

    /// Maximum accepted upload size in bytes (overrides ASSET_STORE_MAX_BYTES)
    #[arg(long)]
    pub max_bytes: Option<usize>,
}

/// Everything the storage facade needs, constructed once and injected.
///
/// Nothing below the HTTP layer reads the process environment; tests build
/// this value directly.
#[derive(Clone)]
pub struct StorageConfig {
    /// Root of the local backend; files land in `{uploads_root}/{folder}/{filename}`.
    pub uploads_root: PathBuf,
    /// Managed-environment flag. Also hides error details in responses.
    pub production: bool,
    /// Cloud write credential. Its presence (together with `production`) selects the cloud backend.
    pub blob_token: Option<String>,
    pub blob_api_url: String,
    /// Host suffix identifying public cloud URLs.
    pub blob_public_host: String,
    pub max_bytes: usize,
    pub allowed_types: Vec<String>,
    pub cloud_timeout: Duration,
}

impl StorageConfig {
    /// Development defaults rooted at `uploads_root`: local backend, image allow-list, 5 MiB.
    pub fn local(uploads_root: impl Into<PathBuf>) -> Self {
        Self {
            uploads_root: uploads_root.into(),
            production: false,
            blob_token: None,
            blob_api_url: DEFAULT_BLOB_API_URL.to_string(),
            blob_public_host: DEFAULT_BLOB_PUBLIC_HOST.to_string(),
            max_bytes: DEFAULT_MAX_BYTES,
            allowed_types: DEFAULT_ALLOWED_TYPES.iter().map(|t| t.to_string()).collect(),
            cloud_timeout: Duration::from_secs(DEFAULT_CLOUD_TIMEOUT_SECS),
        }
    }

    pub fn has_cloud_credential(&self) -> bool {
        self.blob_token
            .as_deref()
            .is_some_and(|token| !token.trim().is_empty())
    }
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("uploads_root", &self.uploads_root)
            .field("production", &self.production)
            .field("blob_token", &self.blob_token.as_ref().map(|_| "<redacted>"))
            .field("blob_api_url", &self.blob_api_url)
            .field("blob_public_host", &self.blob_public_host)
            .field("max_bytes", &self.max_bytes)
            .field("allowed_types", &self.allowed_types)
            .field("cloud_timeout", &self.cloud_timeout)
            .finish()
    }
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        // Parse CLI once
        let args = Args::parse();

        // --- Environment fallback ---
        let env_host = env::var("ASSET_STORE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = parse_env("ASSET_STORE_PORT", 3000u16)?;
        let env_uploads =
            env::var("ASSET_STORE_UPLOADS_DIR").unwrap_or_else(|_| "./public/uploads".into());
        let env_production = env::var("ASSET_STORE_PRODUCTION")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        let env_api =
            env::var("ASSET_STORE_BLOB_API_URL").unwrap_or_else(|_| DEFAULT_BLOB_API_URL.into());
        let env_max_bytes = parse_env("ASSET_STORE_MAX_BYTES", DEFAULT_MAX_BYTES)?;
        let timeout_secs =
            parse_env("ASSET_STORE_CLOUD_TIMEOUT_SECS", DEFAULT_CLOUD_TIMEOUT_SECS)?;

        let allowed_types = match env::var("ASSET_STORE_ALLOWED_TYPES") {
            Ok(list) => list
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
            Err(_) => DEFAULT_ALLOWED_TYPES.iter().map(|t| t.to_string()).collect(),
        };

        // --- Merge ---
        let storage = StorageConfig {
            uploads_root: PathBuf::from(args.uploads_dir.unwrap_or(env_uploads)),
            production: args.production || env_production,
            blob_token: env::var("BLOB_READ_WRITE_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),
            blob_api_url: args.blob_api_url.unwrap_or(env_api),
            blob_public_host: env::var("ASSET_STORE_BLOB_PUBLIC_HOST")
                .unwrap_or_else(|_| DEFAULT_BLOB_PUBLIC_HOST.into()),
            max_bytes: args.max_bytes.unwrap_or(env_max_bytes),
            allowed_types,
            cloud_timeout: Duration::from_secs(timeout_secs),
        };

        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            storage,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_env<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("parsing {} value `{}`", name, value)),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("reading {}", name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_defaults_have_no_cloud_credential() {
        let cfg = StorageConfig::local("/tmp/uploads");
        assert!(!cfg.production);
        assert!(!cfg.has_cloud_credential());
        assert_eq!(cfg.max_bytes, 5 * 1024 * 1024);
        assert!(cfg.allowed_types.iter().any(|t| t == "image/svg+xml"));
    }

    #[test]
    fn blank_token_is_not_a_credential() {
        let mut cfg = StorageConfig::local("/tmp/uploads");
        cfg.blob_token = Some("   ".into());
        assert!(!cfg.has_cloud_credential());
    }

    #[test]
    fn debug_output_redacts_token() {
        let mut cfg = StorageConfig::local("/tmp/uploads");
        cfg.blob_token = Some("vercel_blob_rw_secret".into());
        let printed = format!("{:?}", cfg);
        assert!(!printed.contains("vercel_blob_rw_secret"));
        assert!(printed.contains("<redacted>"));
    }
}
