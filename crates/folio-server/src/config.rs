use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use folio_storage::S3Config;
use tracing::info;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub enum StorageBackend {
    Local { dir: PathBuf, public_url: String },
    S3(S3Config),
}

pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub allowed_origins: Vec<String>,
    pub storage: StorageBackend,
    pub max_upload_bytes: usize,
    pub cookie_secure: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let jwt_secret = env::var("FOLIO_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("FOLIO_JWT_SECRET is unset or still a placeholder");
        }

        let host = var_or("FOLIO_HOST", "0.0.0.0");
        let port: u16 = var_or("FOLIO_PORT", "3000")
            .parse()
            .context("FOLIO_PORT must be a port number")?;

        let allowed_origins = parse_origins(&env::var("FOLIO_ALLOWED_ORIGINS").unwrap_or_default());
        if allowed_origins.is_empty() {
            info!("FOLIO_ALLOWED_ORIGINS not set, cross-origin requests will be refused");
        }

        let storage = match var_or("FOLIO_STORAGE", "local").as_str() {
            "local" => StorageBackend::Local {
                dir: var_or("FOLIO_STORAGE_DIR", "./thumbnails").into(),
                public_url: format!(
                    "{}/uploads",
                    var_or("FOLIO_PUBLIC_URL", &format!("http://localhost:{port}"))
                        .trim_end_matches('/')
                ),
            },
            "s3" => StorageBackend::S3(S3Config {
                bucket: required("FOLIO_S3_BUCKET")?,
                region: required("FOLIO_S3_REGION")?,
                endpoint: env::var("FOLIO_S3_ENDPOINT").ok().filter(|v| !v.is_empty()),
            }),
            other => bail!("FOLIO_STORAGE must be 'local' or 's3', got {other:?}"),
        };

        let max_upload_bytes = match env::var("FOLIO_MAX_UPLOAD_BYTES") {
            Ok(v) => v.parse().context("FOLIO_MAX_UPLOAD_BYTES must be a byte count")?,
            Err(_) => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let cookie_secure = var_or("FOLIO_COOKIE_SECURE", "true") != "false";

        Ok(Self {
            host,
            port,
            db_path: var_or("FOLIO_DB_PATH", "folio.db").into(),
            jwt_secret,
            allowed_origins,
            storage,
            max_upload_bytes,
            cookie_secure,
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    })
}

fn required(key: &str) -> Result<String> {
    env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .with_context(|| format!("{key} is required for the s3 storage backend"))
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().trim_end_matches('/').to_string())
        .filter(|origin| !origin.is_empty())
        .collect()
}
