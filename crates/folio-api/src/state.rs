use std::sync::Arc;

use folio_db::Database;
use folio_storage::ThumbnailStore;

use crate::credentials::PasswordHasher;
use crate::error::ApiError;
use crate::token::TokenService;

pub type AppState = Arc<AppStateInner>;

/// Long-lived dependencies, built once at startup and shared by every request.
pub struct AppStateInner {
    pub db: Database,
    pub tokens: TokenService,
    pub passwords: PasswordHasher,
    pub thumbnails: Arc<dyn ThumbnailStore>,
    /// Mark the session cookie `Secure` (and `SameSite=None`).
    pub cookie_secure: bool,
    /// Body limit for multipart project uploads.
    pub max_upload_bytes: usize,
}

/// Run a blocking database call off the async runtime.
///
/// The outer error is a failed task join; the inner one is the query's own
/// result so callers can inspect conflicts before converting.
pub async fn blocking_db<F, T>(state: &AppState, f: F) -> Result<folio_db::Result<T>, ApiError>
where
    F: FnOnce(&Database) -> folio_db::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| ApiError::Internal(anyhow::Error::new(e).context("spawn_blocking join error")))
}
