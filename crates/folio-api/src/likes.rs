use axum::{Extension, Json, extract::State};
use folio_types::api::{ToggleLikeRequest, ToggleLikeResponse};
use folio_types::models::Identity;
use tracing::debug;

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::{AppState, blocking_db};

/// POST /api/like (session required)
///
/// Add or remove the caller's like depending on what is stored, not on the
/// `liked` flag the client sends.
pub async fn toggle_like(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(req): ApiJson<ToggleLikeRequest>,
) -> Result<Json<ToggleLikeResponse>, ApiError> {
    let project_id = req.project_id;
    let user_id = identity.user_id.clone();

    let toggle = blocking_db(&state, move |db| db.toggle_like(&user_id, project_id))
        .await??
        .ok_or(ApiError::NotFound("Project not found"))?;

    if req.liked == Some(toggle.liked) {
        // Client thought it was in the state we just moved into
        debug!(
            "Stale like state from {} for project {}",
            identity.user_id, project_id
        );
    }

    let message = if toggle.liked { "Like added" } else { "Like removed" };
    Ok(Json(ToggleLikeResponse {
        message: message.into(),
        liked: toggle.liked,
        project: toggle.project,
    }))
}
