use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use folio_types::api::{
    CommentCreatedResponse, CommentListResponse, CreateCommentRequest, MessageResponse,
};

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::state::{AppState, blocking_db};

/// POST /api/comments
pub async fn create_comment(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(project_id), Some(user_id), Some(content)) = (req.project_id, req.user_id, req.content)
    else {
        return Err(ApiError::Validation("All fields are required".into()));
    };
    if project_id <= 0 || user_id.trim().is_empty() || content.trim().is_empty() {
        return Err(ApiError::Validation("All fields are required".into()));
    }

    let comment =
        blocking_db(&state, move |db| db.create_comment(&user_id, project_id, &content)).await??;

    Ok((
        StatusCode::CREATED,
        Json(CommentCreatedResponse {
            message: "Comment added".into(),
            comment,
        }),
    ))
}

/// GET /api/comments/{project_id}
pub async fn list_comments(
    State(state): State<AppState>,
    ApiPath(project_id): ApiPath<i64>,
) -> Result<Json<CommentListResponse>, ApiError> {
    let comments = blocking_db(&state, move |db| db.list_comments(project_id)).await??;
    Ok(Json(CommentListResponse { comments }))
}

/// DELETE /api/comments/{id}
pub async fn delete_comment(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    let deleted = blocking_db(&state, move |db| db.delete_comment(id)).await??;
    if !deleted {
        return Err(ApiError::NotFound("Comment not found"));
    }
    Ok(Json(MessageResponse::new("Comment deleted")))
}
