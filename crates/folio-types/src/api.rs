use serde::{Deserialize, Serialize};

use crate::models::{Comment, CommentView, Project, ProjectSummary, PublicUser, UserProfile};

// -- Session --

/// Signed session token payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: String,
    pub id: i64,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// -- Users --

#[derive(Debug, Deserialize)]
pub struct NicknameCheckRequest {
    pub nickname: String,
}

#[derive(Debug, Deserialize)]
pub struct UsernameCheckRequest {
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub available: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub nickname: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: PublicUser,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: UserProfile,
}

// -- Projects --

#[derive(Debug, Deserialize)]
pub struct UpdateProjectRequest {
    pub title: String,
    pub user_id: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct ProjectSavedResponse {
    pub message: String,
    pub project: Project,
}

#[derive(Debug, Serialize)]
pub struct ProjectListResponse {
    pub projects: Vec<ProjectSummary>,
}

#[derive(Debug, Serialize)]
pub struct ProjectDetailResponse {
    pub project: ProjectSummary,
}

// -- Likes --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleLikeRequest {
    pub project_id: i64,
    /// What the client believes the current state is. Informational only:
    /// the server decides from stored state.
    #[serde(default)]
    pub liked: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ToggleLikeResponse {
    pub message: String,
    pub liked: bool,
    pub project: ProjectSummary,
}

// -- Comments --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub project_id: Option<i64>,
    pub user_id: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CommentCreatedResponse {
    pub message: String,
    pub comment: Comment,
}

#[derive(Debug, Serialize)]
pub struct CommentListResponse {
    pub comments: Vec<CommentView>,
}
