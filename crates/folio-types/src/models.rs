use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The authenticated caller, as carried inside a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Login handle.
    pub user_id: String,
    /// Numeric row id.
    pub id: i64,
}

/// User fields safe to hand back to a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: i64,
    pub user_id: String,
    pub nickname: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub user_id: String,
    pub nickname: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub title: String,
    /// Handle of the owning user.
    pub user_id: String,
    pub url: String,
    pub thumbnail: Option<String>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// A project together with its owner's nickname and aggregate counters,
/// as seen by one particular viewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSummary {
    #[serde(flatten)]
    pub project: Project,
    pub nickname: String,
    pub like_count: i64,
    pub comment_count: i64,
    /// Whether the viewer likes this project. Always false for anonymous viewers.
    pub liked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub user_id: String,
    pub project_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A comment joined with its author's nickname.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentView {
    pub id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub user_id: String,
    pub nickname: String,
}
