/// Database row types that carry columns never sent to clients.
/// View shapes (projects with counters, comments) come back as `folio_types` models.
use chrono::{DateTime, Utc};
use folio_types::models::{Project, PublicUser, UserProfile};

pub struct UserRow {
    pub id: i64,
    pub user_id: String,
    pub password: String,
    pub nickname: String,
    pub created_at: DateTime<Utc>,
}

impl UserRow {
    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            user_id: self.user_id.clone(),
            nickname: self.nickname.clone(),
        }
    }

    pub fn into_profile(self) -> UserProfile {
        UserProfile {
            id: self.id,
            user_id: self.user_id,
            nickname: self.nickname,
            created_at: self.created_at,
        }
    }
}

pub struct ProjectRow {
    pub project: Project,
    /// Object-storage key the thumbnail was uploaded under, if any.
    pub thumbnail_key: Option<String>,
}

/// Column values for inserting or overwriting a project.
pub struct ProjectFields<'a> {
    pub title: &'a str,
    pub user_id: &'a str,
    pub url: &'a str,
    pub thumbnail: Option<&'a str>,
    pub description: &'a str,
}

/// Outcome of a server-side like toggle.
pub struct LikeToggle {
    /// State after the toggle.
    pub liked: bool,
    pub project: folio_types::models::ProjectSummary,
}
