use axum::{
    Extension, Json,
    extract::{Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
    response::IntoResponse,
};
use bytes::Bytes;
use folio_db::DbError;
use folio_db::models::ProjectFields;
use folio_storage::thumbnail_key;
use folio_types::api::{
    MessageResponse, ProjectDetailResponse, ProjectListResponse, ProjectSavedResponse,
    UpdateProjectRequest,
};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, require_fields};
use crate::middleware::Viewer;
use crate::state::{AppState, blocking_db};

const DUPLICATE_TITLE: &str = "A project with the same title already exists";
const NOT_FOUND: &str = "Project not found";
const BAD_THUMBNAIL_NAME: &str = "Title cannot be used to name a thumbnail";
const THUMBNAIL_TAKEN: &str = "A renamed project still uses the thumbnail for this title";

#[derive(Default)]
struct ProjectForm {
    title: String,
    user_id: String,
    url: String,
    description: String,
    thumbnail: Option<Upload>,
}

struct Upload {
    data: Bytes,
    content_type: String,
}

async fn read_project_form(mut multipart: Multipart) -> Result<ProjectForm, ApiError> {
    let mut form = ProjectForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "thumbnail" => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await?;
                // Browsers send an empty part when no file was picked
                if !data.is_empty() {
                    form.thumbnail = Some(Upload { data, content_type });
                }
            }
            "title" => form.title = field.text().await?,
            "user_id" => form.user_id = field.text().await?,
            "url" => form.url = field.text().await?,
            "description" => form.description = field.text().await?,
            _ => {}
        }
    }

    Ok(form)
}

fn project_write_error(err: DbError) -> ApiError {
    match err {
        DbError::Conflict(_) => ApiError::Conflict(DUPLICATE_TITLE),
        DbError::MissingReference(_) => ApiError::Validation("Unknown user".into()),
        other => other.into(),
    }
}

/// POST /api/projects
///
/// Multipart form with an optional `thumbnail` file.
///
/// Duplicates are rejected before anything is uploaded. The thumbnail is
/// uploaded before the row is inserted, and removed again if the insert fails.
pub async fn create_project(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let mut form = read_project_form(multipart?).await?;
    require_fields(&[&form.title, &form.user_id])?;

    let key = match &form.thumbnail {
        Some(_) => Some(
            thumbnail_key(&form.user_id, &form.title)
                .map_err(|_| ApiError::Validation(BAD_THUMBNAIL_NAME.into()))?,
        ),
        None => None,
    };

    // A renamed project keeps its object, so the key is checked on its own
    let (title, owner, claimed) = (form.title.clone(), form.user_id.clone(), key.clone());
    let (duplicate, key_taken) = blocking_db(&state, move |db| {
        let key_taken = match &claimed {
            Some(key) => db.thumbnail_key_in_use(key)?,
            None => false,
        };
        Ok((db.project_exists(&title, &owner)?, key_taken))
    })
    .await??;
    if duplicate {
        return Err(ApiError::Conflict(DUPLICATE_TITLE));
    }
    if key_taken {
        return Err(ApiError::Conflict(THUMBNAIL_TAKEN));
    }

    let uploaded = match (form.thumbnail.take(), key) {
        (Some(upload), Some(key)) => {
            let url = state
                .thumbnails
                .put(&key, upload.data, &upload.content_type)
                .await?;
            Some((key, url))
        }
        _ => None,
    };

    let (key, thumbnail) = match &uploaded {
        Some((key, url)) => (Some(key.clone()), Some(url.clone())),
        None => (None, None),
    };
    let ProjectForm {
        title,
        user_id,
        url,
        description,
        ..
    } = form;

    let inserted = blocking_db(&state, move |db| {
        db.create_project(
            &ProjectFields {
                title: &title,
                user_id: &user_id,
                url: &url,
                thumbnail: thumbnail.as_deref(),
                description: &description,
            },
            key.as_deref(),
        )
    })
    .await;

    let project = match inserted {
        Ok(Ok(project)) => project,
        Ok(Err(err)) => {
            // A conflict means a concurrent create won the race and owns the
            // object under this key now; leave it alone.
            if !matches!(err, DbError::Conflict(_)) {
                compensate_upload(&state, uploaded.as_ref()).await;
            }
            return Err(project_write_error(err));
        }
        Err(err) => {
            compensate_upload(&state, uploaded.as_ref()).await;
            return Err(err);
        }
    };

    info!("Project {} created by {}", project.id, project.user_id);

    Ok((
        StatusCode::CREATED,
        Json(ProjectSavedResponse {
            message: "Project created".into(),
            project,
        }),
    ))
}

async fn compensate_upload(state: &AppState, uploaded: Option<&(String, String)>) {
    let Some((key, _)) = uploaded else {
        return;
    };
    match state.thumbnails.delete(key).await {
        Ok(()) => info!("Removed thumbnail {} after failed insert", key),
        Err(e) => warn!("Orphaned thumbnail {}: compensation failed: {}", key, e),
    }
}

/// GET /api/projects
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
) -> Result<Json<ProjectListResponse>, ApiError> {
    let viewer = viewer.user_id().map(str::to_owned);
    let projects = blocking_db(&state, move |db| db.list_projects(viewer.as_deref())).await??;
    Ok(Json(ProjectListResponse { projects }))
}

/// GET /api/projects/{id}
pub async fn get_project(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ProjectDetailResponse>, ApiError> {
    let viewer = viewer.user_id().map(str::to_owned);
    let project = blocking_db(&state, move |db| db.get_project_summary(id, viewer.as_deref()))
        .await??
        .ok_or(ApiError::NotFound(NOT_FOUND))?;
    Ok(Json(ProjectDetailResponse { project }))
}

/// PUT /api/projects/{id}
///
/// Full overwrite of the editable columns.
pub async fn update_project(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<UpdateProjectRequest>,
) -> Result<Json<ProjectSavedResponse>, ApiError> {
    require_fields(&[&req.title, &req.user_id])?;

    let project = blocking_db(&state, move |db| {
        db.update_project(
            id,
            &ProjectFields {
                title: &req.title,
                user_id: &req.user_id,
                url: &req.url,
                thumbnail: req.thumbnail.as_deref(),
                description: &req.description,
            },
        )
    })
    .await?
    .map_err(project_write_error)?
    .ok_or(ApiError::NotFound(NOT_FOUND))?;

    info!("Project {} updated", project.id);

    Ok(Json(ProjectSavedResponse {
        message: "Project updated".into(),
        project,
    }))
}

/// DELETE /api/projects/{id}
///
/// The stored thumbnail goes first. If that fails the row stays, so no
/// project ever points at a deleted object.
pub async fn delete_project(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    let row = blocking_db(&state, move |db| db.get_project(id))
        .await??
        .ok_or(ApiError::NotFound(NOT_FOUND))?;

    if let Some(key) = row.thumbnail_key.as_deref() {
        state.thumbnails.delete(key).await?;
    }

    let deleted = blocking_db(&state, move |db| db.delete_project(id)).await??;
    if !deleted {
        return Err(ApiError::NotFound(NOT_FOUND));
    }

    info!("Project {} deleted", id);
    Ok(Json(MessageResponse::new("Project deleted")))
}
