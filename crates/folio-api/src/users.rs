use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use folio_types::api::{
    AvailabilityResponse, LoginRequest, LoginResponse, MessageResponse, NicknameCheckRequest,
    RegisterRequest, RegisterResponse, UserResponse, UsernameCheckRequest,
};
use folio_types::models::Identity;
use tracing::info;

use crate::error::ApiError;
use crate::extract::{ApiJson, require_fields};
use crate::middleware::Viewer;
use crate::state::{AppState, blocking_db};
use crate::token::{cleared_session_cookie, session_cookie};

const BAD_CREDENTIALS: &str = "Invalid username or password";

/// POST /api/check-nickname
pub async fn check_nickname(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<NicknameCheckRequest>,
) -> Result<Response, ApiError> {
    require_fields(&[&req.nickname])?;

    let taken = blocking_db(&state, move |db| db.nickname_exists(&req.nickname)).await??;
    Ok(availability(taken, "Nickname is already in use", "Nickname is available"))
}

/// POST /api/check-username
pub async fn check_username(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<UsernameCheckRequest>,
) -> Result<Response, ApiError> {
    require_fields(&[&req.username])?;

    let taken = blocking_db(&state, move |db| db.username_exists(&req.username)).await??;
    Ok(availability(taken, "Username is already in use", "Username is available"))
}

fn availability(taken: bool, taken_msg: &str, free_msg: &str) -> Response {
    let (status, message) = if taken {
        (StatusCode::CONFLICT, taken_msg)
    } else {
        (StatusCode::OK, free_msg)
    };
    (
        status,
        Json(AvailabilityResponse {
            available: !taken,
            message: message.to_string(),
        }),
    )
        .into_response()
}

/// POST /api/register
///
/// The unique constraints on handle and nickname decide conflicts; the
/// availability endpoints are only a convenience for forms.
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_fields(&[&req.username, &req.password, &req.nickname])?;

    let password_hash = state.passwords.hash(req.password).await?;

    let username = req.username;
    let nickname = req.nickname;
    let user = blocking_db(&state, move |db| {
        db.create_user(&username, &password_hash, &nickname)
    })
    .await?
    .map_err(|e| match e {
        e if e.conflicts_on("users.user_id") => ApiError::Conflict("Username is already in use"),
        e if e.conflicts_on("users.nickname") => ApiError::Conflict("Nickname is already in use"),
        e => e.into(),
    })?;

    info!("Registered user {}", user.user_id);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Registration successful".into(),
            user,
        }),
    ))
}

/// POST /api/login
///
/// Sets the session cookie on success.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    require_fields(&[&req.username, &req.password])?;

    let username = req.username;
    let Some(user) = blocking_db(&state, move |db| db.get_user_by_username(&username)).await??
    else {
        // Same hashing cost as a wrong password, so timing does not reveal
        // which handles exist
        state.passwords.burn(req.password).await?;
        return Err(ApiError::Unauthorized(BAD_CREDENTIALS));
    };

    let valid = state
        .passwords
        .verify(req.password, user.password.clone())
        .await?;
    if !valid {
        return Err(ApiError::Unauthorized(BAD_CREDENTIALS));
    }

    let identity = Identity {
        user_id: user.user_id.clone(),
        id: user.id,
    };
    let token = state
        .tokens
        .issue(&identity)
        .map_err(|e| ApiError::Internal(e.into()))?;

    info!("User {} logged in", user.user_id);

    Ok((
        jar.add(session_cookie(token, state.cookie_secure)),
        Json(LoginResponse {
            message: "Login successful".into(),
            user: user.public(),
        }),
    ))
}

/// POST /api/logout
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    (
        jar.add(cleared_session_cookie(state.cookie_secure)),
        Json(MessageResponse::new("Logout successful")),
    )
}

/// GET /api/user
///
/// The caller's profile, or an empty 200 when anonymous.
pub async fn current_user(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
) -> Result<Response, ApiError> {
    let Some(identity) = viewer.0 else {
        return Ok(StatusCode::OK.into_response());
    };

    let user = blocking_db(&state, move |db| db.get_user_by_username(&identity.user_id))
        .await??
        .ok_or(ApiError::NotFound("User not found"))?;

    Ok(Json(UserResponse {
        user: user.into_profile(),
    })
    .into_response())
}

