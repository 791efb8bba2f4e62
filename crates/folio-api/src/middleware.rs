//! Auth gate. Two explicit capabilities:
//!
//! - [`require_identity`] fails closed: no cookie, a bad signature, or an
//!   expired token is a 401 before the handler runs.
//! - [`with_optional_identity`] never fails: it attaches a [`Viewer`] that is
//!   either the verified caller or anonymous.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use folio_types::models::Identity;
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;
use crate::token::SESSION_COOKIE;

/// The caller as far as optional-identity routes are concerned.
#[derive(Debug, Clone)]
pub struct Viewer(pub Option<Identity>);

impl Viewer {
    pub fn user_id(&self) -> Option<&str> {
        self.0.as_ref().map(|identity| identity.user_id.as_str())
    }
}

pub async fn require_identity(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = jar
        .get(SESSION_COOKIE)
        .ok_or(ApiError::Unauthorized("Login required"))?;

    let identity = state
        .tokens
        .verify(token.value())
        .ok_or(ApiError::Unauthorized("Invalid or expired session"))?;

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

pub async fn with_optional_identity(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let identity = jar.get(SESSION_COOKIE).and_then(|cookie| {
        let identity = state.tokens.verify(cookie.value());
        if identity.is_none() {
            debug!("Ignoring invalid session cookie on {}", req.uri().path());
        }
        identity
    });

    req.extensions_mut().insert(Viewer(identity));
    next.run(req).await
}
