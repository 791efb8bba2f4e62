use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
};

use crate::middleware::{require_identity, with_optional_identity};
use crate::state::AppState;
use crate::{comments, likes, projects, users};

/// Every API route. CORS, tracing and static file serving are layered on by
/// the binary.
pub fn router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/like", post(likes::toggle_like))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_identity));

    let upload_routes = Router::new()
        .route(
            "/api/projects",
            post(projects::create_project).get(projects::list_projects),
        )
        .layer(DefaultBodyLimit::max(state.max_upload_bytes));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/check-nickname", post(users::check_nickname))
        .route("/api/check-username", post(users::check_username))
        .route("/api/register", post(users::register))
        .route("/api/login", post(users::login))
        .route("/api/logout", post(users::logout))
        .route("/api/user", get(users::current_user))
        .route(
            "/api/projects/{id}",
            put(projects::update_project)
                .get(projects::get_project)
                .delete(projects::delete_project),
        )
        .route("/api/comments", post(comments::create_comment))
        .route(
            "/api/comments/{id}",
            get(comments::list_comments).delete(comments::delete_comment),
        )
        .merge(upload_routes)
        .merge(protected_routes)
        // Never rejects; only attaches the viewer for handlers that want one.
        .layer(middleware::from_fn_with_state(state.clone(), with_optional_identity))
        .with_state(state)
}

async fn root() -> &'static str {
    "Hello, World!"
}

async fn health() -> &'static str {
    "ok"
}
