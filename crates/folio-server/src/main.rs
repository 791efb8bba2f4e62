mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderValue, Method, header::CONTENT_TYPE};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use folio_api::credentials::PasswordHasher;
use folio_api::router::router;
use folio_api::state::{AppState, AppStateInner};
use folio_api::token::TokenService;
use folio_db::Database;
use folio_storage::{LocalStore, S3Store, ThumbnailStore};

use crate::config::{Config, StorageBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "folio_server=debug,folio_api=debug,folio_storage=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Init database
    let db = Database::open(&config.db_path)?;

    let thumbnails: Arc<dyn ThumbnailStore> = match &config.storage {
        StorageBackend::Local { dir, public_url } => {
            Arc::new(LocalStore::new(dir.clone(), public_url).await?)
        }
        StorageBackend::S3(s3) => Arc::new(S3Store::new(s3.clone()).await?),
    };

    let state: AppState = Arc::new(AppStateInner {
        db,
        tokens: TokenService::new(&config.jwt_secret),
        passwords: PasswordHasher::default(),
        thumbnails,
        cookie_secure: config.cookie_secure,
        max_upload_bytes: config.max_upload_bytes,
    });

    // CORS: explicit allow-list, cookies allowed
    let origins = config
        .allowed_origins
        .iter()
        .map(|origin| HeaderValue::from_str(origin))
        .collect::<Result<Vec<_>, _>>()?;
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true);

    let mut app = router(state);
    if let StorageBackend::Local { dir, .. } = &config.storage {
        app = app.nest_service("/uploads", ServeDir::new(dir));
    }
    let app = app.layer(cors).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Folio server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
