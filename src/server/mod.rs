use crate::config::Config;
use crate::images::{Codec, ImageCoordinator, LocalBlobStore, SqliteMetadataStore};
use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use eventimg_db::pool::DbPool;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod routes_images;

/// Headroom over the upload limit for multipart framing, so an oversize file
/// still reaches the codec and is rejected there.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub coordinator: Arc<ImageCoordinator>,
}

impl AppContext {
    /// Wire the coordinator to the SQLite pool and the configured upload dir.
    pub fn new(config: Config, pool: DbPool) -> eventimg_common::Result<Self> {
        let blobs = LocalBlobStore::new(&config.storage.upload_dir)?;
        let coordinator = ImageCoordinator::new(
            Arc::new(SqliteMetadataStore::new(pool)),
            Arc::new(blobs),
            Codec::new(&config.images),
            config.storage.static_url_prefix.clone(),
        );
        Ok(Self {
            config: Arc::new(config),
            coordinator: Arc::new(coordinator),
        })
    }
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    let body_limit = ctx.config.images.max_upload_bytes + MULTIPART_OVERHEAD;
    let static_route = format!(
        "{}/*path",
        ctx.config.storage.static_url_prefix.trim_end_matches('/')
    );

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", routes_images::image_routes())
        .route(&static_route, get(routes_images::serve_blob))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Start the HTTP server
pub async fn start_server(config: Config, pool: DbPool) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    tracing::info!(
        "Storing uploads under {:?}, served at {}",
        config.storage.upload_dir,
        config.storage.static_url_prefix
    );
    let ctx = AppContext::new(config, pool).context("Failed to initialize image storage")?;
    let app = create_router(ctx);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
