use crate::config::Config;
use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use m4bforge_av::{MediaEncoder, ToolInfo, Workspace};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::OnceCell;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

pub mod error;
pub mod routes_api;
pub mod upload;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    /// Encoder used for every conversion request
    pub encoder: Arc<dyn MediaEncoder>,
    /// Result of the first availability check, reused by health requests
    encoder_info: Arc<OnceCell<ToolInfo>>,
}

impl AppContext {
    pub fn new(config: Config, encoder: Arc<dyn MediaEncoder>) -> Self {
        Self {
            config: Arc::new(config),
            encoder,
            encoder_info: Arc::new(OnceCell::new()),
        }
    }

    /// Encoder availability, checked once per process.
    pub async fn encoder_info(&self) -> ToolInfo {
        self.encoder_info
            .get_or_init(|| async {
                let encoder = self.encoder.clone();
                let name = encoder.name().to_string();
                tokio::task::spawn_blocking(move || encoder.check())
                    .await
                    .unwrap_or_else(|e| {
                        tracing::error!("{} availability check failed: {}", name, e);
                        ToolInfo {
                            name,
                            available: false,
                            version: None,
                            path: None,
                        }
                    })
            })
            .await
            .clone()
    }

    /// Fresh per-request scratch directory, under `server.work_dir` when set.
    ///
    /// The work directory itself is created at startup by [`prepare_work_dir`].
    pub fn new_workspace(&self) -> m4bforge_common::Result<Workspace> {
        match &self.config.server.work_dir {
            Some(dir) => Workspace::in_dir(dir),
            None => Workspace::new(),
        }
    }
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let body_limit = ctx.config.server.max_upload_bytes();
    let static_dir = ctx.config.server.static_dir.clone();

    let mut app = Router::new()
        .route("/health", get(health_check))
        .nest("/api", routes_api::api_routes());

    // Serve static files if directory is provided, JSON 404 otherwise
    app = match static_dir {
        Some(dir) if dir.exists() => {
            tracing::info!("Serving static files from {:?}", dir);
            app.fallback_service(ServeDir::new(&dir).append_index_html_on_directories(true))
        }
        _ => app.fallback(not_found),
    };

    app.layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "Not found" })),
    )
}

/// Create the configured `server.work_dir`, if any.
pub async fn prepare_work_dir(config: &Config) -> Result<()> {
    if let Some(dir) = &config.server.work_dir {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create work directory {:?}", dir))?;
        tracing::debug!("Using work directory {:?}", dir);
    }
    Ok(())
}

/// Start the HTTP server
pub async fn start_server(config: Config, encoder: Arc<dyn MediaEncoder>) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    prepare_work_dir(&config).await?;

    let ctx = AppContext::new(config, encoder);
    let info = ctx.encoder_info().await;
    if info.available {
        tracing::info!(
            "Using {} {}",
            ctx.encoder.name(),
            info.version.as_deref().unwrap_or("(unknown version)")
        );
    } else {
        tracing::warn!(
            "{} is not available; conversions will fail until it is installed",
            ctx.encoder.name()
        );
    }

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
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
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
