//! Router assembly and serving

use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::ServiceConfig;
use crate::cors::{cors_middleware, OriginPolicy};
use crate::error::Result;
use crate::handlers::{export_handler, healthz_handler, AppState};

/// Routes with CORS handling and the request body limit
pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/", post(export_handler))
        .route("/export", post(export_handler))
        .route("/healthz", get(healthz_handler))
        .layer(from_fn_with_state(state.clone(), cors_middleware))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

/// Handler state for a configuration
pub fn app_state(config: &ServiceConfig) -> Result<AppState> {
    let pipeline = config.build_pipeline()?;
    let origins = OriginPolicy::new(&config.server.allowed_origins);
    Ok(AppState::new(pipeline, origins))
}

/// Serve on an already bound listener until ctrl-c
pub async fn serve_on(listener: TcpListener, config: &ServiceConfig) -> Result<()> {
    let state = app_state(config)?;
    let router = build_router(state, config.server.max_body_bytes);
    info!(addr = %listener.local_addr()?, "export service listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("export service stopped");
    Ok(())
}

/// Bind the configured address and serve
pub async fn serve(config: &ServiceConfig) -> Result<()> {
    let listener = TcpListener::bind(&config.server.bind).await?;
    serve_on(listener, config).await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler; run until the process is killed.
        std::future::pending::<()>().await;
    }
}
