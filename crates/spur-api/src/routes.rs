//! Router setup with all API routes and middleware.
//!
//! Configures the axum Router with CORS, tracing, panic recovery, a body
//! size limit, and in production mode static front-end serving.

use std::any::Any;
use std::path::Path;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, Any as AnyOrigin, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use spur_core::config::{RunMode, SpurConfig};
use spur_core::error::SpurError;

use crate::error::ApiError;
use crate::handlers;
use crate::state::AppState;

/// Largest accepted request body.
pub const BODY_LIMIT_BYTES: usize = 100 * 1024;

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);

    let chat_routes = Router::new()
        .route("/message", post(handlers::send_message))
        .route("/history", get(handlers::history_missing_id))
        .route("/history/", get(handlers::history_missing_id))
        .route("/history/{session_id}", get(handlers::get_history))
        .fallback(handlers::chat_not_found);

    let router = Router::new()
        .nest("/chat", chat_routes)
        .route("/health", get(handlers::health));

    let router = match state.config.server.mode {
        RunMode::Development => router.route("/", get(handlers::dev_banner)),
        RunMode::Production => {
            let public_dir = Path::new(&state.config.server.public_dir);
            let index = public_dir.join("index.html");
            tracing::info!(dir = %public_dir.display(), "Serving static front-end");
            router.fallback_service(ServeDir::new(public_dir).fallback(ServeFile::new(index)))
        }
    };

    router
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Any origin when `origins` is empty or contains `*`, otherwise only the
/// listed ones.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() || origins.iter().any(|o| o == "*") {
        AllowOrigin::from(AnyOrigin)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match o.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin)
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    ApiError::Internal(format!("handler panicked: {}", detail)).into_response()
}

/// Start the HTTP server on the configured address.
pub async fn start_server(config: &SpurConfig, state: AppState) -> Result<(), SpurError> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| SpurError::Api(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!(addr = %addr, mode = ?config.server.mode, "Server is running");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| SpurError::Api(format!("Server error: {}", e)))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
