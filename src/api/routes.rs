//! API Routes
//!
//! Configures the Axum router with all undo buffer endpoints.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    add_file_handler, add_image_handler, add_message_handler, cleanup_handler,
    delete_file_handler, delete_image_handler, delete_message_handler, get_file_handler,
    get_image_handler, get_message_handler, health_handler, list_files_handler,
    list_images_handler, list_messages_handler, stats_handler, AppState,
};
use super::MAX_UPLOAD_SIZE;

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - Body limit: uploads up to [`MAX_UPLOAD_SIZE`] bytes
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/messages",
            post(add_message_handler).get(list_messages_handler),
        )
        .route(
            "/messages/:id",
            get(get_message_handler).delete(delete_message_handler),
        )
        .route("/files", post(add_file_handler).get(list_files_handler))
        .route(
            "/files/:id",
            get(get_file_handler).delete(delete_file_handler),
        )
        .route("/images", post(add_image_handler).get(list_images_handler))
        .route(
            "/images/:id",
            get(get_image_handler).delete(delete_image_handler),
        )
        .route("/cleanup", post(cleanup_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
