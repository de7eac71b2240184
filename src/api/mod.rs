//! API Module
//!
//! HTTP handlers and routing for the undo buffer REST API.
//!
//! # Endpoints
//! - `POST /messages`, `GET /messages` - Store / list messages
//! - `GET /messages/:id`, `DELETE /messages/:id` - Fetch / remove a message
//! - `POST /files`, `GET /files` - Upload (raw body) / list files
//! - `GET /files/:id`, `DELETE /files/:id` - Download / remove a file
//! - `POST /images`, `GET /images` - Upload / list images
//! - `GET /images/:id[?thumbnail=true]`, `DELETE /images/:id`
//! - `POST /cleanup` - Sweep entries older than the retention period
//! - `GET /stats` - Per-store statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;

/// Maximum accepted upload size in bytes
pub const MAX_UPLOAD_SIZE: usize = 16 * 1024 * 1024; // 16 MiB
