//! API Handlers
//!
//! HTTP request handlers for each undo buffer endpoint.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

use crate::buffer::{BlobBackedStore, StoredBlob, SweepReport, Upload};
use crate::config::Config;
use crate::error::{Result, UndoError};
use crate::models::{
    AddMessageRequest, AddedResponse, BlobMetadataResponse, FetchQuery, HealthResponse,
    ListResponse, MessageResponse, RemovedResponse, StatsResponse, UploadQuery,
};
use crate::undo::UndoBuffer;

/// Application state shared across all handlers.
///
/// Each store inside the buffer carries its own lock, so the buffer itself
/// is shared without one.
#[derive(Clone)]
pub struct AppState {
    pub undo: Arc<UndoBuffer>,
}

impl AppState {
    /// Creates a new AppState around the given buffer.
    pub fn new(undo: UndoBuffer) -> Self {
        Self {
            undo: Arc::new(undo),
        }
    }

    /// Creates a new AppState from configuration.
    pub async fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(UndoBuffer::from_config(config).await?))
    }
}

// == Messages ==

/// Handler for POST /messages
pub async fn add_message_handler(
    State(state): State<AppState>,
    Json(req): Json<AddMessageRequest>,
) -> Result<Json<AddedResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(UndoError::InvalidRequest(error_msg));
    }

    let id = state.undo.messages().add(req.content).await?;
    Ok(Json(AddedResponse::new(id)))
}

/// Handler for GET /messages
pub async fn list_messages_handler(
    State(state): State<AppState>,
) -> Json<ListResponse<MessageResponse>> {
    let entries = state.undo.messages().get_all().await;
    Json(ListResponse::from_entries(entries))
}

/// Handler for GET /messages/:id
pub async fn get_message_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let entry = state
        .undo
        .messages()
        .get(&id)
        .await
        .ok_or(UndoError::NotFound(id))?;
    Ok(Json(entry.into()))
}

/// Handler for DELETE /messages/:id
pub async fn delete_message_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RemovedResponse>> {
    if state.undo.messages().remove(&id).await {
        Ok(Json(RemovedResponse::new(id)))
    } else {
        Err(UndoError::NotFound(id))
    }
}

// == Files ==

/// Handler for POST /files
///
/// The raw request body is the file; `?name=` and `Content-Type` become its
/// metadata.
pub async fn add_file_handler(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<AddedResponse>> {
    store_upload(state.undo.files(), query, &headers, body).await
}

/// Handler for GET /files
pub async fn list_files_handler(
    State(state): State<AppState>,
) -> Json<ListResponse<BlobMetadataResponse>> {
    Json(ListResponse::from_entries(state.undo.files().get_all().await))
}

/// Handler for GET /files/:id
pub async fn get_file_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    fetch_blob(state.undo.files(), id, false).await
}

/// Handler for DELETE /files/:id
pub async fn delete_file_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RemovedResponse>> {
    remove_blob(state.undo.files(), id).await
}

// == Images ==

/// Handler for POST /images
pub async fn add_image_handler(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<AddedResponse>> {
    store_upload(state.undo.images(), query, &headers, body).await
}

/// Handler for GET /images
pub async fn list_images_handler(
    State(state): State<AppState>,
) -> Json<ListResponse<BlobMetadataResponse>> {
    Json(ListResponse::from_entries(state.undo.images().get_all().await))
}

/// Handler for GET /images/:id, `?thumbnail=true` for the thumbnail
pub async fn get_image_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<FetchQuery>,
) -> Result<Response> {
    fetch_blob(state.undo.images(), id, query.thumbnail).await
}

/// Handler for DELETE /images/:id
pub async fn delete_image_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RemovedResponse>> {
    remove_blob(state.undo.images(), id).await
}

// == Maintenance ==

/// Handler for POST /cleanup
///
/// Sweeps every store against `now - retention` and returns the report.
pub async fn cleanup_handler(State(state): State<AppState>) -> Json<SweepReport> {
    let report = state.undo.cleanup().await;
    if !report.is_clean() {
        warn!(
            "Cleanup left {} entries behind after blob failures",
            report.total_failed()
        );
    }
    Json(report)
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let undo = &state.undo;
    Json(StatsResponse {
        messages: undo.messages().stats().await,
        files: undo.files().stats().await,
        images: undo.images().stats().await,
        retention_ms: undo.retention_ms(),
    })
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

// == Blob Helpers ==

async fn store_upload(
    store: &BlobBackedStore,
    query: UploadQuery,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<Json<AddedResponse>> {
    let mut upload = Upload::new(body.to_vec());
    upload.name = query.name;
    upload.mime_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let id = store.add(upload).await?;
    Ok(Json(AddedResponse::new(id)))
}

async fn fetch_blob(store: &BlobBackedStore, id: String, thumbnail: bool) -> Result<Response> {
    match store.get(&id, thumbnail).await? {
        Some(stored) => Ok(blob_response(stored)),
        None => Err(UndoError::NotFound(id)),
    }
}

async fn remove_blob(store: &BlobBackedStore, id: String) -> Result<Json<RemovedResponse>> {
    if store.remove(&id).await? {
        Ok(Json(RemovedResponse::new(id)))
    } else {
        Err(UndoError::NotFound(id))
    }
}

/// Raw bytes with the recorded MIME type; the original name rides along in
/// `x-undo-name` when it is a valid header value.
fn blob_response(stored: StoredBlob) -> Response {
    let record = &stored.entry.payload;
    let mut headers = HeaderMap::new();

    let content_type = HeaderValue::from_str(&record.mime_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    headers.insert(header::CONTENT_TYPE, content_type);

    if let Ok(id) = HeaderValue::from_str(&stored.entry.id) {
        headers.insert("x-undo-id", id);
    }
    if let Ok(name) = HeaderValue::from_str(&record.name) {
        headers.insert("x-undo-name", name);
    }
    if stored.derived {
        headers.insert("x-undo-thumbnail", HeaderValue::from_static("true"));
    }

    (headers, stored.data).into_response()
}
