//! Error types for the undo buffer
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;
use crate::storage::BlobError;
use crate::transform::TransformError;

// == Undo Error Enum ==
/// Unified error type for the undo buffer.
///
/// Absence of an entry is not an error in the stores (they return `Option`);
/// `NotFound` only exists so the HTTP layer can report a 404.
#[derive(Error, Debug)]
pub enum UndoError {
    /// A store was configured with zero capacity
    #[error("Capacity must be at least 1, got {0}")]
    InvalidCapacity(usize),

    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The id generator produced an id already in the index
    #[error("Duplicate entry id: {0}")]
    DuplicateId(String),

    /// Blob put/get/delete failed
    #[error("Blob storage failed for '{key}': {source}")]
    Persistence {
        key: String,
        #[source]
        source: BlobError,
    },

    /// An add failed and some of the blobs it wrote could not be deleted
    #[error("{cause} (blobs left behind: {})", .orphans.join(", "))]
    Orphaned {
        #[source]
        cause: Box<UndoError>,
        orphans: Vec<String>,
    },

    /// Derived artifact generation failed
    #[error("Transform failed: {0}")]
    Transform(#[from] TransformError),

    /// Entry not found
    #[error("Entry not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl UndoError {
    /// Wraps a blob store failure with the location key it concerned.
    pub fn persistence(key: impl Into<String>, source: BlobError) -> Self {
        UndoError::Persistence {
            key: key.into(),
            source,
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for UndoError {
    fn into_response(self) -> Response {
        let status = match &self {
            UndoError::NotFound(_) => StatusCode::NOT_FOUND,
            UndoError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            UndoError::Transform(_) => StatusCode::UNPROCESSABLE_ENTITY,
            UndoError::Persistence {
                source: BlobError::TimedOut | BlobError::Cancelled,
                ..
            } => StatusCode::SERVICE_UNAVAILABLE,
            UndoError::Persistence { .. }
            | UndoError::Orphaned { .. }
            | UndoError::InvalidCapacity(_)
            | UndoError::InvalidConfig(_)
            | UndoError::DuplicateId(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the undo buffer.
pub type Result<T> = std::result::Result<T, UndoError>;
