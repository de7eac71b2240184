//! Response DTOs for the undo buffer API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::buffer::{BlobRecord, BufferStats, Entry};

/// Response body for POST /messages, /files and /images
#[derive(Debug, Clone, Serialize)]
pub struct AddedResponse {
    /// Success message
    pub message: String,
    /// Id assigned to the new entry
    pub id: String,
}

impl AddedResponse {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            message: format!("Entry '{}' stored", id),
            id,
        }
    }
}

/// Response body for DELETE on any store
#[derive(Debug, Clone, Serialize)]
pub struct RemovedResponse {
    /// Success message
    pub message: String,
    /// The id that was removed
    pub id: String,
}

impl RemovedResponse {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            message: format!("Entry '{}' removed", id),
            id,
        }
    }
}

/// A stored message
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub id: String,
    /// Creation time (Unix milliseconds)
    pub timestamp: u64,
    pub content: Value,
}

impl From<Entry<Value>> for MessageResponse {
    fn from(entry: Entry<Value>) -> Self {
        Self {
            id: entry.id,
            timestamp: entry.timestamp,
            content: entry.payload,
        }
    }
}

/// Metadata of a stored file or image. Blob bytes are never listed.
#[derive(Debug, Clone, Serialize)]
pub struct BlobMetadataResponse {
    pub id: String,
    /// Creation time (Unix milliseconds)
    pub timestamp: u64,
    pub name: String,
    pub mime_type: String,
    /// Size of the original upload in bytes
    pub size: u64,
    pub has_thumbnail: bool,
}

impl From<Entry<BlobRecord>> for BlobMetadataResponse {
    fn from(entry: Entry<BlobRecord>) -> Self {
        Self {
            id: entry.id,
            timestamp: entry.timestamp,
            has_thumbnail: entry.payload.derived_location.is_some(),
            name: entry.payload.name,
            mime_type: entry.payload.mime_type,
            size: entry.payload.size,
        }
    }
}

/// Listing of a store, oldest first
#[derive(Debug, Clone, Serialize)]
pub struct ListResponse<T> {
    pub count: usize,
    pub items: Vec<T>,
}

impl<T> ListResponse<T> {
    /// Converts store entries into response items.
    pub fn from_entries<E>(entries: Vec<E>) -> Self
    where
        T: From<E>,
    {
        let items: Vec<T> = entries.into_iter().map(T::from).collect();
        Self {
            count: items.len(),
            items,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub messages: BufferStats,
    pub files: BufferStats,
    pub images: BufferStats,
    /// Retention period in milliseconds
    pub retention_ms: u64,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_added_response_serialize() {
        let resp = AddedResponse::new("abc");
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["id"], "abc");
        assert!(json["message"].as_str().unwrap().contains("stored"));
    }

    #[test]
    fn test_blob_metadata_from_entry() {
        let entry = Entry::new(
            "img1",
            42,
            BlobRecord {
                name: "cat.png".to_string(),
                mime_type: "image/png".to_string(),
                size: 1024,
                location: "img1".to_string(),
                derived_location: Some("img1_thumb".to_string()),
            },
        );

        let resp = BlobMetadataResponse::from(entry);
        let json = serde_json::to_value(&resp).unwrap();

        assert_eq!(json["name"], "cat.png");
        assert_eq!(json["size"], 1024);
        assert_eq!(json["has_thumbnail"], true);
        assert!(json.get("location").is_none());
    }

    #[test]
    fn test_list_response_counts() {
        let entries = vec![
            Entry::new("a", 1, json!("one")),
            Entry::new("b", 2, json!("two")),
        ];

        let list: ListResponse<MessageResponse> = ListResponse::from_entries(entries);
        assert_eq!(list.count, 2);
        assert_eq!(list.items[1].content, json!("two"));
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse::new("Something went wrong");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("error"));
        assert!(json.contains("Something went wrong"));
    }
}
