//! Request DTOs for the undo buffer API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;
use serde_json::Value;

/// Request body for POST /messages
#[derive(Debug, Clone, Deserialize)]
pub struct AddMessageRequest {
    /// The message; any JSON value except null
    pub content: Value,
}

impl AddMessageRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.content.is_null() {
            return Some("Message content cannot be null".to_string());
        }
        None
    }
}

/// Query string for POST /files and POST /images
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadQuery {
    /// Original name of the upload
    #[serde(default)]
    pub name: Option<String>,
}

/// Query string for GET /images/:id
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct FetchQuery {
    /// Return the thumbnail instead of the original
    #[serde(default)]
    pub thumbnail: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_message_deserialize() {
        let json = r#"{"content": {"text": "hello", "channel": 4}}"#;
        let req: AddMessageRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.content["text"], "hello");
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_validate_null_content() {
        let req: AddMessageRequest = serde_json::from_str(r#"{"content": null}"#).unwrap();
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_missing_content_is_rejected() {
        let result: Result<AddMessageRequest, _> = serde_json::from_str(r#"{}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_fetch_query_default() {
        let query: FetchQuery = serde_json::from_str("{}").unwrap();
        assert!(!query.thumbnail);
    }
}
