//! Request and Response models for the undo buffer API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{AddMessageRequest, FetchQuery, UploadQuery};
pub use responses::{
    AddedResponse, BlobMetadataResponse, ErrorResponse, HealthResponse, ListResponse,
    MessageResponse, RemovedResponse, StatsResponse,
};
