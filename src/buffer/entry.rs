//! Buffer Entry Module
//!
//! Defines the records held by every store.

// == Entry ==
/// One stored record. Immutable once inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<T> {
    /// Unique identifier, never reused
    pub id: String,
    /// Creation timestamp (Unix milliseconds)
    pub timestamp: u64,
    /// Store-specific payload
    pub payload: T,
}

impl<T> Entry<T> {
    // == Constructor ==
    pub fn new(id: impl Into<String>, timestamp: u64, payload: T) -> Self {
        Self {
            id: id.into(),
            timestamp,
            payload,
        }
    }

    // == Is Older Than ==
    /// Checks whether the entry falls before a cleanup cutoff.
    ///
    /// Boundary condition: an entry stamped exactly at `cutoff` is kept.
    pub fn is_older_than(&self, cutoff: u64) -> bool {
        self.timestamp < cutoff
    }
}

// == Blob Record ==
/// Metadata for a payload persisted outside the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobRecord {
    /// Original name supplied by the uploader
    pub name: String,
    /// MIME type of the original payload
    pub mime_type: String,
    /// Byte length of the original payload, captured at insert time
    pub size: u64,
    /// Location key of the original payload
    pub location: String,
    /// Location key of the derived artifact (thumbnail), if any
    pub derived_location: Option<String>,
}

impl BlobRecord {
    /// Location keys owned by this record, derived artifact first.
    pub fn locations(&self) -> impl Iterator<Item = &str> {
        self.derived_location
            .as_deref()
            .into_iter()
            .chain(std::iter::once(self.location.as_str()))
    }
}
