//! Buffer Module
//!
//! Bounded, FIFO-evicting, time-expiring stores. [`BoundedStore`] is the
//! in-memory core; [`MessageStore`] and [`BlobBackedStore`] put a lock around
//! it, the latter also owning external blobs.

mod blob;
mod clock;
mod entry;
mod ids;
mod messages;
mod order;
mod report;
mod stats;
mod store;


// Re-export public types
pub use blob::{BlobBackedStore, StoredBlob, Upload, DERIVED_SUFFIX};
pub use clock::{current_timestamp_ms, Clock, ManualClock, SystemClock};
pub use entry::{BlobRecord, Entry};
pub use ids::{IdGenerator, SequentialIds, UuidGenerator};
pub use messages::MessageStore;
pub use order::InsertionOrder;
pub use report::{CleanupFailure, CleanupReport, SweepReport};
pub use stats::BufferStats;
pub use store::BoundedStore;

// == Public Constants ==
/// Default message store capacity
pub const DEFAULT_MESSAGE_CAPACITY: usize = 100;

/// Default file store capacity
pub const DEFAULT_FILE_CAPACITY: usize = 50;

/// Default image store capacity
pub const DEFAULT_IMAGE_CAPACITY: usize = 30;

/// Default retention period (24 hours) in milliseconds
pub const DEFAULT_RETENTION_MS: u64 = 24 * 60 * 60 * 1000;
