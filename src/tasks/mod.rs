//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Retention Cleanup: Sweeps entries older than the retention period

mod cleanup;

pub use cleanup::spawn_cleanup_task;
