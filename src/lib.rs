//! Undo Buffer - bounded, time-expiring storage for undoable content
//!
//! Keeps the most recent messages, files and images (with thumbnails) in
//! fixed-capacity FIFO stores and sweeps anything older than a retention
//! period.

pub mod api;
pub mod buffer;
pub mod config;
pub mod error;
pub mod models;
pub mod storage;
pub mod tasks;
pub mod transform;
pub mod undo;

pub use api::AppState;
pub use config::Config;
pub use error::{Result, UndoError};
pub use tasks::spawn_cleanup_task;
pub use undo::UndoBuffer;
