//! Undo Buffer Module
//!
//! Aggregate holding one store per content kind and sweeping all of them
//! against a single retention cutoff.

use std::sync::Arc;

use serde_json::Value;

use crate::buffer::{
    BlobBackedStore, BoundedStore, Clock, IdGenerator, MessageStore, SweepReport, SystemClock,
    UuidGenerator,
};
use crate::config::Config;
use crate::error::{Result, UndoError};
use crate::storage::{BlobStore, FsBlobStore};
use crate::transform::ThumbnailTransform;

// == Undo Buffer ==
/// Messages, files and images with their shared retention policy.
#[derive(Debug)]
pub struct UndoBuffer {
    messages: MessageStore<Value>,
    files: BlobBackedStore,
    images: BlobBackedStore,
    /// Entries older than this many milliseconds are swept
    retention_ms: u64,
    clock: Arc<dyn Clock>,
}

impl UndoBuffer {
    // == Constructor ==
    /// Assembles an aggregate from ready-made stores.
    ///
    /// `clock` should be the clock the stores stamp entries with.
    pub fn new(
        messages: MessageStore<Value>,
        files: BlobBackedStore,
        images: BlobBackedStore,
        retention_ms: u64,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            messages,
            files,
            images,
            retention_ms,
            clock,
        }
    }

    /// Builds every store from configuration, opening filesystem blob stores
    /// under the configured directories.
    pub async fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let files = open_dir(&config.file_storage_dir).await?;
        let images = open_dir(&config.image_storage_dir).await?;

        Self::with_backends(
            config,
            files,
            images,
            Arc::new(SystemClock::new()),
            Arc::new(UuidGenerator),
        )
    }

    /// Builds every store from configuration with caller-supplied blob
    /// backends, clock and id generator.
    pub fn with_backends(
        config: &Config,
        file_blobs: Arc<dyn BlobStore>,
        image_blobs: Arc<dyn BlobStore>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Result<Self> {
        config.validate()?;

        let messages = MessageStore::new(BoundedStore::with_collaborators(
            config.message_capacity,
            clock.clone(),
            ids.clone(),
        )?);

        let mut files = BlobBackedStore::new(
            BoundedStore::with_collaborators(config.file_capacity, clock.clone(), ids.clone())?,
            file_blobs,
        )
        .with_defaults("file", "application/octet-stream");

        let thumbnail = ThumbnailTransform::new(config.thumbnail_width, config.thumbnail_height);
        let mut images = BlobBackedStore::new(
            BoundedStore::with_collaborators(config.image_capacity, clock.clone(), ids)?,
            image_blobs,
        )
        .with_transform(Arc::new(thumbnail))
        .with_defaults("image", "image/jpeg");

        if let Some(timeout) = config.blob_io_timeout() {
            files = files.with_io_timeout(timeout);
            images = images.with_io_timeout(timeout);
        }

        Ok(Self::new(
            messages,
            files,
            images,
            config.retention_period_ms,
            clock,
        ))
    }

    // == Accessors ==
    pub fn messages(&self) -> &MessageStore<Value> {
        &self.messages
    }

    pub fn files(&self) -> &BlobBackedStore {
        &self.files
    }

    pub fn images(&self) -> &BlobBackedStore {
        &self.images
    }

    pub fn retention_ms(&self) -> u64 {
        self.retention_ms
    }

    // == Cleanup ==
    /// Sweeps every store against `now - retention`.
    pub async fn cleanup(&self) -> SweepReport {
        let cutoff = self.clock.now_ms().saturating_sub(self.retention_ms);
        self.cleanup_before(cutoff).await
    }

    /// Sweeps every store against an explicit cutoff: entries stamped
    /// strictly before it are removed.
    pub async fn cleanup_before(&self, cutoff: u64) -> SweepReport {
        let messages = self.messages.cleanup(cutoff).await;
        let files = self.files.cleanup(cutoff).await;
        let images = self.images.cleanup(cutoff).await;

        SweepReport {
            cutoff,
            messages,
            files,
            images,
        }
    }

    // == Shutdown ==
    /// Cancels blob I/O on the file and image stores. Calls in flight fail
    /// with a cancellation error and later ones fail immediately. Messages
    /// keep working.
    pub fn shutdown(&self) {
        self.files.cancellation_token().cancel();
        self.images.cancellation_token().cancel();
    }
}

async fn open_dir(dir: &str) -> Result<Arc<dyn BlobStore>> {
    let store = FsBlobStore::open(dir)
        .await
        .map_err(|source| UndoError::persistence(dir, source))?;
    Ok(Arc::new(store))
}
