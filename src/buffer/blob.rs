//! Blob-Backed Store Module
//!
//! Bounded store whose payload lives in an external [`BlobStore`]. The index
//! only ever points at blobs that exist: persistence happens before an entry
//! is registered and deletion happens before an entry is dropped.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::buffer::{
    BlobRecord, BoundedStore, BufferStats, CleanupFailure, CleanupReport, Entry,
};
use crate::error::{Result, UndoError};
use crate::storage::{BlobError, BlobStore};
use crate::transform::{Transform, TransformError};

/// Suffix appended to an entry id to form its derived artifact's key.
pub const DERIVED_SUFFIX: &str = "_thumb";

// == Upload ==
/// Payload handed to [`BlobBackedStore::add`].
#[derive(Debug, Clone, Default)]
pub struct Upload {
    /// Falls back to the store's default name when missing or empty
    pub name: Option<String>,
    /// Falls back to the store's default MIME type when missing or empty
    pub mime_type: Option<String>,
    pub data: Vec<u8>,
}

impl Upload {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: None,
            mime_type: None,
            data: data.into(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

// == Stored Blob ==
/// Metadata plus the bytes read back from the blob store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub entry: Entry<BlobRecord>,
    pub data: Vec<u8>,
    /// True when `data` is the derived artifact rather than the original
    pub derived: bool,
}

// == Blob-Backed Store ==
pub struct BlobBackedStore {
    index: RwLock<BoundedStore<BlobRecord>>,
    blobs: Arc<dyn BlobStore>,
    transform: Option<Arc<dyn Transform>>,
    default_name: String,
    default_mime_type: String,
    io_timeout: Option<Duration>,
    cancel: CancellationToken,
}

impl BlobBackedStore {
    // == Constructor ==
    /// Creates a store without a transform, defaulting uploads to
    /// `"file"` / `application/octet-stream`.
    pub fn new(index: BoundedStore<BlobRecord>, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            index: RwLock::new(index),
            blobs,
            transform: None,
            default_name: "file".to_string(),
            default_mime_type: "application/octet-stream".to_string(),
            io_timeout: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Generates a derived artifact for every upload.
    pub fn with_transform(mut self, transform: Arc<dyn Transform>) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Name and MIME type recorded when an upload omits them.
    pub fn with_defaults(mut self, name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        self.default_name = name.into();
        self.default_mime_type = mime_type.into();
        self
    }

    /// Bounds every individual blob call. A call that runs over fails with
    /// [`BlobError::TimedOut`].
    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = Some(timeout);
        self
    }

    /// Blob calls made after `token` is cancelled fail with
    /// [`BlobError::Cancelled`].
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    // == Add ==
    /// Persists an upload (and its derived artifact) and registers it.
    ///
    /// The sequence runs under the write lock:
    /// 1. derive the artifact, if a transform is configured
    /// 2. write the original, then the derived artifact
    /// 3. if full, delete the oldest entry's blobs and evict it
    /// 4. register the new entry
    ///
    /// Any failure leaves the index untouched and deletes every key of the
    /// attempt. Keys that cannot be deleted are listed in
    /// [`UndoError::Orphaned`].
    pub async fn add(&self, upload: Upload) -> Result<String> {
        let mut index = self.index.write().await;

        let id = index.mint_id();
        if index.contains(&id) {
            return Err(UndoError::DuplicateId(id));
        }
        let timestamp = index.now_ms();

        let derived = match &self.transform {
            Some(transform) => Some(derive(transform.clone(), &upload.data).await?),
            None => None,
        };

        let record = BlobRecord {
            name: non_empty(upload.name).unwrap_or_else(|| self.default_name.clone()),
            mime_type: non_empty(upload.mime_type)
                .unwrap_or_else(|| self.default_mime_type.clone()),
            size: upload.data.len() as u64,
            location: id.clone(),
            derived_location: derived
                .as_ref()
                .map(|_| format!("{}{}", id, DERIVED_SUFFIX)),
        };

        let writes = std::iter::once((record.location.clone(), upload.data))
            .chain(record.derived_location.clone().zip(derived));
        for (key, bytes) in writes {
            if let Err(err) = self.persist(key, bytes).await {
                return Err(self.abandon(&record, err).await);
            }
        }

        if index.len() >= index.capacity() {
            if let Some(victim) = index.oldest().map(|entry| entry.payload.clone()) {
                if let Err(err) = self.delete_blobs(&victim).await {
                    return Err(self.abandon(&record, err).await);
                }
                index.evict_oldest();
            }
        }

        index.insert(Entry::new(id.clone(), timestamp, record))?;
        Ok(id)
    }

    // == Get ==
    /// Reads an entry and its bytes.
    ///
    /// `Ok(None)` means the id is unknown. An id that is indexed but whose
    /// blob cannot be read is an error. Asking for the derived artifact of an
    /// entry without one returns the original.
    pub async fn get(&self, id: &str, want_derived: bool) -> Result<Option<StoredBlob>> {
        let index = self.index.read().await;
        let Some(entry) = index.get(id).cloned() else {
            return Ok(None);
        };

        let (key, derived) = match (&entry.payload.derived_location, want_derived) {
            (Some(key), true) => (key.clone(), true),
            _ => (entry.payload.location.clone(), false),
        };
        let data = self.guarded(&key, self.blobs.get(&key)).await?;

        Ok(Some(StoredBlob {
            entry,
            data,
            derived,
        }))
    }

    /// Metadata of every entry, oldest first. Never touches blob bytes.
    pub async fn get_all(&self) -> Vec<Entry<BlobRecord>> {
        self.index.read().await.get_all()
    }

    // == Remove ==
    /// Deletes an entry's blobs and then the entry.
    ///
    /// `Ok(false)` if the id is unknown. If a blob cannot be deleted the
    /// entry stays indexed and the error is returned.
    pub async fn remove(&self, id: &str) -> Result<bool> {
        let mut index = self.index.write().await;
        let Some(record) = index.get(id).map(|entry| entry.payload.clone()) else {
            return Ok(false);
        };

        self.delete_blobs(&record).await?;
        index.remove(id);
        Ok(true)
    }

    // == Cleanup ==
    /// Removes every entry stamped before `cutoff`. An entry whose blobs
    /// cannot be deleted is reported and kept; the sweep carries on.
    pub async fn cleanup(&self, cutoff: u64) -> CleanupReport {
        let mut index = self.index.write().await;
        let mut report = CleanupReport::default();

        for id in index.expired_ids(cutoff) {
            let Some(record) = index.get(&id).map(|entry| entry.payload.clone()) else {
                continue;
            };

            match self.delete_blobs(&record).await {
                Ok(()) => {
                    index.expire(&id);
                    report.removed.push(id);
                }
                Err(err) => report.failed.push(CleanupFailure {
                    id,
                    reason: err.to_string(),
                }),
            }
        }

        report
    }

    // == Accessors ==
    pub async fn len(&self) -> usize {
        self.index.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.index.read().await.is_empty()
    }

    pub async fn capacity(&self) -> usize {
        self.index.read().await.capacity()
    }

    pub async fn stats(&self) -> BufferStats {
        self.index.read().await.stats()
    }

    // == Blob Helpers ==
    /// Derived artifact first, so a failure on the original never leaves a
    /// thumbnail behind for an entry that still claims it.
    async fn delete_blobs(&self, record: &BlobRecord) -> Result<()> {
        for key in record.locations() {
            self.guarded(key, self.blobs.delete(key)).await?;
        }
        Ok(())
    }

    /// Writes one blob of an add attempt.
    ///
    /// The put runs as its own task so a timeout or cancellation never drops
    /// it halfway through. A put still running when the caller gives up is
    /// deleted once it finishes.
    async fn persist(&self, key: String, bytes: Vec<u8>) -> Result<()> {
        let blobs = self.blobs.clone();
        let put_key = key.clone();
        let mut write = tokio::spawn(async move { blobs.put(&put_key, &bytes).await });

        let outcome = self
            .guarded(&key, async {
                match (&mut write).await {
                    Ok(result) => result,
                    Err(join) => Err(BlobError::Io(std::io::Error::other(join.to_string()))),
                }
            })
            .await;

        if outcome.is_err() && !write.is_finished() {
            let blobs = self.blobs.clone();
            tokio::spawn(async move {
                // Deleted whether the late put succeeded or not
                let _ = write.await;
                if let Err(err) = blobs.delete(&key).await {
                    warn!("Could not delete abandoned blob '{}': {}", key, err);
                }
            });
        }

        outcome
    }

    /// Deletes every key of a failed add. Blobs that survive are reported
    /// alongside the original failure.
    async fn abandon(&self, record: &BlobRecord, cause: UndoError) -> UndoError {
        let mut orphans = Vec::new();
        for key in record.locations() {
            if self.bounded(self.blobs.delete(key)).await.is_err() {
                orphans.push(key.to_string());
            }
        }

        if orphans.is_empty() {
            cause
        } else {
            UndoError::Orphaned {
                cause: Box::new(cause),
                orphans,
            }
        }
    }

    /// Applies the I/O timeout, if any, to one blob call.
    async fn bounded<T, F>(&self, op: F) -> std::result::Result<T, BlobError>
    where
        F: Future<Output = std::result::Result<T, BlobError>>,
    {
        match self.io_timeout {
            Some(limit) => tokio::time::timeout(limit, op)
                .await
                .unwrap_or(Err(BlobError::TimedOut)),
            None => op.await,
        }
    }

    /// Applies the timeout and cancellation token to one blob call.
    async fn guarded<T, F>(&self, key: &str, op: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, BlobError>>,
    {
        let outcome = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(BlobError::Cancelled),
            result = self.bounded(op) => result,
        };

        outcome.map_err(|source| UndoError::persistence(key, source))
    }
}

impl fmt::Debug for BlobBackedStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobBackedStore")
            .field("has_transform", &self.transform.is_some())
            .field("default_name", &self.default_name)
            .field("default_mime_type", &self.default_mime_type)
            .field("io_timeout", &self.io_timeout)
            .finish_non_exhaustive()
    }
}

/// Runs the transform on the blocking pool.
async fn derive(transform: Arc<dyn Transform>, data: &[u8]) -> Result<Vec<u8>> {
    let input = data.to_vec();
    let derived = tokio::task::spawn_blocking(move || transform.apply(&input))
        .await
        .map_err(|e| TransformError::Aborted(e.to_string()))??;
    Ok(derived)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{ManualClock, SequentialIds};
    use crate::storage::MemoryBlobStore;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Memory store whose operations can be made to fail per key.
    #[derive(Default)]
    struct FlakyBlobStore {
        inner: MemoryBlobStore,
        fail_put: Mutex<HashSet<String>>,
        fail_delete: Mutex<HashSet<String>>,
    }

    impl FlakyBlobStore {
        fn fail_put_on(&self, key: &str) {
            self.fail_put.lock().unwrap().insert(key.to_string());
        }

        fn fail_delete_on(&self, key: &str) {
            self.fail_delete.lock().unwrap().insert(key.to_string());
        }

        fn heal(&self) {
            self.fail_put.lock().unwrap().clear();
            self.fail_delete.lock().unwrap().clear();
        }
    }

    fn denied() -> BlobError {
        BlobError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ))
    }

    #[async_trait]
    impl BlobStore for FlakyBlobStore {
        async fn put(&self, key: &str, bytes: &[u8]) -> std::result::Result<(), BlobError> {
            if self.fail_put.lock().unwrap().contains(key) {
                return Err(denied());
            }
            self.inner.put(key, bytes).await
        }

        async fn get(&self, key: &str) -> std::result::Result<Vec<u8>, BlobError> {
            self.inner.get(key).await
        }

        async fn delete(&self, key: &str) -> std::result::Result<(), BlobError> {
            if self.fail_delete.lock().unwrap().contains(key) {
                return Err(denied());
            }
            self.inner.delete(key).await
        }
    }

    /// Never finishes a put.
    struct StalledBlobStore;

    #[async_trait]
    impl BlobStore for StalledBlobStore {
        async fn put(&self, _key: &str, _bytes: &[u8]) -> std::result::Result<(), BlobError> {
            std::future::pending().await
        }

        async fn get(&self, key: &str) -> std::result::Result<Vec<u8>, BlobError> {
            Err(BlobError::Missing(key.to_string()))
        }

        async fn delete(&self, _key: &str) -> std::result::Result<(), BlobError> {
            Ok(())
        }
    }

    /// Writes the bytes, then reports failure for one key, like a disk that
    /// fills up partway through a write.
    struct PartialWriteBlobStore {
        inner: MemoryBlobStore,
        fail_after_write: String,
    }

    impl PartialWriteBlobStore {
        fn failing_on(key: &str) -> Self {
            Self {
                inner: MemoryBlobStore::new(),
                fail_after_write: key.to_string(),
            }
        }
    }

    #[async_trait]
    impl BlobStore for PartialWriteBlobStore {
        async fn put(&self, key: &str, bytes: &[u8]) -> std::result::Result<(), BlobError> {
            self.inner.put(key, bytes).await?;
            if key == self.fail_after_write {
                return Err(BlobError::Io(std::io::Error::other("disk full")));
            }
            Ok(())
        }

        async fn get(&self, key: &str) -> std::result::Result<Vec<u8>, BlobError> {
            self.inner.get(key).await
        }

        async fn delete(&self, key: &str) -> std::result::Result<(), BlobError> {
            self.inner.delete(key).await
        }
    }

    /// Finishes writes on a detached task after a delay, the way a blocking
    /// filesystem write keeps going after its caller stops waiting.
    #[derive(Default)]
    struct SlowDetachedBlobStore {
        inner: Arc<MemoryBlobStore>,
    }

    #[async_trait]
    impl BlobStore for SlowDetachedBlobStore {
        async fn put(&self, key: &str, bytes: &[u8]) -> std::result::Result<(), BlobError> {
            let inner = self.inner.clone();
            let (key, bytes) = (key.to_string(), bytes.to_vec());
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                inner.put(&key, &bytes).await
            })
            .await
            .map_err(|e| BlobError::Io(std::io::Error::other(e.to_string())))?
        }

        async fn get(&self, key: &str) -> std::result::Result<Vec<u8>, BlobError> {
            self.inner.get(key).await
        }

        async fn delete(&self, key: &str) -> std::result::Result<(), BlobError> {
            self.inner.delete(key).await
        }
    }

    /// Reverses the bytes; fails on empty input.
    struct Reverse;

    impl Transform for Reverse {
        fn apply(&self, bytes: &[u8]) -> std::result::Result<Vec<u8>, TransformError> {
            if bytes.is_empty() {
                return Err(TransformError::Decode("empty input".to_string()));
            }
            Ok(bytes.iter().rev().copied().collect())
        }
    }

    fn index(capacity: usize, clock: Arc<ManualClock>) -> BoundedStore<BlobRecord> {
        BoundedStore::with_collaborators(capacity, clock, Arc::new(SequentialIds::new("b")))
            .unwrap()
    }

    fn file_store(capacity: usize, blobs: Arc<dyn BlobStore>) -> BlobBackedStore {
        BlobBackedStore::new(index(capacity, Arc::new(ManualClock::new(0))), blobs)
    }

    fn image_store(capacity: usize, blobs: Arc<dyn BlobStore>) -> BlobBackedStore {
        file_store(capacity, blobs)
            .with_transform(Arc::new(Reverse))
            .with_defaults("image", "image/jpeg")
    }

    #[tokio::test]
    async fn test_add_and_get_roundtrip() {
        let blobs = Arc::new(MemoryBlobStore::new());
        let store = file_store(5, blobs.clone());

        let id = store
            .add(Upload::new(vec![1, 2, 3]).with_name("a.bin"))
            .await
            .unwrap();

        let stored = store.get(&id, false).await.unwrap().unwrap();
        assert_eq!(stored.data, vec![1, 2, 3]);
        assert!(!stored.derived);
        assert_eq!(stored.entry.payload.name, "a.bin");
        assert_eq!(stored.entry.payload.size, 3);
        assert!(blobs.contains(&id).await);
    }

    #[tokio::test]
    async fn test_add_applies_defaults() {
        let store = file_store(5, Arc::new(MemoryBlobStore::new()));

        let id = store
            .add(Upload::new(vec![9]).with_name("  "))
            .await
            .unwrap();
        let entry = store.get(&id, false).await.unwrap().unwrap().entry;

        assert_eq!(entry.payload.name, "file");
        assert_eq!(entry.payload.mime_type, "application/octet-stream");
        assert!(entry.payload.derived_location.is_none());
    }

    #[tokio::test]
    async fn test_capacity_one_evicts_and_deletes_blob() {
        let blobs = Arc::new(MemoryBlobStore::new());
        let store = file_store(1, blobs.clone());

        let x = store.add(Upload::new(vec![1, 2, 3])).await.unwrap();
        let y = store.add(Upload::new(vec![4, 5, 6])).await.unwrap();

        assert!(!blobs.contains(&x).await);
        assert!(store.get(&x, false).await.unwrap().is_none());
        assert_eq!(store.get(&y, false).await.unwrap().unwrap().data, vec![4, 5, 6]);
        assert_eq!(store.len().await, 1);
        assert_eq!(store.stats().await.evictions, 1);
    }

    #[tokio::test]
    async fn test_image_store_writes_thumbnail() {
        let blobs = Arc::new(MemoryBlobStore::new());
        let store = image_store(3, blobs.clone());

        let id = store.add(Upload::new(vec![1, 2, 3])).await.unwrap();

        let thumb = store.get(&id, true).await.unwrap().unwrap();
        assert!(thumb.derived);
        assert_eq!(thumb.data, vec![3, 2, 1]);
        assert_eq!(thumb.entry.payload.name, "image");
        assert_eq!(thumb.entry.payload.mime_type, "image/jpeg");

        let original = store.get(&id, false).await.unwrap().unwrap();
        assert_eq!(original.data, vec![1, 2, 3]);

        assert!(blobs.contains(&format!("{}{}", id, DERIVED_SUFFIX)).await);
    }

    #[tokio::test]
    async fn test_want_derived_without_transform_reads_original() {
        let store = file_store(3, Arc::new(MemoryBlobStore::new()));
        let id = store.add(Upload::new(vec![7, 7])).await.unwrap();

        let stored = store.get(&id, true).await.unwrap().unwrap();
        assert!(!stored.derived);
        assert_eq!(stored.data, vec![7, 7]);
    }

    #[tokio::test]
    async fn test_transform_failure_leaves_nothing_behind() {
        let blobs = Arc::new(MemoryBlobStore::new());
        let store = image_store(3, blobs.clone());
        store.add(Upload::new(vec![1])).await.unwrap();

        let result = store.add(Upload::new(Vec::new())).await;

        assert!(matches!(result, Err(UndoError::Transform(_))));
        assert_eq!(store.len().await, 1);
        // Only the first upload and its thumbnail exist
        assert_eq!(blobs.len().await, 2);
    }

    #[tokio::test]
    async fn test_put_failure_leaves_index_unchanged() {
        let blobs = Arc::new(FlakyBlobStore::default());
        let store = file_store(2, blobs.clone());

        let a = store.add(Upload::new(vec![1])).await.unwrap();
        let b = store.add(Upload::new(vec![2])).await.unwrap();

        // Ids are sequential: the next attempt is b2
        blobs.fail_put_on("b2");
        let result = store.add(Upload::new(vec![3])).await;

        assert!(matches!(result, Err(UndoError::Persistence { .. })));
        assert_eq!(store.len().await, 2);
        let ids: Vec<String> = store.get_all().await.into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![a, b]);
        assert!(!blobs.inner.contains("b2").await);
    }

    #[tokio::test]
    async fn test_thumbnail_put_failure_discards_original() {
        let blobs = Arc::new(FlakyBlobStore::default());
        let store = image_store(2, blobs.clone());

        blobs.fail_put_on("b0_thumb");
        let result = store.add(Upload::new(vec![1, 2])).await;

        assert!(result.is_err());
        assert!(store.is_empty().await);
        assert!(blobs.inner.is_empty().await);
    }

    #[tokio::test]
    async fn test_eviction_delete_failure_aborts_add() {
        let blobs = Arc::new(FlakyBlobStore::default());
        let store = file_store(1, blobs.clone());

        let first = store.add(Upload::new(vec![1])).await.unwrap();
        blobs.fail_delete_on(&first);

        let result = store.add(Upload::new(vec![2])).await;

        assert!(matches!(result, Err(UndoError::Persistence { .. })));
        assert_eq!(store.len().await, 1);
        assert!(store.get(&first, false).await.unwrap().is_some());
        // The new upload's blob was cleaned up
        assert!(!blobs.inner.contains("b1").await);
        assert_eq!(store.stats().await.evictions, 0);
    }

    #[tokio::test]
    async fn test_failed_put_that_wrote_bytes_is_discarded() {
        let blobs = Arc::new(PartialWriteBlobStore::failing_on("b0"));
        let store = file_store(2, blobs.clone());

        let result = store.add(Upload::new(vec![1, 2, 3])).await;

        assert!(matches!(result, Err(UndoError::Persistence { key, .. }) if key == "b0"));
        assert!(store.is_empty().await);
        assert!(blobs.inner.is_empty().await);
    }

    #[tokio::test]
    async fn test_failed_thumbnail_put_discards_both_keys() {
        let blobs = Arc::new(PartialWriteBlobStore::failing_on("b0_thumb"));
        let store = image_store(2, blobs.clone());

        let result = store.add(Upload::new(vec![1, 2, 3])).await;

        assert!(matches!(result, Err(UndoError::Persistence { key, .. }) if key == "b0_thumb"));
        assert!(store.is_empty().await);
        assert!(!blobs.inner.contains("b0").await);
        assert!(!blobs.inner.contains("b0_thumb").await);
    }

    #[tokio::test]
    async fn test_timed_out_put_is_deleted_once_it_lands() {
        let blobs = Arc::new(SlowDetachedBlobStore::default());
        let store = file_store(2, blobs.clone()).with_io_timeout(Duration::from_millis(10));

        let result = store.add(Upload::new(vec![1])).await;

        assert!(matches!(
            result,
            Err(UndoError::Persistence {
                source: BlobError::TimedOut,
                ..
            })
        ));
        assert!(store.is_empty().await);

        // Let the late write land and the store clean up after it
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(blobs.inner.is_empty().await);
    }

    #[tokio::test]
    async fn test_undeletable_blob_of_failed_add_is_reported() {
        let blobs = Arc::new(FlakyBlobStore::default());
        let store = image_store(2, blobs.clone());

        blobs.fail_put_on("b0_thumb");
        blobs.fail_delete_on("b0");
        let result = store.add(Upload::new(vec![1, 2])).await;

        match result {
            Err(UndoError::Orphaned { cause, orphans }) => {
                assert_eq!(orphans, vec!["b0".to_string()]);
                assert!(matches!(
                    *cause,
                    UndoError::Persistence { ref key, .. } if key == "b0_thumb"
                ));
            }
            other => panic!("expected orphaned blobs to be reported, got {:?}", other),
        }
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_remove() {
        let blobs = Arc::new(MemoryBlobStore::new());
        let store = image_store(3, blobs.clone());
        let id = store.add(Upload::new(vec![1, 2])).await.unwrap();

        assert!(store.remove(&id).await.unwrap());
        assert!(blobs.is_empty().await);
        assert!(store.get(&id, false).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove_unknown_is_false_not_error() {
        let store = file_store(3, Arc::new(MemoryBlobStore::new()));

        assert!(!store.remove("never").await.unwrap());
        assert!(store.get("never", false).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove_failure_keeps_entry() {
        let blobs = Arc::new(FlakyBlobStore::default());
        let store = image_store(3, blobs.clone());
        let id = store.add(Upload::new(vec![1, 2])).await.unwrap();

        blobs.fail_delete_on(&id);
        let result = store.remove(&id).await;

        assert!(matches!(result, Err(UndoError::Persistence { key, .. }) if key == id));
        assert_eq!(store.len().await, 1);

        // Retry converges once storage recovers
        blobs.heal();
        assert!(store.remove(&id).await.unwrap());
        assert!(blobs.inner.is_empty().await);
    }

    #[tokio::test]
    async fn test_get_missing_blob_is_error_not_absence() {
        let blobs = Arc::new(MemoryBlobStore::new());
        let store = file_store(3, blobs.clone());
        let id = store.add(Upload::new(vec![1])).await.unwrap();

        blobs.delete(&id).await.unwrap();

        let result = store.get(&id, false).await;
        assert!(matches!(
            result,
            Err(UndoError::Persistence {
                source: BlobError::Missing(_),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_cleanup_continues_past_failures() {
        let clock = Arc::new(ManualClock::new(100));
        let blobs = Arc::new(FlakyBlobStore::default());
        let store = BlobBackedStore::new(index(10, clock.clone()), blobs.clone());

        let a = store.add(Upload::new(vec![1])).await.unwrap();
        let b = store.add(Upload::new(vec![2])).await.unwrap();
        let c = store.add(Upload::new(vec![3])).await.unwrap();
        clock.set(500);
        let d = store.add(Upload::new(vec![4])).await.unwrap();

        blobs.fail_delete_on(&b);
        let report = store.cleanup(200).await;

        assert_eq!(report.removed, vec![a, c]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].id, b);

        let remaining: Vec<String> = store.get_all().await.into_iter().map(|e| e.id).collect();
        assert_eq!(remaining, vec![b, d]);
        assert_eq!(store.stats().await.expired, 2);
    }

    #[tokio::test]
    async fn test_io_timeout() {
        let store = file_store(3, Arc::new(StalledBlobStore))
            .with_io_timeout(Duration::from_millis(20));

        let result = store.add(Upload::new(vec![1])).await;

        assert!(matches!(
            result,
            Err(UndoError::Persistence {
                source: BlobError::TimedOut,
                ..
            })
        ));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_cancellation() {
        let token = CancellationToken::new();
        let store = file_store(3, Arc::new(StalledBlobStore)).with_cancellation(token.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        });

        let result = store.add(Upload::new(vec![1])).await;
        canceller.await.unwrap();

        assert!(matches!(
            result,
            Err(UndoError::Persistence {
                source: BlobError::Cancelled,
                ..
            })
        ));
        assert!(store.cancellation_token().is_cancelled());
    }
}
