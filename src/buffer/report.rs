//! Cleanup results.

use serde::Serialize;

/// An entry a sweep could not remove.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupFailure {
    pub id: String,
    pub reason: String,
}

/// Outcome of one store's cleanup sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    /// Ids removed, oldest first
    pub removed: Vec<String>,
    /// Entries left in place because their blobs could not be deleted
    pub failed: Vec<CleanupFailure>,
}

impl CleanupReport {
    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Outcome of a sweep across every store, all judged against one cutoff.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Entries stamped before this instant (Unix ms) were targeted
    pub cutoff: u64,
    pub messages: CleanupReport,
    pub files: CleanupReport,
    pub images: CleanupReport,
}

impl SweepReport {
    pub fn total_removed(&self) -> usize {
        self.parts().map(CleanupReport::removed_count).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.parts().map(|part| part.failed.len()).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.parts().all(CleanupReport::is_clean)
    }

    fn parts(&self) -> impl Iterator<Item = &CleanupReport> {
        [&self.messages, &self.files, &self.images].into_iter()
    }
}
