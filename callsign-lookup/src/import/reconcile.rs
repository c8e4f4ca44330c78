//! Reconciliation bookkeeping for a full-replace upload
//!
//! [`ReconciliationIndex`] is a snapshot of every callsign stored before the
//! upload began. Each accepted row claims its callsign out of the index;
//! whatever is left unclaimed at end of input is stale and gets deleted.
//!
//! Memory is proportional to the number of stored members. That is fine
//! for a club roster but is the ceiling to watch if the directory grows
//! into the millions.

use callsign_common::{MemberStore, StoreError};
use std::collections::{BTreeSet, HashSet};

/// Callsigns that existed before the upload and have not been seen yet
#[derive(Debug, Clone, Default)]
pub struct ReconciliationIndex {
    existing: HashSet<String>,
}

impl ReconciliationIndex {
    /// Take the key-only snapshot. Must complete before any write is queued.
    pub async fn snapshot(store: &dyn MemberStore) -> Result<Self, StoreError> {
        let keys = store.scan_keys().await?;
        Ok(Self::from_keys(keys))
    }

    pub fn from_keys(keys: impl IntoIterator<Item = String>) -> Self {
        Self {
            existing: keys.into_iter().collect(),
        }
    }

    /// Remove `callsign` from the index; true if it was stored before the upload
    pub fn claim(&mut self, callsign: &str) -> bool {
        self.existing.remove(callsign)
    }

    pub fn len(&self) -> usize {
        self.existing.len()
    }

    pub fn is_empty(&self) -> bool {
        self.existing.is_empty()
    }

    /// Unclaimed callsigns, sorted for a stable report
    pub fn into_stale(self) -> Vec<String> {
        let mut stale: Vec<String> = self.existing.into_iter().collect();
        stale.sort();
        stale
    }
}

/// How one accepted row relates to the store and to earlier rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowClass {
    /// Not stored before the upload
    Added,
    /// Stored before the upload; overwritten
    Updated,
    /// Callsign already appeared earlier in this upload; not written again
    Duplicate,
}

/// Per-upload row classification
///
/// Owned by the single task reading the CSV; never shared with writers.
#[derive(Debug, Default)]
pub struct BatchTracker {
    processed: HashSet<String>,
    duplicates: BTreeSet<String>,
}

impl BatchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify `callsign` and record it as seen
    ///
    /// The duplicate check runs before the index is consulted, so the first
    /// occurrence of a callsign decides added/updated and later ones are
    /// dropped.
    pub fn classify(&mut self, callsign: &str, index: &mut ReconciliationIndex) -> RowClass {
        if self.processed.contains(callsign) {
            self.duplicates.insert(callsign.to_string());
            return RowClass::Duplicate;
        }
        self.processed.insert(callsign.to_string());

        if index.claim(callsign) {
            RowClass::Updated
        } else {
            RowClass::Added
        }
    }

    pub fn into_duplicates(self) -> Vec<String> {
        self.duplicates.into_iter().collect()
    }
}
