//! Member persistence
//!
//! The directory treats persistence as a plain key-value service keyed by
//! callsign: point get, point put, key-only full scan and multi-key delete.
//! Everything above this trait (lookup, bulk import) is written against
//! `dyn MemberStore` so tests can swap in the in-memory implementation.

use async_trait::async_trait;
use thiserror::Error;

use crate::member::Member;

mod memory;
#[cfg(feature = "sqlx")]
mod sqlite;

pub use memory::MemoryMemberStore;
#[cfg(feature = "sqlx")]
pub use sqlite::SqliteMemberStore;

/// Store operation errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying database rejected the operation
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Filesystem error while opening the store
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Store cannot serve the request (e.g. injected failure, closed pool)
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Key-value persistence for members, keyed by normalized callsign
#[async_trait]
pub trait MemberStore: Send + Sync {
    /// Point lookup. `Ok(None)` when no member has this callsign.
    async fn get(&self, callsign: &str) -> Result<Option<Member>, StoreError>;

    /// Insert or replace the member stored under `member.callsign`
    async fn put(&self, member: &Member) -> Result<(), StoreError>;

    /// Key-only scan of every stored callsign
    async fn scan_keys(&self) -> Result<Vec<String>, StoreError>;

    /// Delete every listed callsign. Missing keys are ignored.
    async fn delete_multi(&self, callsigns: &[String]) -> Result<(), StoreError>;

    /// Number of stored members
    async fn count(&self) -> Result<u64, StoreError>;
}
