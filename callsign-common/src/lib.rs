//! # Callsign Directory Common Library
//!
//! Shared code for the callsign directory service:
//! - Member model and callsign normalization
//! - Member store trait with SQLite and in-memory implementations
//! - Configuration loading
//! - Configuration error type

pub mod config;
pub mod error;
pub mod member;
pub mod store;

pub use error::{Error, Result};
pub use member::{normalize_callsign, Member};
pub use store::{MemberStore, MemoryMemberStore, StoreError};

#[cfg(feature = "sqlx")]
pub use store::SqliteMemberStore;
