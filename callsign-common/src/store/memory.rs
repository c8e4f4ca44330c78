//! In-process member store
//!
//! Backs the `--memory` development mode and the importer tests.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{MemberStore, StoreError};
use crate::member::Member;

/// Member store held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryMemberStore {
    members: RwLock<BTreeMap<String, Member>>,
}

impl MemoryMemberStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `members`
    pub fn with_members(members: impl IntoIterator<Item = Member>) -> Self {
        let members = members
            .into_iter()
            .map(|m| (m.callsign.clone(), m))
            .collect();
        Self {
            members: RwLock::new(members),
        }
    }

    /// Snapshot of all stored members in callsign order
    pub async fn snapshot(&self) -> Vec<Member> {
        self.members.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl MemberStore for MemoryMemberStore {
    async fn get(&self, callsign: &str) -> Result<Option<Member>, StoreError> {
        Ok(self.members.read().await.get(callsign).cloned())
    }

    async fn put(&self, member: &Member) -> Result<(), StoreError> {
        self.members
            .write()
            .await
            .insert(member.callsign.clone(), member.clone());
        Ok(())
    }

    async fn scan_keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.members.read().await.keys().cloned().collect())
    }

    async fn delete_multi(&self, callsigns: &[String]) -> Result<(), StoreError> {
        let mut members = self.members.write().await;
        for callsign in callsigns {
            members.remove(callsign);
        }
        Ok(())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.members.read().await.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = MemoryMemberStore::new();
        let mut member = Member::with_callsign("W1ABC");
        member.name = "John Doe".to_string();

        store.put(&member).await.unwrap();
        assert_eq!(store.get("W1ABC").await.unwrap(), Some(member.clone()));
        assert_eq!(store.get("K2XYZ").await.unwrap(), None);

        member.year_expiring = 2025;
        store.put(&member).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(store.get("W1ABC").await.unwrap().unwrap().year_expiring, 2025);

        store
            .delete_multi(&["W1ABC".to_string(), "NOPE".to_string()])
            .await
            .unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_scan_keys_sorted() {
        let store = MemoryMemberStore::with_members(vec![
            Member::with_callsign("W1ABC"),
            Member::with_callsign("K2XYZ"),
        ]);
        assert_eq!(store.scan_keys().await.unwrap(), vec!["K2XYZ", "W1ABC"]);
    }
}
