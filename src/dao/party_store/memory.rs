//! Process-local party store, used for local runs and tests.

use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::BoxFuture;

use crate::dao::{
    models::PartyEntity,
    party_store::PartyStore,
    storage::{StorageError, StorageResult},
};

/// Keeps every party in a concurrent map keyed by party id.
#[derive(Clone, Default)]
pub struct MemoryPartyStore {
    parties: Arc<DashMap<String, PartyEntity>>,
}

impl MemoryPartyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored parties.
    pub fn len(&self) -> usize {
        self.parties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parties.is_empty()
    }
}

impl PartyStore for MemoryPartyStore {
    fn insert_party(&self, party: PartyEntity) -> BoxFuture<'static, StorageResult<()>> {
        let parties = self.parties.clone();
        Box::pin(async move {
            match parties.entry(party.id.clone()) {
                Entry::Occupied(_) => Err(StorageError::conflict(format!(
                    "party `{}` already exists",
                    party.id
                ))),
                Entry::Vacant(slot) => {
                    slot.insert(party);
                    Ok(())
                }
            }
        })
    }

    fn find_party(&self, id: String) -> BoxFuture<'static, StorageResult<Option<PartyEntity>>> {
        let parties = self.parties.clone();
        Box::pin(async move { Ok(parties.get(&id).map(|entry| entry.value().clone())) })
    }

    fn replace_party(
        &self,
        party: PartyEntity,
        expected_version: u64,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let parties = self.parties.clone();
        Box::pin(async move {
            let Some(mut stored) = parties.get_mut(&party.id) else {
                return Ok(false);
            };
            if stored.version != expected_version {
                return Ok(false);
            }
            *stored = party;
            Ok(true)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;

    fn entity(id: &str, version: u64) -> PartyEntity {
        PartyEntity {
            id: id.into(),
            name: "Party".into(),
            admin_token: "TOKEN".into(),
            songs_per_round: 5,
            started: false,
            current_round: 0,
            show_results: false,
            participants: Vec::new(),
            songs: Vec::new(),
            guesses: Vec::new(),
            created_at: SystemTime::UNIX_EPOCH,
            updated_at: SystemTime::UNIX_EPOCH,
            version,
        }
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_ids() {
        let store = MemoryPartyStore::new();
        store.insert_party(entity("AAAAAA", 0)).await.unwrap();

        let err = store.insert_party(entity("AAAAAA", 0)).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict { .. }));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn replace_checks_the_expected_version() {
        let store = MemoryPartyStore::new();
        store.insert_party(entity("AAAAAA", 0)).await.unwrap();

        let mut next = entity("AAAAAA", 1);
        next.name = "Renamed".into();
        assert!(store.replace_party(next.clone(), 0).await.unwrap());
        // a second writer that loaded version 0 loses
        assert!(!store.replace_party(entity("AAAAAA", 1), 0).await.unwrap());

        let stored = store.find_party("AAAAAA".into()).await.unwrap().unwrap();
        assert_eq!(stored, next);
    }

    #[tokio::test]
    async fn replace_of_unknown_party_is_rejected() {
        let store = MemoryPartyStore::new();
        assert!(!store.replace_party(entity("ZZZZZZ", 1), 0).await.unwrap());
        assert!(store.find_party("ZZZZZZ".into()).await.unwrap().is_none());
    }
}
