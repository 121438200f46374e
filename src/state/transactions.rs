//! Atomic read-modify-write of a party aggregate.

use std::{sync::Arc, time::SystemTime};

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::warn;

use crate::{
    dao::{models::PartyEntity, storage::StorageError},
    error::ServiceError,
    state::{AppState, party::Party},
};

impl AppState {
    /// Load a party, apply `work` to it and commit the result as one unit.
    ///
    /// Writers of the same party are serialized in process, and the store only accepts the
    /// commit if the stored version is still the one that was loaded. When `work` fails nothing
    /// is written. A commit lost against another process surfaces as a storage conflict and is
    /// not retried.
    pub async fn run_party_transaction<F, T>(
        &self,
        party_id: &str,
        work: F,
    ) -> Result<T, ServiceError>
    where
        F: FnOnce(&mut Party) -> Result<T, ServiceError>,
    {
        let store = self.require_party_store().await?;
        let _lease = self.lease_party_gate(party_id).await;

        let Some(entity) = store.find_party(party_id.to_owned()).await? else {
            return Err(ServiceError::party_not_found(party_id));
        };

        let expected_version = entity.version;
        let mut party = Party::from(entity);
        let value = work(&mut party)?;

        party.version = expected_version + 1;
        party.updated_at = SystemTime::now();
        let committed = store
            .replace_party(PartyEntity::from(party), expected_version)
            .await?;

        if !committed {
            warn!(
                party_id,
                expected_version, "party changed concurrently; write rejected"
            );
            return Err(StorageError::conflict(format!(
                "party `{party_id}` was modified by another writer"
            ))
            .into());
        }

        Ok(value)
    }

    /// Lock the write gate of `party_id`, creating it on first use.
    async fn lease_party_gate<'a>(&'a self, party_id: &'a str) -> PartyGateLease<'a> {
        let gate = self
            .party_gates
            .entry(party_id.to_owned())
            .or_default()
            .value()
            .clone();
        PartyGateLease {
            gates: &self.party_gates,
            party_id,
            guard: Some(gate.lock_owned().await),
        }
    }
}

/// Holds a party's write gate and forgets it on drop once no other writer waits on it.
struct PartyGateLease<'a> {
    gates: &'a DashMap<String, Arc<Mutex<()>>>,
    party_id: &'a str,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for PartyGateLease<'_> {
    fn drop(&mut self) {
        self.guard.take();
        self.gates
            .remove_if(self.party_id, |_, gate| Arc::strong_count(gate) == 1);
    }
}
