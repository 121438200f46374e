#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::PartyEntity;
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;

/// Abstraction over the persistence layer for party aggregates.
///
/// Writes are whole-aggregate: callers load a party, mutate it and hand it back with the
/// version they loaded, so the backend can reject writes racing another writer.
pub trait PartyStore: Send + Sync {
    /// Persist a new party. Fails with [`StorageError::Conflict`](crate::dao::storage::StorageError::Conflict)
    /// when the id is taken.
    fn insert_party(&self, party: PartyEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_party(&self, id: String) -> BoxFuture<'static, StorageResult<Option<PartyEntity>>>;
    /// Replace a party if its stored version still equals `expected_version`.
    /// Returns `false` when the party changed meanwhile or does not exist.
    fn replace_party(
        &self,
        party: PartyEntity,
        expected_version: u64,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
