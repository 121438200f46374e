use std::sync::Arc;

use futures::future::BoxFuture;
use mongodb::{Client, Collection, Database, bson::doc};
use tokio::sync::RwLock;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult, is_duplicate_key},
    models::{MongoPartyDocument, doc_id, versioned_doc_id},
};
use crate::dao::{models::PartyEntity, party_store::PartyStore, storage::StorageResult};

const PARTY_COLLECTION_NAME: &str = "parties";

/// MongoDB-backed party store keeping one document per party.
#[derive(Clone)]
pub struct MongoPartyStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    #[allow(dead_code)]
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoPartyStore {
    /// Establish a connection to MongoDB.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        Ok(Self { inner })
    }

    async fn collection(&self) -> Collection<MongoPartyDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoPartyDocument>(PARTY_COLLECTION_NAME)
    }

    async fn insert_party(&self, party: PartyEntity) -> MongoResult<()> {
        let id = party.id.clone();
        let document: MongoPartyDocument = party.into();
        let collection = self.collection().await;

        collection
            .insert_one(&document)
            .await
            .map_err(|source| {
                if is_duplicate_key(&source) {
                    MongoDaoError::DuplicateParty { id: id.clone() }
                } else {
                    MongoDaoError::InsertParty {
                        id: id.clone(),
                        source,
                    }
                }
            })?;

        Ok(())
    }

    async fn find_party(&self, id: String) -> MongoResult<Option<PartyEntity>> {
        let collection = self.collection().await;

        let document = collection
            .find_one(doc_id(&id))
            .await
            .map_err(|source| MongoDaoError::LoadParty {
                id: id.clone(),
                source,
            })?;

        Ok(document.map(Into::into))
    }

    async fn replace_party(&self, party: PartyEntity, expected_version: u64) -> MongoResult<bool> {
        let id = party.id.clone();
        let document: MongoPartyDocument = party.into();
        let collection = self.collection().await;

        let result = collection
            .replace_one(versioned_doc_id(&id, expected_version), &document)
            .await
            .map_err(|source| MongoDaoError::ReplaceParty {
                id: id.clone(),
                source,
            })?;

        Ok(result.matched_count == 1)
    }
}

impl PartyStore for MongoPartyStore {
    fn insert_party(&self, party: PartyEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_party(party).await.map_err(Into::into) })
    }

    fn find_party(&self, id: String) -> BoxFuture<'static, StorageResult<Option<PartyEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_party(id).await.map_err(Into::into) })
    }

    fn replace_party(
        &self,
        party: PartyEntity,
        expected_version: u64,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .replace_party(party, expected_version)
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
