use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::dao::{models::PartyEntity, party_store::PartyStore, storage::StorageResult};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{CouchPartyDocument, party_doc_id},
};

/// CouchDB-backed party store; every party lives in a single `party::{id}` document.
#[derive(Clone)]
pub struct CouchPartyStore {
    client: Client,
    base_url: Arc<str>,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
}

impl CouchPartyStore {
    /// Establish a connection to CouchDB and ensure the database exists.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let base_url = Arc::<str>::from(config.base_url.trim_end_matches('/'));
        let database = Arc::<str>::from(config.database);
        let auth = config
            .username
            .zip(config.password)
            .map(|(u, p)| (Arc::<str>::from(u), Arc::<str>::from(p)));

        let store = Self {
            client,
            base_url,
            database,
            auth,
        };

        store.ensure_database().await?;
        Ok(store)
    }

    fn database_url(&self) -> String {
        format!("{}/{}", self.base_url, self.database)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.auth {
            Some((ref user, ref pass)) => builder.basic_auth(user.as_ref(), Some(pass.as_ref())),
            None => builder,
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.database_url(), path);
        self.authorize(self.client.request(method, url))
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.database.to_string();
        let url = self.database_url();

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|source| CouchDaoError::DatabaseQuery {
                database: database.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let create = self
                    .authorize(self.client.put(&url))
                    .send()
                    .await
                    .map_err(|source| CouchDaoError::DatabaseCreate {
                        database: database.clone(),
                        source,
                    })?;
                // 412: created concurrently by another instance
                if create.status().is_success() || create.status() == StatusCode::PRECONDITION_FAILED
                {
                    Ok(())
                } else {
                    Err(CouchDaoError::DatabaseStatus {
                        database,
                        status: create.status(),
                    })
                }
            }
            other => Err(CouchDaoError::DatabaseStatus {
                database,
                status: other,
            }),
        }
    }

    async fn get_document<T>(&self, doc_id: &str) -> CouchResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, doc_id)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                response.json::<T>().await.map(Some).map_err(|source| {
                    CouchDaoError::DecodeResponse {
                        path: doc_id.to_string(),
                        source,
                    }
                })
            }
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    /// PUT a document. A `409` means the id exists or `_rev` is stale.
    async fn put_document<T>(&self, doc_id: &str, document: &T) -> CouchResult<()>
    where
        T: ?Sized + Serialize,
    {
        let response = self
            .request(Method::PUT, doc_id)
            .json(document)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::CONFLICT => Err(CouchDaoError::DocumentConflict {
                path: doc_id.to_string(),
            }),
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    async fn replace_party(&self, party: PartyEntity, expected_version: u64) -> CouchResult<bool> {
        let doc_id = party_doc_id(&party.id);
        let Some(existing) = self.get_document::<CouchPartyDocument>(&doc_id).await? else {
            return Ok(false);
        };
        if existing.party.version != expected_version {
            return Ok(false);
        }

        let document = CouchPartyDocument::from_entity(party, existing.rev);
        match self.put_document(&doc_id, &document).await {
            Ok(()) => Ok(true),
            Err(CouchDaoError::DocumentConflict { .. }) => {
                debug!(doc_id = %doc_id, "CouchDB revision moved during replace");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }
}

impl PartyStore for CouchPartyStore {
    fn insert_party(&self, party: PartyEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let doc_id = party_doc_id(&party.id);
            let document = CouchPartyDocument::from_entity(party, None);
            store
                .put_document(&doc_id, &document)
                .await
                .map_err(Into::into)
        })
    }

    fn find_party(&self, id: String) -> BoxFuture<'static, StorageResult<Option<PartyEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let doc_id = party_doc_id(&id);
            let maybe_doc = store.get_document::<CouchPartyDocument>(&doc_id).await?;
            Ok(maybe_doc.map(CouchPartyDocument::into_entity))
        })
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
        Box::pin(async move {
            let url = store.database_url();
            let response = store
                .authorize(store.client.get(&url))
                .send()
                .await
                .map_err(|source| CouchDaoError::RequestSend {
                    path: url.clone(),
                    source,
                })?;

            if response.status().is_success() {
                Ok(())
            } else {
                Err(CouchDaoError::RequestStatus {
                    path: url,
                    status: response.status(),
                }
                .into())
            }
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_database().await.map_err(Into::into) })
    }
}
