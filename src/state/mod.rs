pub mod identifiers;
pub mod ledger;
pub mod lifecycle;
pub mod party;
pub mod rounds;
pub mod scoring;
pub mod transactions;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock, watch};

use crate::{
    config::AppConfig, dao::party_store::PartyStore, error::ServiceError, state::party::Party,
};

pub type SharedState = Arc<AppState>;

/// Central application state holding the storage handle and per-party write gates.
///
/// Party data itself is never cached here: every operation reads the aggregate from the
/// store, and writes go through [`AppState::run_party_transaction`].
pub struct AppState {
    party_store: RwLock<Option<Arc<dyn PartyStore>>>,
    degraded: watch::Sender<bool>,
    party_gates: DashMap<String, Arc<Mutex<()>>>,
    config: AppConfig,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        Self::build(config, None)
    }

    /// Construct a state with a store already installed.
    pub fn with_store(config: AppConfig, store: Arc<dyn PartyStore>) -> SharedState {
        Self::build(config, Some(store))
    }

    fn build(config: AppConfig, store: Option<Arc<dyn PartyStore>>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(store.is_none());
        Arc::new(Self {
            party_store: RwLock::new(store),
            degraded: degraded_tx,
            party_gates: DashMap::new(),
            config,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current party store, if one is installed.
    pub async fn party_store(&self) -> Option<Arc<dyn PartyStore>> {
        let guard = self.party_store.read().await;
        guard.as_ref().cloned()
    }

    /// Party store usable for engine operations, or [`ServiceError::Degraded`].
    pub async fn require_party_store(&self) -> Result<Arc<dyn PartyStore>, ServiceError> {
        if self.is_degraded() {
            return Err(ServiceError::Degraded);
        }
        self.party_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new party store implementation and leave degraded mode.
    pub async fn set_party_store(&self, store: Arc<dyn PartyStore>) {
        {
            let mut guard = self.party_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current party store and enter degraded mode.
    pub async fn clear_party_store(&self) {
        {
            let mut guard = self.party_store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Update the degraded flag, notifying watchers only when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Read a party aggregate.
    pub async fn load_party(&self, party_id: &str) -> Result<Party, ServiceError> {
        let store = self.require_party_store().await?;
        store
            .find_party(party_id.to_owned())
            .await?
            .map(Party::from)
            .ok_or_else(|| ServiceError::party_not_found(party_id))
    }
}
