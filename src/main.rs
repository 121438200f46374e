//! Wrapped Party binary entrypoint wiring the REST API, the storage supervisor, and tracing.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wrapped_party_back::{
    config::{AppConfig, StorageBackend},
    dao::party_store::memory::MemoryPartyStore,
    routes,
    services::storage_supervisor,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let app_state = AppState::new(config);

    spawn_storage(app_state.clone(), StorageBackend::from_env()).await;
    tokio::spawn(log_degraded_changes(app_state.clone()));

    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Install the selected party store, supervising durable backends in the background.
async fn spawn_storage(state: SharedState, backend: StorageBackend) {
    info!(?backend, "selecting storage backend");
    match backend {
        StorageBackend::Memory => {
            warn!("using the in-memory party store; parties are lost on restart");
            state
                .set_party_store(Arc::new(MemoryPartyStore::new()))
                .await;
        }
        #[cfg(feature = "mongo-store")]
        StorageBackend::Mongo => {
            use wrapped_party_back::dao::{
                party_store::{
                    PartyStore,
                    mongodb::{MongoConfig, MongoPartyStore},
                },
                storage::StorageError,
            };

            tokio::spawn(storage_supervisor::run(state, || async {
                let config = MongoConfig::from_env().await?;
                let store = MongoPartyStore::connect(config).await?;
                Ok::<_, StorageError>(Arc::new(store) as Arc<dyn PartyStore>)
            }));
        }
        #[cfg(feature = "couch-store")]
        StorageBackend::Couch => {
            use wrapped_party_back::dao::{
                party_store::{
                    PartyStore,
                    couchdb::{CouchConfig, CouchPartyStore},
                },
                storage::StorageError,
            };

            tokio::spawn(storage_supervisor::run(state, || async {
                let config = CouchConfig::from_env()?;
                let store = CouchPartyStore::connect(config).await?;
                Ok::<_, StorageError>(Arc::new(store) as Arc<dyn PartyStore>)
            }));
        }
    }
}

/// Log every switch in and out of degraded mode.
async fn log_degraded_changes(state: SharedState) {
    let mut degraded = state.degraded_watcher();
    while degraded.changed().await.is_ok() {
        if *degraded.borrow_and_update() {
            warn!("entered degraded mode; party operations answer 503");
        } else {
            info!("left degraded mode");
        }
    }
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
