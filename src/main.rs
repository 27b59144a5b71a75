//! Match tracker binary entrypoint wiring REST, SSE, the setup draft file and the match store.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use match_tracker_back::{
    config::AppConfig,
    dao::{
        draft_store::FileDraftStore,
        match_store::{MatchStore, memory::InMemoryMatchStore},
    },
    init_tracing, routes,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let draft_store = Arc::new(FileDraftStore::new(config.draft_path.clone()));
    let app_state = AppState::new(config, draft_store);

    spawn_match_store(app_state.clone()).await;

    let app = routes::app(app_state);

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

/// Select the match store backend from `STORE_BACKEND` (`mongo`, `couch` or
/// `memory`) and keep it connected in the background.
async fn spawn_match_store(state: SharedState) {
    let backend = env::var("STORE_BACKEND").unwrap_or_else(|_| default_backend().to_owned());
    info!(backend = %backend, "selecting match store backend");

    match backend.as_str() {
        #[cfg(feature = "mongo-store")]
        "mongo" | "mongodb" => {
            use match_tracker_back::dao::match_store::mongodb::{MongoConfig, MongoMatchStore};
            use match_tracker_back::dao::storage::StorageError;
            use match_tracker_back::services::storage_supervisor;

            tokio::spawn(storage_supervisor::run(state, || async {
                let config = MongoConfig::from_env().await.map_err(StorageError::from)?;
                let store = MongoMatchStore::connect(config)
                    .await
                    .map_err(StorageError::from)?;
                Ok::<_, StorageError>(Arc::new(store) as Arc<dyn MatchStore>)
            }));
        }
        #[cfg(feature = "couch-store")]
        "couch" | "couchdb" => {
            use match_tracker_back::dao::match_store::couchdb::{CouchConfig, CouchMatchStore};
            use match_tracker_back::dao::storage::StorageError;
            use match_tracker_back::services::storage_supervisor;

            tokio::spawn(storage_supervisor::run(state, || async {
                let config = CouchConfig::from_env().map_err(StorageError::from)?;
                let store = CouchMatchStore::connect(config)
                    .await
                    .map_err(StorageError::from)?;
                Ok::<_, StorageError>(Arc::new(store) as Arc<dyn MatchStore>)
            }));
        }
        other => {
            if other != "memory" {
                warn!(backend = %other, "unknown or disabled store backend; using in-memory store");
            }
            state
                .install_match_store(Arc::new(InMemoryMatchStore::new()))
                .await;
        }
    }
}

fn default_backend() -> &'static str {
    if cfg!(feature = "mongo-store") {
        "mongo"
    } else {
        "memory"
    }
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
