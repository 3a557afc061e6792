//! Quiz show backend entrypoint wiring REST, SSE and the document store.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use quiz_show_back::{
    config::{AppConfig, StorageBackend},
    dao::{
        document_store::{DocumentStore, MemoryDocumentStore},
        question_source::CsvQuestionSource,
        storage::StorageError,
    },
    routes,
    services::storage_supervisor,
    state::{AppState, SharedState},
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let source = Arc::new(CsvQuestionSource::new(
        config.question_csv_path.clone(),
        config.part_one_rows,
    ));
    let app_state = AppState::new(config, source);

    spawn_storage_supervisor(app_state.clone(), StorageBackend::from_env());
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

/// Start the storage supervisor for the selected backend; the server stays
/// in degraded mode until it connects.
fn spawn_storage_supervisor(state: SharedState, backend: StorageBackend) {
    info!(?backend, "selected storage backend");
    match backend {
        StorageBackend::Memory => {
            tokio::spawn(storage_supervisor::run(state, || async {
                Ok::<_, StorageError>(Arc::new(MemoryDocumentStore::new()) as Arc<dyn DocumentStore>)
            }));
        }
        #[cfg(feature = "couch-store")]
        StorageBackend::Couch => {
            use quiz_show_back::dao::document_store::couchdb::{CouchConfig, CouchDocumentStore};

            tokio::spawn(storage_supervisor::run(state, || async {
                let config = CouchConfig::from_env();
                let store = CouchDocumentStore::connect(config).await?;
                Ok::<_, StorageError>(Arc::new(store) as Arc<dyn DocumentStore>)
            }));
        }
        #[cfg(feature = "mongo-store")]
        StorageBackend::Mongo => {
            use quiz_show_back::dao::document_store::mongodb::{MongoConfig, MongoDocumentStore};

            tokio::spawn(storage_supervisor::run(state, || async {
                let config = MongoConfig::from_env().await?;
                let store = MongoDocumentStore::connect(config).await?;
                Ok::<_, StorageError>(Arc::new(store) as Arc<dyn DocumentStore>)
            }));
        }
        #[allow(unreachable_patterns)]
        other => {
            error!(
                backend = ?other,
                "storage backend not compiled in; running in degraded mode"
            );
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

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
