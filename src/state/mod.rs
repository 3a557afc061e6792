pub mod challenge;
pub mod console;
pub mod countdown;
pub mod grid;
pub mod options;
pub mod presentation;
pub mod question;
pub mod shuffle;
mod sse;
pub mod state_machine;
pub mod transitions;

use std::{sync::Arc, time::Duration};

use tokio::sync::{Mutex, RwLock, watch};

use crate::{
    config::AppConfig,
    dao::{
        document_store::DocumentStore,
        question_source::QuestionSource,
        repository::{DocumentRepository, SnapshotCache},
    },
    state::console::Console,
};

pub use self::sse::{DISPLAY_CHANNEL_CAPACITY, SseHub};
pub use self::state_machine::{AbortError, ApplyError, Plan, PlanError, PlanId, Snapshot};

pub type SharedState = Arc<AppState>;
pub const DEFAULT_TRANSITION_TIMEOUT: Duration = Duration::from_secs(5);

/// Central application state: storage handle, display stream and the operator console.
pub struct AppState {
    config: AppConfig,
    document_store: RwLock<Option<Arc<dyn DocumentStore>>>,
    snapshots: SnapshotCache,
    question_source: Arc<dyn QuestionSource>,
    display: SseHub,
    console: Mutex<Console>,
    degraded: watch::Sender<bool>,
    transition_timeout: Option<Duration>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig, question_source: Arc<dyn QuestionSource>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            config,
            document_store: RwLock::new(None),
            snapshots: SnapshotCache::default(),
            question_source,
            display: SseHub::new(DISPLAY_CHANNEL_CAPACITY),
            console: Mutex::new(Console::new()),
            degraded: degraded_tx,
            transition_timeout: Some(DEFAULT_TRANSITION_TIMEOUT),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current document store, if one is installed.
    pub async fn document_store(&self) -> Option<Arc<dyn DocumentStore>> {
        let guard = self.document_store.read().await;
        guard.as_ref().cloned()
    }

    /// Repository bound to the currently installed store.
    pub async fn documents(&self) -> DocumentRepository {
        DocumentRepository::new(self.document_store().await, self.snapshots.clone())
    }

    /// Install a new document store implementation and leave degraded mode.
    pub async fn set_document_store(&self, store: Arc<dyn DocumentStore>) {
        {
            let mut guard = self.document_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current document store and enter degraded mode.
    pub async fn clear_document_store(&self) {
        {
            let mut guard = self.document_store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update the degraded flag; returns whether it changed.
    pub fn update_degraded(&self, value: bool) -> bool {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        })
    }

    pub fn question_source(&self) -> Arc<dyn QuestionSource> {
        self.question_source.clone()
    }

    /// Broadcast hub feeding the presentation display.
    pub fn display_sse(&self) -> &SseHub {
        &self.display
    }

    /// Operator console; every command and timer callback runs under this lock.
    pub fn console(&self) -> &Mutex<Console> {
        &self.console
    }

    pub fn transition_timeout(&self) -> Option<Duration> {
        self.transition_timeout
    }
}
