use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report the degraded flag and connected displays, logging store connectivity issues.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.document_store().await {
        Some(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "storage health check failed");
            }
        }
        None => warn!("storage unavailable (degraded mode)"),
    }

    let displays = state.display_sse().subscriber_count();
    if state.is_degraded() {
        HealthResponse::degraded(displays)
    } else {
        HealthResponse::ok(displays)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{document_store::MemoryDocumentStore, question_source::InlineQuestionSource},
        state::AppState,
    };

    #[tokio::test]
    async fn reports_degraded_until_store_installed() {
        let state = AppState::new(
            AppConfig::default(),
            Arc::new(InlineQuestionSource::new("", 58)),
        );
        assert_eq!(health_status(&state).await.status, "degraded");

        state
            .set_document_store(Arc::new(MemoryDocumentStore::new()))
            .await;
        let _display = state.display_sse().subscribe();
        let status = health_status(&state).await;
        assert_eq!(status.status, "ok");
        assert_eq!(status.display_subscribers, 1);
    }
}
