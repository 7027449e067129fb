use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::AppState;

pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    let (status, label) = if state.store.is_healthy().await {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status,
        Json(json!({
            "status": label,
            "service": "catalog-service",
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryImageStore;
    use crate::storage::MockBlobStorage;

    fn state(store: Arc<MemoryImageStore>) -> State<Arc<AppState>> {
        State(Arc::new(AppState {
            store,
            storage: Arc::new(MockBlobStorage::new()),
            legacy_status_codes: false,
        }))
    }

    #[tokio::test]
    async fn test_healthy_store() {
        let (status, Json(body)) = health_check(state(Arc::new(MemoryImageStore::new()))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "catalog-service");
    }

    #[tokio::test]
    async fn test_unreachable_store_is_degraded() {
        let store = Arc::new(MemoryImageStore::new());
        store.set_available(false);

        let (status, Json(body)) = health_check(state(store)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "degraded");
    }
}
