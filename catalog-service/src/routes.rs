use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::handlers::{add_image, health_check, list_images, remove_image, update_isoutstock};
use crate::middleware::legacy_status_middleware;
use crate::AppState;

/// Largest accepted request body, uploads included
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: Arc<AppState>) -> Router {
    let mut catalog: Router<Arc<AppState>> = Router::new()
        .route("/posted_images", get(list_images))
        .route("/add_image", post(add_image))
        .route("/remove_image/:id", delete(remove_image));

    if state.legacy_status_codes {
        catalog = catalog.route_layer(middleware::from_fn(legacy_status_middleware));
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(catalog)
        .route("/update_isoutstock/:id", patch(update_isoutstock))
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::db::MemoryImageStore;
    use crate::storage::MockBlobStorage;

    fn app(legacy_status_codes: bool, store: Arc<MemoryImageStore>) -> Router {
        let mut storage = MockBlobStorage::new();
        storage.expect_upload().never();

        build_router(Arc::new(AppState {
            store,
            storage: Arc::new(storage),
            legacy_status_codes,
        }))
    }

    fn empty_multipart() -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/add_image")
            .header(header::CONTENT_TYPE, "multipart/form-data; boundary=X")
            .body(Body::from("--X\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\nShoe\r\n--X--\r\n"))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_legacy_mode_reports_unauthorized_on_add() {
        let response = app(true, Arc::new(MemoryImageStore::new()))
            .oneshot(empty_multipart())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["status"], false);
        assert_eq!(body["message"], "No image file attached");
    }

    #[tokio::test]
    async fn test_legacy_mode_reports_unauthorized_on_list_and_remove() {
        let store = Arc::new(MemoryImageStore::new());
        let router = app(true, store.clone());

        let response = router
            .clone()
            .oneshot(
                Request::delete(format!("/remove_image/{}", Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        store.set_available(false);
        let response = router
            .oneshot(Request::get("/posted_images").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_legacy_mode_leaves_update_codes_alone() {
        let response = app(true, Arc::new(MemoryImageStore::new()))
            .oneshot(
                Request::patch(format!("/update_isoutstock/{}", Uuid::new_v4()))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"isOutstock": "no"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_default_mode_uses_semantic_codes() {
        let response = app(false, Arc::new(MemoryImageStore::new()))
            .oneshot(empty_multipart())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health_route() {
        let response = app(false, Arc::new(MemoryImageStore::new()))
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin() {
        let response = app(false, Arc::new(MemoryImageStore::new()))
            .oneshot(
                Request::get("/posted_images")
                    .header(header::ORIGIN, "https://shop.example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let response = app(false, Arc::new(MemoryImageStore::new()))
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/add_image")
                    .header(header::CONTENT_TYPE, "multipart/form-data; boundary=X")
                    .header(header::CONTENT_LENGTH, (MAX_UPLOAD_BYTES + 1).to_string())
                    .body(Body::from(vec![0u8; MAX_UPLOAD_BYTES + 1]))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
