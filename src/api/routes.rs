//! API Routes
//!
//! Configures the Axum router with all key-value server endpoints.

use axum::{
    middleware::from_fn_with_state,
    routing::{get, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    delete_handler, get_handler, health_handler, put_handler, stats_handler, AppState,
};
use crate::middleware::throttle_requests;

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /v1/:key` - Store the request body under a key (201)
/// - `GET /v1/:key` - Retrieve a value (200, 404 if absent)
/// - `DELETE /v1/:key` - Delete a key (200)
/// - `GET /stats` - Cache statistics and last log sequence
/// - `GET /health` - Health check, reports log failures
///
/// # Middleware
/// - Throttle: token bucket per `UID` cookie on `/v1` routes, when configured
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut kv_routes = Router::new().route(
        "/v1/:key",
        put(put_handler).get(get_handler).delete(delete_handler),
    );
    if let Some(limiter) = state.throttle.clone() {
        kv_routes = kv_routes.route_layer(from_fn_with_state(limiter, throttle_requests));
    }

    Router::new()
        .merge(kv_routes)
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::util::ServiceExt;

    fn create_test_app(dir: &tempfile::TempDir) -> Router {
        let config = Config {
            log_path: dir.path().join("transaction.log"),
            ..Config::default()
        };
        create_router(AppState::from_config(&config).unwrap())
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_test_app(&dir);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_put_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_test_app(&dir);

        let response = app
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/v1/test")
                    .body(Body::from("hello"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_get_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_test_app(&dir);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/v1/nonexistent")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
