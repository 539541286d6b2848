//! 路由定义
//!
//! 集中管理所有 API 路由，将路径映射到对应的 handlers：
//! - 健康检查：/health
//! - 遥测：/api/v1/telemetry/*
//! - 资产：/api/v1/assets/*
//! - 导出口令校验：/api/v1/auth/verify-export-password
//! - 指标：/api/v1/metrics
//!
//! 公司+产品键在路径中写作 `company_product:<company>%2F<product>`。

use super::AppState;
use super::handlers::*;
use crate::middleware::request_context;
use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

/// `/api/v1` 下的业务路由
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/telemetry", post(record_telemetry))
        .route("/telemetry/stream", get(stream_telemetry))
        .route("/telemetry/:entity_key", get(query_telemetry))
        .route("/telemetry/:entity_key/latest", get(latest_telemetry))
        .route("/assets", get(list_assets).post(create_asset))
        .route("/assets/initialize", post(initialize_assets))
        .route("/assets/:asset_id", get(get_asset))
        .route("/auth/verify-export-password", post(verify_export_password))
        .route("/metrics", get(get_metrics))
}

/// 完整应用路由（含请求追踪中间件）
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", create_api_router())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // 注入 request_id/trace_id
        .layer(middleware::from_fn(request_context))
}

#[cfg(test)]
mod tests {
    use super::create_router;
    use crate::AppState;
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
    };
    use bytes::Bytes;
    use domain::AssetRuleTable;
    use ems_pipeline::{AssetService, ServiceConfig, TelemetryService};
    use ems_storage::{InMemoryAssetRegistry, InMemoryCacheStore, InMemoryTelemetryStore};
    use ems_telemetry::TelemetryMetrics;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        store: Arc<InMemoryTelemetryStore>,
    }

    fn test_app(export_password: Option<&str>) -> TestApp {
        let store = Arc::new(InMemoryTelemetryStore::new());
        let cache = Arc::new(InMemoryCacheStore::new());
        let registry = Arc::new(InMemoryAssetRegistry::new());
        let metrics = Arc::new(TelemetryMetrics::new());
        let telemetry = TelemetryService::new(
            store.clone(),
            cache.clone(),
            metrics.clone(),
            ServiceConfig::default(),
        );
        let assets = AssetService::new(
            registry,
            cache,
            AssetRuleTable::default(),
            Duration::from_secs(3600),
        );
        let state = AppState {
            telemetry,
            assets,
            metrics,
            op_timeout: Duration::from_secs(5),
            export_password: export_password.map(Arc::from),
        };
        TestApp {
            router: create_router(state),
            store,
        }
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        assert!(response.headers().contains_key("x-request-id"));
        let body: Bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).expect("json")
        };
        (status, value)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request")
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    #[tokio::test]
    async fn health_is_ok() {
        let app = test_app(None);
        let (status, body) = send(&app.router, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn recorded_telemetry_is_queryable() {
        let app = test_app(None);
        let (status, body) = send(
            &app.router,
            post_json(
                "/api/v1/telemetry",
                json!({
                    "entityKey": "sensor-42",
                    "value": 25.5,
                    "unit": "т/час",
                    "timestamp": "2025-03-01T12:00:00Z",
                    "quality": 1
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["data"]["entityKey"], "sensor:sensor-42");

        let (status, body) = send(
            &app.router,
            get("/api/v1/telemetry/sensor-42?start=2025-03-01T11:00:00Z&end=2025-03-01T13:00:00Z"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["entityKey"], "sensor:sensor-42");
        let data = body["data"]["data"].as_array().expect("array");
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["value"], 25.5);
        assert_eq!(data[0]["unit"], "т/час");
        assert_eq!(data[0]["quality"], 1);
        assert_eq!(data[0]["timestamp"], "2025-03-01T12:00:00+00:00");
    }

    #[tokio::test]
    async fn company_product_keys_are_addressable() {
        let app = test_app(None);
        let (status, _) = send(
            &app.router,
            post_json(
                "/api/v1/telemetry",
                json!({
                    "scope": "company_product",
                    "parts": ["c-1", "mtbe"],
                    "value": 4.0,
                    "unit": "т/час",
                    "timestamp": "2025-03-01T12:00:00Z"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);

        let (status, body) = send(
            &app.router,
            get("/api/v1/telemetry/company_product:c-1%2Fmtbe?start=2025-03-01T00:00:00Z&end=2025-03-02T00:00:00Z"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["entityKey"], "company_product:c-1/mtbe");
        assert_eq!(body["data"]["data"][0]["value"], 4.0);

        let (status, body) = send(
            &app.router,
            get("/api/v1/telemetry/c-1%2Fmtbe/latest?scope=company_product"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["scope"], "company_product");
    }

    #[tokio::test]
    async fn empty_range_returns_synthetic_record() {
        let app = test_app(None);
        let (status, body) = send(&app.router, get("/api/v1/telemetry/unknown-entity")).await;
        assert_eq!(status, StatusCode::OK);
        let data = body["data"]["data"].as_array().expect("array");
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["quality"], 1);
        assert_eq!(data[0]["tags"][0], "synthetic");
        assert!(app.store.is_empty());
    }

    #[tokio::test]
    async fn malformed_input_is_a_client_error() {
        let app = test_app(None);
        let (status, body) = send(
            &app.router,
            get("/api/v1/telemetry/sensor-42?start=yesterday"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID.REQUEST");

        let (status, _) = send(
            &app.router,
            get("/api/v1/telemetry/sensor-42?start=2025-03-02T00:00:00Z&end=2025-03-01T00:00:00Z"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app.router,
            post_json(
                "/api/v1/telemetry",
                json!({ "entityKey": " ", "value": 1.0, "unit": "т", "timestamp": "2025-03-01T12:00:00Z" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, metrics) = send(&app.router, get("/api/v1/metrics")).await;
        assert_eq!(metrics["data"]["recordsRejected"], 1);
    }

    #[tokio::test]
    async fn store_failure_is_generic_server_error() {
        let app = test_app(None);
        app.store.set_available(false);
        let (status, body) = send(&app.router, get("/api/v1/telemetry/sensor-42")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["message"], "failed to retrieve telemetry data");
        assert!(!body.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn latest_is_not_found_until_recorded() {
        let app = test_app(None);
        let (status, _) = send(&app.router, get("/api/v1/telemetry/sensor-7/latest")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let now = chrono::Utc::now().to_rfc3339();
        let (status, _) = send(
            &app.router,
            post_json(
                "/api/v1/telemetry",
                json!({ "entityKey": "sensor-7", "value": 9.5, "unit": "тонны", "timestamp": now }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);

        let (status, body) = send(&app.router, get("/api/v1/telemetry/sensor-7/latest")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["value"], 9.5);
    }

    #[tokio::test]
    async fn assets_round_trip() {
        let app = test_app(None);
        let (status, body) = send(
            &app.router,
            post_json(
                "/api/v1/assets",
                json!({
                    "id": "tank-1",
                    "name": "Резервуар 1",
                    "type": "storage",
                    "location": "Казань",
                    "entityKeys": ["sensor-1", "company_product:c-1/mtbe"]
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["status"], "active");

        let (status, body) = send(&app.router, get("/api/v1/assets/tank-1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["type"], "storage");
        assert_eq!(body["data"]["entityKeys"][1], "company_product:c-1/mtbe");

        let (status, body) = send(&app.router, get("/api/v1/assets")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

        let (status, _) = send(&app.router, get("/api/v1/assets/ghost")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn assets_initialize_from_sensors() {
        let app = test_app(None);
        let (status, body) = send(
            &app.router,
            post_json(
                "/api/v1/assets/initialize",
                json!({ "sensors": [
                    { "id": "s-1", "description": "Ставролен Реактор 1" },
                    { "id": "s-2", "description": "без компании" }
                ]}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["created"][0], "Ставролен_Ставропольский край");
        assert_eq!(body["data"]["unclassified"][0], "s-2");
    }

    #[tokio::test]
    async fn export_password_verification() {
        let app = test_app(Some("s3cret"));
        let (status, body) = send(
            &app.router,
            post_json("/api/v1/auth/verify-export-password", json!({ "password": "s3cret" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["verified"], true);

        let (status, _) = send(
            &app.router,
            post_json("/api/v1/auth/verify-export-password", json!({ "password": "guess" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(
            &app.router,
            post_json("/api/v1/auth/verify-export-password", json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let unconfigured = test_app(None);
        let (status, body) = send(
            &unconfigured.router,
            post_json("/api/v1/auth/verify-export-password", json!({ "password": "s3cret" })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["message"], "server configuration error");
    }
}
