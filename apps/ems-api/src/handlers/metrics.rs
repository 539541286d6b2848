//! 遥测服务指标快照。
//!
//! - GET /api/v1/metrics

use crate::AppState;
use api_contract::{ApiResponse, MetricsSnapshotDto};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

pub async fn get_metrics(State(state): State<AppState>) -> Response {
    let snapshot = state.metrics.snapshot();
    (
        StatusCode::OK,
        Json(ApiResponse::success(MetricsSnapshotDto {
            records_accepted: snapshot.records_accepted,
            records_rejected: snapshot.records_rejected,
            store_failures: snapshot.store_failures,
            cache_write_failures: snapshot.cache_write_failures,
            publish_failures: snapshot.publish_failures,
            range_queries: snapshot.range_queries,
            synthetic_fallbacks: snapshot.synthetic_fallbacks,
            latest_cache_hits: snapshot.latest_cache_hits,
            latest_cache_misses: snapshot.latest_cache_misses,
            write_latency_ms_total: snapshot.write_latency_ms_total,
            write_latency_ms_count: snapshot.write_latency_ms_count,
        })),
    )
        .into_response()
}
