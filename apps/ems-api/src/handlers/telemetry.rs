//! 遥测 handlers
//!
//! - POST /api/v1/telemetry
//! - GET /api/v1/telemetry/:entity_key
//! - GET /api/v1/telemetry/:entity_key/latest
//! - GET /api/v1/telemetry/stream（SSE）

use crate::AppState;
use crate::utils::response::{
    bad_request_error, not_found_error, record_to_dto, service_error,
};
use crate::utils::{parse_timestamp, resolve_entity_key};
use api_contract::{ApiResponse, RecordTelemetryRequest, TelemetryQuery, TelemetryQueryResponse};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use domain::{TelemetryRecord, quality};
use futures::stream;

pub async fn record_telemetry(
    State(state): State<AppState>,
    Json(req): Json<RecordTelemetryRequest>,
) -> Response {
    let entity_key = match resolve_entity_key(
        req.scope.as_deref(),
        req.entity_key.as_deref(),
        req.parts,
    ) {
        Ok(key) => key,
        Err(err) => {
            state.metrics.record_rejected();
            return bad_request_error(err.to_string());
        }
    };
    let timestamp = match parse_timestamp(Some(req.timestamp.as_str()), "timestamp") {
        Ok(Some(ts)) => ts,
        Ok(None) => {
            state.metrics.record_rejected();
            return bad_request_error("timestamp required");
        }
        Err(response) => {
            state.metrics.record_rejected();
            return response;
        }
    };
    // 校验放在服务层，便于统一计数
    let record = TelemetryRecord {
        entity_key,
        value: req.value,
        unit: req.unit,
        timestamp,
        quality: req.quality.unwrap_or(quality::GOOD),
        tags: req.tags,
    };

    let ctx = state.op_context();
    match state.telemetry.record(&ctx, record).await {
        Ok(record) => (
            StatusCode::ACCEPTED,
            Json(ApiResponse::success(record_to_dto(&record))),
        )
            .into_response(),
        Err(err) => service_error(err, "TELEMETRY.WRITE_FAILED", "failed to record telemetry"),
    }
}

pub async fn query_telemetry(
    State(state): State<AppState>,
    Path(entity_key): Path<String>,
    Query(query): Query<TelemetryQuery>,
) -> Response {
    let entity_key = match resolve_entity_key(query.scope.as_deref(), Some(entity_key.as_str()), None) {
        Ok(key) => key,
        Err(err) => return bad_request_error(err.to_string()),
    };
    let start = match parse_timestamp(query.start.as_deref(), "start") {
        Ok(value) => value,
        Err(response) => return response,
    };
    let end = match parse_timestamp(query.end.as_deref(), "end") {
        Ok(value) => value,
        Err(response) => return response,
    };

    let ctx = state.op_context();
    match state.telemetry.get_range(&ctx, &entity_key, start, end).await {
        Ok(records) => {
            let response = TelemetryQueryResponse {
                entity_key: entity_key.to_string(),
                data: records.iter().map(record_to_dto).collect(),
            };
            (StatusCode::OK, Json(ApiResponse::success(response))).into_response()
        }
        Err(err) => service_error(
            err,
            "TELEMETRY.QUERY_FAILED",
            "failed to retrieve telemetry data",
        ),
    }
}

pub async fn latest_telemetry(
    State(state): State<AppState>,
    Path(entity_key): Path<String>,
    Query(query): Query<TelemetryQuery>,
) -> Response {
    let entity_key = match resolve_entity_key(query.scope.as_deref(), Some(entity_key.as_str()), None) {
        Ok(key) => key,
        Err(err) => return bad_request_error(err.to_string()),
    };
    let ctx = state.op_context();
    match state.telemetry.get_latest(&ctx, &entity_key).await {
        Ok(Some(record)) => {
            (StatusCode::OK, Json(ApiResponse::success(record_to_dto(&record)))).into_response()
        }
        Ok(None) => not_found_error(),
        Err(err) => service_error(
            err,
            "TELEMETRY.QUERY_FAILED",
            "failed to retrieve telemetry data",
        ),
    }
}

/// 实时推送：每条记录一个 `telemetry` 事件。客户端断开即退订。
pub async fn stream_telemetry(State(state): State<AppState>) -> Response {
    let ctx = state.op_context();
    let subscription = match state.telemetry.subscribe(&ctx).await {
        Ok(subscription) => subscription,
        Err(err) => {
            return service_error(err, "TELEMETRY.STREAM_FAILED", "live stream unavailable");
        }
    };
    let events = stream::unfold(subscription, |mut subscription| async move {
        let record = subscription.recv().await?;
        let event = Event::default()
            .event("telemetry")
            .json_data(record_to_dto(&record));
        Some((event, subscription))
    });
    Sse::new(events)
        .keep_alive(KeepAlive::default())
        .into_response()
}
