//! HTTP 响应辅助函数和 DTO 转换
//!
//! - 错误响应：bad_request_error, not_found_error, internal_error, service_error
//! - DTO 转换：record_to_dto, asset_to_dto
//!
//! 所有错误返回统一的 ApiResponse 格式；5xx 只返回通用描述，不透出后端细节。

use api_contract::{ApiResponse, AssetDto, TelemetryRecordDto};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use domain::{AssetMetadata, TelemetryRecord};
use ems_pipeline::ServiceError;

/// 错误请求响应
pub fn bad_request_error(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::<()>::error("INVALID.REQUEST", message.into())),
    )
        .into_response()
}

/// 资源未找到错误响应
pub fn not_found_error() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::error("RESOURCE.NOT_FOUND", "not found")),
    )
        .into_response()
}

/// 内部错误响应（通用描述）
pub fn internal_error(code: &str, message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::<()>::error(code, message)),
    )
        .into_response()
}

/// 服务错误响应：校验错误 400，其余 500 + 通用描述。
///
/// 后端错误已由服务层带上下文记录，这里不再重复。
pub fn service_error(err: ServiceError, code: &str, message: &str) -> Response {
    match err {
        ServiceError::Validation(err) => bad_request_error(err.to_string()),
        _ => internal_error(code, message),
    }
}

/// TelemetryRecord 转 TelemetryRecordDto
pub fn record_to_dto(record: &TelemetryRecord) -> TelemetryRecordDto {
    TelemetryRecordDto {
        entity_key: record.entity_key.to_string(),
        scope: record.entity_key.scope().as_str().to_string(),
        value: record.value,
        unit: record.unit.clone(),
        timestamp: record.timestamp.to_rfc3339(),
        quality: record.quality,
        tags: record.tags.clone(),
    }
}

/// AssetMetadata 转 AssetDto
pub fn asset_to_dto(asset: AssetMetadata) -> AssetDto {
    AssetDto {
        id: asset.id,
        name: asset.name,
        asset_type: asset.asset_type,
        location: asset.location,
        status: asset.status,
        specifications: asset.specifications,
        entity_keys: asset.entity_keys.iter().map(ToString::to_string).collect(),
        created_at: asset.created_at.to_rfc3339(),
        updated_at: asset.updated_at.to_rfc3339(),
    }
}
