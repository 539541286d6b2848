//! 资产 handlers
//!
//! - GET /api/v1/assets
//! - GET /api/v1/assets/:asset_id
//! - POST /api/v1/assets
//! - POST /api/v1/assets/initialize

use crate::AppState;
use crate::utils::normalize_required;
use crate::utils::response::{asset_to_dto, bad_request_error, not_found_error, service_error};
use api_contract::{
    ApiResponse, AssetDto, CreateAssetRequest, InitializeAssetsRequest, InitializeAssetsResponse,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use domain::{AssetMetadata, EntityKey, SensorDescriptor};

pub async fn list_assets(State(state): State<AppState>) -> Response {
    let ctx = state.op_context();
    match state.assets.list_assets(&ctx).await {
        Ok(items) => {
            let data: Vec<AssetDto> = items.into_iter().map(asset_to_dto).collect();
            (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
        }
        Err(err) => service_error(err, "ASSET.QUERY_FAILED", "failed to retrieve assets"),
    }
}

pub async fn get_asset(State(state): State<AppState>, Path(asset_id): Path<String>) -> Response {
    let ctx = state.op_context();
    match state.assets.get_asset(&ctx, &asset_id).await {
        Ok(Some(asset)) => {
            (StatusCode::OK, Json(ApiResponse::success(asset_to_dto(asset)))).into_response()
        }
        Ok(None) => not_found_error(),
        Err(err) => service_error(err, "ASSET.QUERY_FAILED", "failed to retrieve asset"),
    }
}

pub async fn create_asset(
    State(state): State<AppState>,
    Json(req): Json<CreateAssetRequest>,
) -> Response {
    let id = match normalize_required(req.id, "id") {
        Ok(value) => value,
        Err(response) => return response,
    };
    let name = match normalize_required(req.name, "name") {
        Ok(value) => value,
        Err(response) => return response,
    };
    let asset_type = match normalize_required(req.asset_type, "type") {
        Ok(value) => value,
        Err(response) => return response,
    };
    let entity_keys = match req
        .entity_keys
        .iter()
        .map(|key| EntityKey::parse(key))
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(keys) => keys,
        Err(err) => return bad_request_error(err.to_string()),
    };
    let now = Utc::now();
    let asset = AssetMetadata {
        id,
        name,
        asset_type,
        location: req.location.trim().to_string(),
        status: req
            .status
            .map(|status| status.trim().to_string())
            .filter(|status| !status.is_empty())
            .unwrap_or_else(|| "active".to_string()),
        specifications: req.specifications,
        entity_keys,
        created_at: now,
        updated_at: now,
    };

    let ctx = state.op_context();
    match state.assets.create_asset(&ctx, asset).await {
        Ok(asset) => {
            (StatusCode::CREATED, Json(ApiResponse::success(asset_to_dto(asset)))).into_response()
        }
        Err(err) => service_error(err, "ASSET.WRITE_FAILED", "failed to create asset"),
    }
}

/// 由传感器描述推断并写入资产（尽力而为，逐个资产报告结果）。
pub async fn initialize_assets(
    State(state): State<AppState>,
    Json(req): Json<InitializeAssetsRequest>,
) -> Response {
    let sensors: Vec<SensorDescriptor> = req
        .sensors
        .into_iter()
        .map(|sensor| SensorDescriptor {
            id: sensor.id,
            description: sensor.description,
        })
        .collect();
    let ctx = state.op_context();
    let report = state.assets.initialize_from_sensors(&ctx, &sensors).await;
    let response = InitializeAssetsResponse {
        created: report.created,
        failed: report.failed,
        unclassified: report.unclassified,
    };
    (StatusCode::OK, Json(ApiResponse::success(response))).into_response()
}
