//! 稳定的 DTO 与 API 响应契约。
//!
//! 时间字段统一使用 RFC 3339 字符串，解析由 HTTP 层负责（格式错误返回 400）。

use serde::{Deserialize, Serialize};

/// 标准 API 响应封装。
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

/// 失败响应的错误体。
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
            }),
        }
    }
}

/// 写入遥测请求体。
///
/// 实体键三种写法：
/// - 只给 `entityKey`：`sensor-42` 或 `company_product:c-1/Полиэтилен`
/// - `scope` + `entityKey`：`entityKey` 为 `/` 连接的 parts
/// - `scope` + `parts`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordTelemetryRequest {
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default, alias = "entity_key", alias = "sensorId")]
    pub entity_key: Option<String>,
    #[serde(default)]
    pub parts: Option<Vec<String>>,
    pub value: f64,
    pub unit: String,
    pub timestamp: String,
    #[serde(default)]
    pub quality: Option<u16>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// 遥测记录。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryRecordDto {
    pub entity_key: String,
    pub scope: String,
    pub value: f64,
    pub unit: String,
    pub timestamp: String,
    pub quality: u16,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// 区间查询参数。
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryQuery {
    pub scope: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

/// 区间查询响应体（按时间倒序）。
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryQueryResponse {
    pub entity_key: String,
    pub data: Vec<TelemetryRecordDto>,
}

/// 资产。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetDto {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub asset_type: String,
    pub location: String,
    pub status: String,
    pub specifications: serde_json::Map<String, serde_json::Value>,
    pub entity_keys: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// 资产创建请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssetRequest {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub asset_type: String,
    pub location: String,
    pub status: Option<String>,
    #[serde(default)]
    pub specifications: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub entity_keys: Vec<String>,
}

/// 传感器描述。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorDescriptorDto {
    pub id: String,
    pub description: String,
}

/// 由传感器描述初始化资产。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeAssetsRequest {
    pub sensors: Vec<SensorDescriptorDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeAssetsResponse {
    pub created: Vec<String>,
    pub failed: Vec<String>,
    pub unclassified: Vec<String>,
}

/// 导出口令校验请求体。
#[derive(Debug, Deserialize)]
pub struct VerifyPasswordRequest {
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyPasswordResponse {
    pub verified: bool,
}

/// 指标快照响应体。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshotDto {
    pub records_accepted: u64,
    pub records_rejected: u64,
    pub store_failures: u64,
    pub cache_write_failures: u64,
    pub publish_failures: u64,
    pub range_queries: u64,
    pub synthetic_fallbacks: u64,
    pub latest_cache_hits: u64,
    pub latest_cache_misses: u64,
    pub write_latency_ms_total: u64,
    pub write_latency_ms_count: u64,
}
