//! 输入验证辅助函数
//!
//! - normalize_required：必填字段去除空格并检查非空
//! - parse_timestamp：RFC 3339 时间解析
//! - resolve_entity_key：由路径/请求体中的键与可选 scope 构造 EntityKey
//!
//! 失败返回 bad_request_error 响应。

use crate::utils::response::bad_request_error;
use axum::response::Response;
use chrono::{DateTime, Utc};
use domain::{EntityKey, EntityScope, ValidationError};

/// 验证必填字段，去除空格并检查非空
pub fn normalize_required(value: String, field: &str) -> Result<String, Response> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(bad_request_error(format!("{field} required")));
    }
    Ok(trimmed.to_string())
}

/// 解析 RFC 3339 时间；空字符串视为未提供。
pub fn parse_timestamp(
    value: Option<&str>,
    field: &str,
) -> Result<Option<DateTime<Utc>>, Response> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|ts| Some(ts.with_timezone(&Utc)))
            .map_err(|_| bad_request_error(format!("invalid {field} time format"))),
    }
}

/// 构造实体键。
///
/// - 给出 `parts`：按 `scope`（缺省为传感器）逐段构造
/// - 给出 `scope`：`key` 为 `/` 连接的 parts
/// - 否则按 `<scope>:<parts>` 或裸传感器 ID 解析
pub fn resolve_entity_key(
    scope: Option<&str>,
    key: Option<&str>,
    parts: Option<Vec<String>>,
) -> Result<EntityKey, ValidationError> {
    let scope = scope
        .map(str::trim)
        .filter(|scope| !scope.is_empty())
        .map(str::parse::<EntityScope>)
        .transpose()?;
    match (scope, parts, key) {
        (scope, Some(parts), _) => EntityKey::new(scope.unwrap_or(EntityScope::Sensor), parts),
        (Some(scope), None, Some(key)) => EntityKey::from_encoded(scope, key),
        (None, None, Some(key)) => EntityKey::parse(key),
        (_, None, None) => Err(ValidationError::EmptyEntityKey),
    }
}
