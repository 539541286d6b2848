//! 应用运行配置加载。

use std::env;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env: {0}")]
    Missing(String),
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// 合成回退记录配置。
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackConfig {
    pub enabled: bool,
    pub value: f64,
    pub quality: u16,
    /// 未按作用域配置单位时使用。
    pub default_unit: String,
    /// `(scope, unit)`，scope 取 `sensor` / `company_product`。
    pub units: Vec<(String, String)>,
}

/// 应用运行配置。
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_addr: String,
    pub database_url: String,
    pub db_max_connections: u32,
    /// `unified` / `sensor` / `company_product`。
    pub telemetry_layout: String,
    /// 未配置时使用进程内缓存。
    pub redis_url: Option<String>,
    pub latest_ttl_seconds: u64,
    pub asset_ttl_seconds: u64,
    pub pubsub_channel: String,
    pub op_timeout_ms: u64,
    pub default_window_seconds: u64,
    pub latest_lookback_seconds: u64,
    pub fallback: FallbackConfig,
    pub admin_export_password: Option<String>,
}

impl AppConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = env::var("EMS_DATABASE_URL")
            .map_err(|_| ConfigError::Missing("EMS_DATABASE_URL".to_string()))?;
        let http_addr = env::var("EMS_HTTP_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let db_max_connections = read_u32_with_default("EMS_DB_MAX_CONNECTIONS", 8)?;
        let telemetry_layout =
            read_optional("EMS_TELEMETRY_LAYOUT").unwrap_or_else(|| "unified".to_string());
        let redis_url = read_optional("EMS_REDIS_URL");
        let latest_ttl_seconds = read_u64_with_default("EMS_LATEST_TTL_SECONDS", 300)?;
        let asset_ttl_seconds = read_u64_with_default("EMS_ASSET_TTL_SECONDS", 3600)?;
        let pubsub_channel =
            read_optional("EMS_PUBSUB_CHANNEL").unwrap_or_else(|| "telemetry:live".to_string());
        let op_timeout_ms = read_u64_with_default("EMS_OP_TIMEOUT_MS", 5000)?;
        let default_window_seconds = read_u64_with_default("EMS_DEFAULT_WINDOW_SECONDS", 3600)?;
        let latest_lookback_seconds =
            read_u64_with_default("EMS_LATEST_LOOKBACK_SECONDS", 86_400)?;
        let fallback = FallbackConfig {
            enabled: read_bool_with_default("EMS_FALLBACK_ENABLED", true),
            value: read_f64_with_default("EMS_FALLBACK_VALUE", 125.5)?,
            quality: read_u16_with_default("EMS_FALLBACK_QUALITY", 1)?,
            default_unit: read_optional("EMS_FALLBACK_UNIT").unwrap_or_else(|| "т/час".to_string()),
            units: match read_optional("EMS_FALLBACK_UNITS") {
                Some(raw) => parse_unit_map("EMS_FALLBACK_UNITS", &raw)?,
                None => vec![
                    ("sensor".to_string(), "тонны".to_string()),
                    ("company_product".to_string(), "т/час".to_string()),
                ],
            },
        };
        let admin_export_password = read_optional("EMS_ADMIN_EXPORT_PASSWORD");

        Ok(Self {
            http_addr,
            database_url,
            db_max_connections,
            telemetry_layout,
            redis_url,
            latest_ttl_seconds,
            asset_ttl_seconds,
            pubsub_channel,
            op_timeout_ms,
            default_window_seconds,
            latest_lookback_seconds,
            fallback,
            admin_export_password,
        })
    }
}

/// 解析 `scope=unit,scope=unit`。
pub fn parse_unit_map(key: &str, raw: &str) -> Result<Vec<(String, String)>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| match item.split_once('=') {
            Some((scope, unit)) if !scope.trim().is_empty() && !unit.trim().is_empty() => {
                Ok((scope.trim().to_string(), unit.trim().to_string()))
            }
            _ => Err(ConfigError::Invalid(key.to_string(), item.to_string())),
        })
        .collect()
}

fn read_u16_with_default(key: &str, default: u16) -> Result<u16, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u16>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_u32_with_default(key: &str, default: u32) -> Result<u32, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u32>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_u64_with_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_f64_with_default(key: &str, default: f64) -> Result<f64, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    match value.parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => Ok(parsed),
        _ => Err(ConfigError::Invalid(key.to_string(), value)),
    }
}

fn read_optional(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}

fn read_bool_with_default(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "on"),
        Err(_) => default,
    }
}
