//! 存储层错误类型
//!
//! - `StoreError`：时序存储（持久化关键路径）错误，对当前操作是致命的
//! - `CacheError`：缓存/发布订阅错误，调用方记录告警后按未命中处理
//! - `RegistryError`：资产登记表错误
//!
//! "未找到" 不是错误：查询返回空集合或 `None`。

use crate::context::CancelReason;
use domain::{EntityKey, TimeWindow};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{op} {reason} for {entity_key}")]
    Cancelled {
        op: &'static str,
        entity_key: String,
        reason: CancelReason,
    },
    #[error("{op} failed for {entity_key} {window}: {message}")]
    Backend {
        op: &'static str,
        entity_key: String,
        window: String,
        message: String,
    },
    #[error("entity key {entity_key} is not stored by the {layout} layout")]
    UnsupportedKey {
        entity_key: String,
        layout: &'static str,
    },
}

impl StoreError {
    pub fn cancelled(op: &'static str, key: &EntityKey, reason: CancelReason) -> Self {
        Self::Cancelled {
            op,
            entity_key: key.to_string(),
            reason,
        }
    }

    pub fn backend(
        op: &'static str,
        key: &EntityKey,
        window: Option<&TimeWindow>,
        message: impl ToString,
    ) -> Self {
        Self::Backend {
            op,
            entity_key: key.to_string(),
            window: window.map(|w| w.to_string()).unwrap_or_else(|| "-".to_string()),
            message: message.to_string(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, StoreError::Cancelled { .. })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),
    #[error("cache {op} {reason} for {key}")]
    Cancelled {
        op: &'static str,
        key: String,
        reason: CancelReason,
    },
    #[error("cache payload error for {key}: {message}")]
    Codec { key: String, message: String },
}

impl CacheError {
    pub fn cancelled(op: &'static str, key: impl Into<String>, reason: CancelReason) -> Self {
        Self::Cancelled {
            op,
            key: key.into(),
            reason,
        }
    }

    pub fn codec(key: impl Into<String>, err: impl ToString) -> Self {
        Self::Codec {
            key: key.into(),
            message: err.to_string(),
        }
    }
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        Self::Unavailable(err.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("registry {op} {reason}")]
    Cancelled {
        op: &'static str,
        reason: CancelReason,
    },
    #[error("registry {op} failed: {message}")]
    Backend { op: &'static str, message: String },
}

impl RegistryError {
    pub fn backend(op: &'static str, err: impl ToString) -> Self {
        Self::Backend {
            op,
            message: err.to_string(),
        }
    }
}
