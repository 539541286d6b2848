//! 服务层错误类型。

use domain::ValidationError;
use ems_storage::{CacheError, RegistryError, StoreError};

/// 服务层错误。缓存写入失败不会出现在这里（只记录告警）。
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// 仅在订阅时出现：实时通道完全依赖缓存后端。
    #[error(transparent)]
    Subscription(#[from] CacheError),
}

impl ServiceError {
    pub fn is_validation(&self) -> bool {
        matches!(self, ServiceError::Validation(_))
    }
}
