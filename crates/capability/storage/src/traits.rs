//! 存储接口 Trait 定义
//!
//! - TelemetryStore：追加写入的时序存储
//! - CacheStore：latest 值缓存、资产快照缓存、实时发布订阅
//! - AssetRegistry：资产登记表
//!
//! 设计原则：
//! - 所有接口显式接收 OpContext（取消 + 截止时间）
//! - 句柄在构造时注入（`Arc<dyn ...>`），测试可替换为内存实现
//! - 使用 async_trait 支持动态分发

use crate::context::OpContext;
use crate::error::{CacheError, RegistryError, StoreError};
use crate::models::TelemetrySubscription;
use async_trait::async_trait;
use domain::{AssetMetadata, EntityKey, TelemetryRecord, TimeWindow};
use std::time::Duration;

/// 单次区间查询返回的最大行数。更多数据需由调用方缩小时间窗口分页获取。
pub const MAX_RANGE_ROWS: usize = 1000;

/// 时序存储接口
#[async_trait]
pub trait TelemetryStore: Send + Sync {
    /// 原子地追加一条记录；不做去重。
    async fn append(&self, ctx: &OpContext, record: &TelemetryRecord) -> Result<(), StoreError>;

    /// 返回 `window` 内（闭区间）的记录，按时间倒序，最多 [`MAX_RANGE_ROWS`] 条。
    async fn query_range(
        &self,
        ctx: &OpContext,
        entity_key: &EntityKey,
        window: TimeWindow,
    ) -> Result<Vec<TelemetryRecord>, StoreError>;
}

/// 缓存层接口
///
/// 缓存只是优化与通知通道：任何条目随时可能缺失，读未命中返回 `Ok(None)`，
/// 仅当后端不可达时返回错误。
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// 覆盖写入实体的 latest 值（后写者胜）。
    async fn set_latest(
        &self,
        ctx: &OpContext,
        entity_key: &EntityKey,
        record: &TelemetryRecord,
        ttl: Duration,
    ) -> Result<(), CacheError>;

    /// 仅在没有未过期 latest 值时写入，返回是否写入。
    ///
    /// 用于从存储回填：回填读到的行可能已被并发写入的新值取代，不能覆盖。
    async fn fill_latest(
        &self,
        ctx: &OpContext,
        entity_key: &EntityKey,
        record: &TelemetryRecord,
        ttl: Duration,
    ) -> Result<bool, CacheError>;

    async fn get_latest(
        &self,
        ctx: &OpContext,
        entity_key: &EntityKey,
    ) -> Result<Option<TelemetryRecord>, CacheError>;

    async fn set_asset_snapshot(
        &self,
        ctx: &OpContext,
        asset_id: &str,
        asset: &AssetMetadata,
        ttl: Duration,
    ) -> Result<(), CacheError>;

    async fn get_asset_snapshot(
        &self,
        ctx: &OpContext,
        asset_id: &str,
    ) -> Result<Option<AssetMetadata>, CacheError>;

    /// 尽力而为的广播；没有订阅者不是错误，消息不持久化。
    async fn publish(
        &self,
        ctx: &OpContext,
        channel: &str,
        record: &TelemetryRecord,
    ) -> Result<(), CacheError>;

    /// 订阅频道；只能收到订阅之后发布的消息。
    async fn subscribe(
        &self,
        ctx: &OpContext,
        channel: &str,
    ) -> Result<TelemetrySubscription, CacheError>;
}

/// 资产登记表接口
#[async_trait]
pub trait AssetRegistry: Send + Sync {
    /// 按 ID 新建或更新；更新时保留原 `created_at`。
    async fn upsert_asset(&self, ctx: &OpContext, asset: &AssetMetadata)
    -> Result<(), RegistryError>;

    async fn find_asset(
        &self,
        ctx: &OpContext,
        asset_id: &str,
    ) -> Result<Option<AssetMetadata>, RegistryError>;

    /// 按 `created_at` 倒序列出。
    async fn list_assets(&self, ctx: &OpContext) -> Result<Vec<AssetMetadata>, RegistryError>;
}
