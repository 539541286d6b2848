//! 存储相关的数据结构

use domain::{AssetMetadata, TelemetryRecord};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// 订阅者队列默认容量；队列满时丢弃新消息（发布是尽力而为的）。
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 256;

/// 缓存值。
#[derive(Debug, Clone)]
pub enum CachedValue {
    Latest(TelemetryRecord),
    Asset(AssetMetadata),
}

/// 带显式过期时间的缓存条目。`expires_at` 为 `None` 表示 TTL 超出时钟范围，永不过期。
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: CachedValue,
    pub expires_at: Option<Instant>,
}

impl CacheEntry {
    pub fn new(value: CachedValue, now: Instant, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: now.checked_add(ttl),
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(expires_at) if now >= expires_at)
    }
}

/// 实时订阅句柄。丢弃即退订。
#[derive(Debug)]
pub struct TelemetrySubscription {
    receiver: mpsc::Receiver<TelemetryRecord>,
}

impl TelemetrySubscription {
    pub fn new(receiver: mpsc::Receiver<TelemetryRecord>) -> Self {
        Self { receiver }
    }

    /// 等待下一条记录；发布端关闭后返回 `None`。
    pub async fn recv(&mut self) -> Option<TelemetryRecord> {
        self.receiver.recv().await
    }

    /// 非阻塞读取（测试用）。
    pub fn try_recv(&mut self) -> Option<TelemetryRecord> {
        self.receiver.try_recv().ok()
    }
}
