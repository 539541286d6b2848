//! 缓存层内存实现
//!
//! 键空间与 Redis 实现一致（见 `keys`），过期判断使用 tokio 时钟，
//! 测试中可以暂停并推进时间。

use crate::context::OpContext;
use crate::error::CacheError;
use crate::keys::{asset_key, latest_key};
use crate::models::{CacheEntry, CachedValue, DEFAULT_SUBSCRIBER_BUFFER, TelemetrySubscription};
use crate::traits::CacheStore;
use domain::{AssetMetadata, EntityKey, TelemetryRecord};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, RwLock};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// 写入时清理过期条目的最小间隔。
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

struct Entries {
    map: HashMap<String, CacheEntry>,
    next_sweep: Instant,
}

impl Entries {
    /// 到达清理时间时移除所有过期条目，避免只写不读的键常驻内存。
    fn sweep_if_due(&mut self, now: Instant) {
        if now < self.next_sweep {
            return;
        }
        self.map.retain(|_, entry| !entry.is_expired(now));
        self.next_sweep = now + SWEEP_INTERVAL;
    }
}

/// 缓存内存存储
pub struct InMemoryCacheStore {
    entries: RwLock<Entries>,
    subscribers: Mutex<HashMap<String, Vec<mpsc::Sender<TelemetryRecord>>>>,
    available: AtomicBool,
    latency: Option<Duration>,
    subscriber_buffer: usize,
}

impl Default for InMemoryCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Entries {
                map: HashMap::new(),
                next_sweep: Instant::now() + SWEEP_INTERVAL,
            }),
            subscribers: Mutex::new(HashMap::new()),
            available: AtomicBool::new(true),
            latency: None,
            subscriber_buffer: DEFAULT_SUBSCRIBER_BUFFER,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn with_subscriber_buffer(mut self, buffer: usize) -> Self {
        self.subscriber_buffer = buffer.max(1);
        self
    }

    /// 模拟缓存整体故障。
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// 未过期条目数（用于测试）
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .map(|entries| entries.map.values().filter(|e| !e.is_expired(now)).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 仍占用内存的条目数，含尚未清理的过期条目（用于测试）
    pub fn stored_entries(&self) -> usize {
        self.entries
            .read()
            .map(|entries| entries.map.len())
            .unwrap_or(0)
    }

    /// 指定频道的活跃订阅者数量。
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.subscribers
            .lock()
            .map(|subs| {
                subs.get(channel)
                    .map(|senders| senders.iter().filter(|tx| !tx.is_closed()).count())
                    .unwrap_or(0)
            })
            .unwrap_or(0)
    }

    async fn simulate_io(&self) -> Result<(), CacheError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if !self.available.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }

    /// 写入条目；`only_if_absent` 为真且已有未过期条目时不写入。返回是否写入。
    fn put(
        &self,
        key: String,
        value: CachedValue,
        ttl: Duration,
        only_if_absent: bool,
    ) -> Result<bool, CacheError> {
        let now = Instant::now();
        let mut entries = self
            .entries
            .write()
            .map_err(|_| CacheError::Unavailable("lock failed".to_string()))?;
        entries.sweep_if_due(now);
        if only_if_absent
            && entries
                .map
                .get(&key)
                .is_some_and(|entry| !entry.is_expired(now))
        {
            return Ok(false);
        }
        entries.map.insert(key, CacheEntry::new(value, now, ttl));
        Ok(true)
    }

    fn take_live(&self, key: &str) -> Result<Option<CachedValue>, CacheError> {
        let now = Instant::now();
        let mut entries = self
            .entries
            .write()
            .map_err(|_| CacheError::Unavailable("lock failed".to_string()))?;
        match entries.map.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.map.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }
}

#[async_trait::async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn set_latest(
        &self,
        ctx: &OpContext,
        entity_key: &EntityKey,
        record: &TelemetryRecord,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let key = latest_key(entity_key);
        ctx.run(
            async {
                self.simulate_io().await?;
                self.put(key.clone(), CachedValue::Latest(record.clone()), ttl, false)
                    .map(|_| ())
            },
            |reason| CacheError::cancelled("set_latest", key.clone(), reason),
        )
        .await
    }

    async fn fill_latest(
        &self,
        ctx: &OpContext,
        entity_key: &EntityKey,
        record: &TelemetryRecord,
        ttl: Duration,
    ) -> Result<bool, CacheError> {
        let key = latest_key(entity_key);
        ctx.run(
            async {
                self.simulate_io().await?;
                self.put(key.clone(), CachedValue::Latest(record.clone()), ttl, true)
            },
            |reason| CacheError::cancelled("fill_latest", key.clone(), reason),
        )
        .await
    }

    async fn get_latest(
        &self,
        ctx: &OpContext,
        entity_key: &EntityKey,
    ) -> Result<Option<TelemetryRecord>, CacheError> {
        let key = latest_key(entity_key);
        ctx.run(
            async {
                self.simulate_io().await?;
                match self.take_live(&key)? {
                    Some(CachedValue::Latest(record)) => Ok(Some(record)),
                    Some(CachedValue::Asset(_)) => Err(CacheError::codec(&key, "unexpected asset")),
                    None => Ok(None),
                }
            },
            |reason| CacheError::cancelled("get_latest", key.clone(), reason),
        )
        .await
    }

    async fn set_asset_snapshot(
        &self,
        ctx: &OpContext,
        asset_id: &str,
        asset: &AssetMetadata,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let key = asset_key(asset_id);
        ctx.run(
            async {
                self.simulate_io().await?;
                self.put(key.clone(), CachedValue::Asset(asset.clone()), ttl, false)
                    .map(|_| ())
            },
            |reason| CacheError::cancelled("set_asset_snapshot", key.clone(), reason),
        )
        .await
    }

    async fn get_asset_snapshot(
        &self,
        ctx: &OpContext,
        asset_id: &str,
    ) -> Result<Option<AssetMetadata>, CacheError> {
        let key = asset_key(asset_id);
        ctx.run(
            async {
                self.simulate_io().await?;
                match self.take_live(&key)? {
                    Some(CachedValue::Asset(asset)) => Ok(Some(asset)),
                    Some(CachedValue::Latest(_)) => {
                        Err(CacheError::codec(&key, "unexpected telemetry record"))
                    }
                    None => Ok(None),
                }
            },
            |reason| CacheError::cancelled("get_asset_snapshot", key.clone(), reason),
        )
        .await
    }

    async fn publish(
        &self,
        ctx: &OpContext,
        channel: &str,
        record: &TelemetryRecord,
    ) -> Result<(), CacheError> {
        ctx.run(
            async {
                self.simulate_io().await?;
                let mut subscribers = self
                    .subscribers
                    .lock()
                    .map_err(|_| CacheError::Unavailable("lock failed".to_string()))?;
                if let Some(senders) = subscribers.get_mut(channel) {
                    senders.retain(|tx| match tx.try_send(record.clone()) {
                        Ok(()) => true,
                        Err(mpsc::error::TrySendError::Full(_)) => true,
                        Err(mpsc::error::TrySendError::Closed(_)) => false,
                    });
                }
                Ok(())
            },
            |reason| CacheError::cancelled("publish", channel, reason),
        )
        .await
    }

    async fn subscribe(
        &self,
        ctx: &OpContext,
        channel: &str,
    ) -> Result<TelemetrySubscription, CacheError> {
        ctx.run(
            async {
                self.simulate_io().await?;
                let (tx, rx) = mpsc::channel(self.subscriber_buffer);
                let mut subscribers = self
                    .subscribers
                    .lock()
                    .map_err(|_| CacheError::Unavailable("lock failed".to_string()))?;
                subscribers.entry(channel.to_string()).or_default().push(tx);
                Ok(TelemetrySubscription::new(rx))
            },
            |reason| CacheError::cancelled("subscribe", channel, reason),
        )
        .await
    }
}
