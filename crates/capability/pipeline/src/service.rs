//! 遥测服务
//!
//! 写入顺序：持久化（致命） → latest 缓存（尽力而为） → 实时发布（尽力而为）。
//! 缓存整体不可用时结果不变，只是更慢。

use crate::error::ServiceError;
use crate::fallback::FallbackPolicy;
use chrono::{DateTime, Utc};
use domain::{EntityKey, TelemetryRecord, TimeWindow};
use ems_storage::{CacheStore, OpContext, TelemetryStore, TelemetrySubscription};
use ems_telemetry::TelemetryMetrics;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// 服务参数。
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub latest_ttl: Duration,
    pub channel: String,
    /// 未指定窗口边界时向前回溯的跨度。
    pub default_window: chrono::Duration,
    /// latest 缓存未命中时回查存储的跨度。
    pub latest_lookback: chrono::Duration,
    pub fallback: FallbackPolicy,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            latest_ttl: Duration::from_secs(300),
            channel: "telemetry:live".to_string(),
            default_window: chrono::Duration::hours(1),
            latest_lookback: chrono::Duration::hours(24),
            fallback: FallbackPolicy::default(),
        }
    }
}

#[derive(Clone)]
pub struct TelemetryService {
    store: Arc<dyn TelemetryStore>,
    cache: Arc<dyn CacheStore>,
    metrics: Arc<TelemetryMetrics>,
    config: ServiceConfig,
}

impl TelemetryService {
    pub fn new(
        store: Arc<dyn TelemetryStore>,
        cache: Arc<dyn CacheStore>,
        metrics: Arc<TelemetryMetrics>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            store,
            cache,
            metrics,
            config,
        }
    }

    /// 校验并写入一条记录。
    ///
    /// 持久化成功即视为成功；latest 缓存和实时发布失败只记录告警。
    pub async fn record(
        &self,
        ctx: &OpContext,
        record: TelemetryRecord,
    ) -> Result<TelemetryRecord, ServiceError> {
        if let Err(err) = record.validate() {
            self.metrics.record_rejected();
            return Err(err.into());
        }

        let started = Instant::now();
        if let Err(err) = self.store.append(ctx, &record).await {
            self.metrics.record_store_failure();
            tracing::error!(
                entity_key = %record.entity_key,
                timestamp = %record.timestamp,
                error = %err,
                "telemetry append failed"
            );
            return Err(err.into());
        }
        self.metrics.record_write_latency(started.elapsed());
        self.metrics.record_accepted();
        tracing::debug!(entity_key = %record.entity_key, value = record.value, "telemetry appended");

        if let Err(err) = self
            .cache
            .set_latest(ctx, &record.entity_key, &record, self.config.latest_ttl)
            .await
        {
            self.metrics.record_cache_write_failure();
            tracing::warn!(entity_key = %record.entity_key, error = %err, "latest cache update failed");
        }

        if let Err(err) = self.cache.publish(ctx, &self.config.channel, &record).await {
            self.metrics.record_publish_failure();
            tracing::warn!(
                entity_key = %record.entity_key,
                channel = %self.config.channel,
                error = %err,
                "telemetry publish failed"
            );
        }

        Ok(record)
    }

    /// 区间查询（按时间倒序）。
    ///
    /// 边界缺省时取 `[end - default_window, now]`；结果为空且策略开启时返回一条合成记录。
    pub async fn get_range(
        &self,
        ctx: &OpContext,
        entity_key: &EntityKey,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<TelemetryRecord>, ServiceError> {
        let now = Utc::now();
        let window = TimeWindow::resolve(start, end, now, self.config.default_window)?;
        self.metrics.record_range_query();

        let records = match self.store.query_range(ctx, entity_key, window).await {
            Ok(records) => records,
            Err(err) => {
                self.metrics.record_store_failure();
                tracing::error!(
                    entity_key = %entity_key,
                    window = %window,
                    error = %err,
                    "telemetry range query failed"
                );
                return Err(err.into());
            }
        };

        if records.is_empty() && self.config.fallback.enabled {
            self.metrics.record_synthetic_fallback();
            tracing::info!(
                entity_key = %entity_key,
                window = %window,
                "no telemetry in window, returning synthetic record"
            );
            return Ok(vec![self.config.fallback.synthesize(entity_key, now)]);
        }
        Ok(records)
    }

    /// 读取实体的最新记录：先查缓存，未命中（或缓存故障）时回查存储并回填缓存。
    ///
    /// 这里不做合成替换，没有数据时返回 `None`。
    pub async fn get_latest(
        &self,
        ctx: &OpContext,
        entity_key: &EntityKey,
    ) -> Result<Option<TelemetryRecord>, ServiceError> {
        match self.cache.get_latest(ctx, entity_key).await {
            Ok(Some(record)) => {
                self.metrics.record_latest_lookup(true);
                return Ok(Some(record));
            }
            Ok(None) => self.metrics.record_latest_lookup(false),
            Err(err) => {
                self.metrics.record_latest_lookup(false);
                tracing::warn!(entity_key = %entity_key, error = %err, "latest cache read failed");
            }
        }

        let window = TimeWindow::trailing(Utc::now(), self.config.latest_lookback);
        let latest = match self.store.query_range(ctx, entity_key, window).await {
            Ok(records) => records.into_iter().next(),
            Err(err) => {
                self.metrics.record_store_failure();
                tracing::error!(
                    entity_key = %entity_key,
                    window = %window,
                    error = %err,
                    "latest lookup from store failed"
                );
                return Err(err.into());
            }
        };

        let Some(record) = latest else {
            return Ok(None);
        };
        // 回填只在缓存为空时写入：读存储期间可能已有更新的记录被接受
        match self
            .cache
            .fill_latest(ctx, entity_key, &record, self.config.latest_ttl)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                if let Ok(Some(newer)) = self.cache.get_latest(ctx, entity_key).await {
                    return Ok(Some(newer));
                }
            }
            Err(err) => {
                self.metrics.record_cache_write_failure();
                tracing::warn!(entity_key = %entity_key, error = %err, "latest cache refill failed");
            }
        }
        Ok(Some(record))
    }

    /// 订阅实时通道；只能收到订阅之后写入的记录。
    pub async fn subscribe(&self, ctx: &OpContext) -> Result<TelemetrySubscription, ServiceError> {
        Ok(self.cache.subscribe(ctx, &self.config.channel).await?)
    }
}
