//! 追踪、请求 ID 与遥测服务指标。
//!
//! 指标实例由应用启动时创建并注入服务（`Arc<TelemetryMetrics>`），不使用全局单例，
//! 测试之间互不干扰。

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt};

/// 请求级追踪标识。
#[derive(Debug, Clone)]
pub struct RequestIds {
    pub request_id: String,
    pub trace_id: String,
}

/// 指标快照。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
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

/// 遥测服务计数器。
#[derive(Debug, Default)]
pub struct TelemetryMetrics {
    records_accepted: AtomicU64,
    records_rejected: AtomicU64,
    store_failures: AtomicU64,
    cache_write_failures: AtomicU64,
    publish_failures: AtomicU64,
    range_queries: AtomicU64,
    synthetic_fallbacks: AtomicU64,
    latest_cache_hits: AtomicU64,
    latest_cache_misses: AtomicU64,
    write_latency_ms_total: AtomicU64,
    write_latency_ms_count: AtomicU64,
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_accepted: self.records_accepted.load(Ordering::Relaxed),
            records_rejected: self.records_rejected.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
            cache_write_failures: self.cache_write_failures.load(Ordering::Relaxed),
            publish_failures: self.publish_failures.load(Ordering::Relaxed),
            range_queries: self.range_queries.load(Ordering::Relaxed),
            synthetic_fallbacks: self.synthetic_fallbacks.load(Ordering::Relaxed),
            latest_cache_hits: self.latest_cache_hits.load(Ordering::Relaxed),
            latest_cache_misses: self.latest_cache_misses.load(Ordering::Relaxed),
            write_latency_ms_total: self.write_latency_ms_total.load(Ordering::Relaxed),
            write_latency_ms_count: self.write_latency_ms_count.load(Ordering::Relaxed),
        }
    }

    /// 记录持久化成功的记录数。
    pub fn record_accepted(&self) {
        self.records_accepted.fetch_add(1, Ordering::Relaxed);
    }

    /// 记录校验失败的记录数。
    pub fn record_rejected(&self) {
        self.records_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_store_failure(&self) {
        self.store_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// latest 缓存写入失败（不影响写入结果）。
    pub fn record_cache_write_failure(&self) {
        self.cache_write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_publish_failure(&self) {
        self.publish_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_range_query(&self) {
        self.range_queries.fetch_add(1, Ordering::Relaxed);
    }

    /// 区间查询为空时返回了合成记录。
    pub fn record_synthetic_fallback(&self) {
        self.synthetic_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_latest_lookup(&self, hit: bool) {
        if hit {
            self.latest_cache_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.latest_cache_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// 记录持久化写入耗时。
    pub fn record_write_latency(&self, latency: Duration) {
        let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.write_latency_ms_total
            .fetch_add(latency_ms, Ordering::Relaxed);
        self.write_latency_ms_count.fetch_add(1, Ordering::Relaxed);
    }
}

/// 初始化 tracing（默认 info，可通过 `RUST_LOG` 覆盖）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 生成新的 request_id 与 trace_id。
pub fn new_request_ids() -> RequestIds {
    RequestIds {
        request_id: uuid::Uuid::new_v4().to_string(),
        trace_id: uuid::Uuid::new_v4().to_string(),
    }
}
