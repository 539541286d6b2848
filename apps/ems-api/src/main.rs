//! 遥测 HTTP 服务：写入、区间查询、latest 读取、实时推送与资产接口。
//!
//! 服务本身是薄适配层，业务逻辑在 `ems-pipeline`。

mod handlers;
mod middleware;
mod routes;
mod utils;

use domain::AssetRuleTable;
use ems_config::AppConfig;
use ems_pipeline::{AssetService, FallbackPolicy, ServiceConfig, TelemetryService};
use ems_storage::{
    CacheStore, InMemoryCacheStore, OpContext, PgAssetRegistry, PgTelemetryStore,
    RedisCacheStore, TelemetryLayout, connect_pool,
};
use ems_telemetry::{TelemetryMetrics, init_tracing};
use std::sync::Arc;
use std::time::Duration;

/// 请求间共享的应用状态。
#[derive(Clone)]
pub struct AppState {
    pub telemetry: TelemetryService,
    pub assets: AssetService,
    pub metrics: Arc<TelemetryMetrics>,
    /// 单个请求内所有存储/缓存操作的截止时间。
    pub op_timeout: Duration,
    pub export_password: Option<Arc<str>>,
}

impl AppState {
    /// 新请求的调用上下文。
    pub fn op_context(&self) -> OpContext {
        OpContext::with_timeout(self.op_timeout)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    // 从环境变量加载运行配置
    let config = AppConfig::from_env()?;
    // 初始化结构化日志
    init_tracing();

    let layout = config.telemetry_layout.parse::<TelemetryLayout>()?;
    // Postgres 连接池（需先执行 migrations）
    let pool = connect_pool(&config.database_url, config.db_max_connections).await?;
    let store = Arc::new(PgTelemetryStore::with_layout(pool.clone(), layout));
    let registry = Arc::new(PgAssetRegistry::new(pool.clone()));
    let cache = connect_cache(config.redis_url.as_deref()).await;
    let metrics = Arc::new(TelemetryMetrics::new());

    let fallback = FallbackPolicy {
        enabled: config.fallback.enabled,
        value: config.fallback.value,
        quality: config.fallback.quality,
        default_unit: config.fallback.default_unit.clone(),
        ..FallbackPolicy::default()
    }
    .with_unit_pairs(&config.fallback.units)?;
    let telemetry = TelemetryService::new(
        store,
        cache.clone(),
        metrics.clone(),
        ServiceConfig {
            latest_ttl: Duration::from_secs(config.latest_ttl_seconds),
            channel: config.pubsub_channel.clone(),
            default_window: seconds(config.default_window_seconds),
            latest_lookback: seconds(config.latest_lookback_seconds),
            fallback,
        },
    );
    let assets = AssetService::new(
        registry,
        cache,
        AssetRuleTable::default(),
        Duration::from_secs(config.asset_ttl_seconds),
    );
    let state = AppState {
        telemetry,
        assets,
        metrics,
        op_timeout: Duration::from_millis(config.op_timeout_ms),
        export_password: config.admin_export_password.as_deref().map(Arc::from),
    };

    let app = routes::create_router(state);
    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    tracing::info!(addr = %config.http_addr, layout = layout.as_str(), "telemetry api listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // HTTP 停止后再释放连接池
    pool.close().await;
    tracing::info!("shutdown complete");
    Ok(())
}

/// Redis 不可用时退回进程内缓存：缓存只是优化，服务仍然正确。
async fn connect_cache(redis_url: Option<&str>) -> Arc<dyn CacheStore> {
    match redis_url {
        Some(url) => match RedisCacheStore::connect(url).await {
            Ok(cache) => Arc::new(cache),
            Err(err) => {
                tracing::warn!(error = %err, "redis unavailable, using in-process cache");
                Arc::new(InMemoryCacheStore::new())
            }
        },
        None => {
            tracing::info!("EMS_REDIS_URL not set, using in-process cache");
            Arc::new(InMemoryCacheStore::new())
        }
    }
}

/// 窗口跨度上限（约 100 年），避免时间运算溢出。
const MAX_SPAN_SECONDS: u64 = 100 * 365 * 86_400;

fn seconds(value: u64) -> chrono::Duration {
    chrono::Duration::seconds(value.min(MAX_SPAN_SECONDS) as i64)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
