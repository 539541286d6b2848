//! 内存存储实现模块
//!
//! 用于本地演示和测试。
//!
//! 包含以下实现：
//! - TelemetryStore: InMemoryTelemetryStore
//! - CacheStore: InMemoryCacheStore
//! - AssetRegistry: InMemoryAssetRegistry
//!
//! 时序存储与缓存支持模拟延迟和故障（`with_latency`、`set_available`），
//! 用于验证取消和降级路径。

pub mod asset;
pub mod cache;
pub mod telemetry;

pub use asset::*;
pub use cache::*;
pub use telemetry::*;
