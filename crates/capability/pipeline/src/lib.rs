//! 遥测服务层
//!
//! - [`TelemetryService`]：写入扇出（持久化 → latest 缓存 → 实时发布）、区间查询、latest 读取
//! - [`FallbackPolicy`]：区间查询无数据时的合成记录策略
//! - [`AssetService`]：资产读写与基于传感器描述的资产初始化
//!
//! 存储句柄在构造时注入（`Arc<dyn ...>`），服务本身可克隆并在任务间共享。

pub mod asset;
pub mod error;
pub mod fallback;
pub mod service;

pub use asset::{AssetService, InitializeReport};
pub use error::ServiceError;
pub use fallback::FallbackPolicy;
pub use service::{ServiceConfig, TelemetryService};
