//! 遥测领域模型：所有模块共享的数据结构。
//!
//! - [`EntityKey`]：统一的实体键（传感器 / 公司+产品）
//! - [`TelemetryRecord`]：一条测量记录
//! - [`AssetMetadata`]：资产元数据（缓存只读副本）
//! - [`AssetRuleTable`]：由传感器描述推断资产信息的规则表

pub mod asset;
pub mod asset_rules;
pub mod entity;
pub mod error;
pub mod record;
pub mod window;

pub use asset::{AssetMetadata, SensorDescriptor};
pub use asset_rules::{AssetClassification, AssetRuleTable, CompanyRule};
pub use entity::{EntityKey, EntityScope};
pub use error::ValidationError;
pub use record::{TelemetryRecord, quality};
pub use window::TimeWindow;
