//! # PostgreSQL 存储实现模块
//!
//! - **TelemetryStore** (`telemetry.rs`)：时序记录，支持统一布局与两种历史布局
//! - **AssetRegistry** (`asset.rs`)：资产登记表
//!
//! ## 数据库模式要求
//!
//! 见 `migrations/0001_telemetry.sql`：
//! - `telemetry_records`：统一布局（scope, entity_key, value, unit, ts, quality, tags）
//! - `sensor_telemetry`：历史布局，单一 `sensor_id` 列
//! - `company_telemetry`：历史布局，`company_id` + `product_name` 列
//! - `assets`：资产登记表
//!
//! ## 约束
//!
//! - 所有 SQL 使用参数绑定
//! - `append` 是单条 insert（自动提交），取消时要么整行写入要么完全未写入
//! - 质量码以 integer 存储，读取时校验 u16 范围

pub mod asset;
pub mod telemetry;

pub use asset::*;
pub use telemetry::*;
