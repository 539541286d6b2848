//! 资产元数据
//!
//! 资产由关系型登记表维护；缓存层只持有带过期时间的只读副本。

use crate::entity::EntityKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 工业设备或公司资产。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetMetadata {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub asset_type: String,
    pub location: String,
    pub status: String,
    #[serde(default)]
    pub specifications: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub entity_keys: Vec<EntityKey>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 传感器配置描述（来自采集端）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorDescriptor {
    pub id: String,
    pub description: String,
}
