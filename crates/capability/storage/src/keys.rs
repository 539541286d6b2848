//! 缓存键格式
//!
//! - latest 值：`<entity-scope>:<entity-key>:latest`
//! - 资产快照：`asset:<asset_id>`

use domain::EntityKey;

pub fn latest_key(entity_key: &EntityKey) -> String {
    format!("{}:{}:latest", entity_key.scope().as_str(), entity_key.encoded())
}

pub fn asset_key(asset_id: &str) -> String {
    format!("asset:{asset_id}")
}
