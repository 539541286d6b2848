//! 资产服务
//!
//! 登记表是权威数据；缓存只持有带过期时间的快照。

use crate::error::ServiceError;
use chrono::Utc;
use domain::{AssetClassification, AssetMetadata, AssetRuleTable, EntityKey, SensorDescriptor};
use ems_storage::{AssetRegistry, CacheStore, OpContext};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

/// 由传感器推断出的资产类型。
pub const DERIVED_ASSET_TYPE: &str = "Производственное оборудование";
pub const DERIVED_ASSET_STATUS: &str = "active";

/// 资产初始化结果。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitializeReport {
    /// 写入成功的资产 ID。
    pub created: Vec<String>,
    /// 写入失败而跳过的资产 ID。
    pub failed: Vec<String>,
    /// 规则表无法识别的传感器 ID。
    pub unclassified: Vec<String>,
}

#[derive(Clone)]
pub struct AssetService {
    registry: Arc<dyn AssetRegistry>,
    cache: Arc<dyn CacheStore>,
    rules: Arc<AssetRuleTable>,
    snapshot_ttl: Duration,
}

impl AssetService {
    pub fn new(
        registry: Arc<dyn AssetRegistry>,
        cache: Arc<dyn CacheStore>,
        rules: AssetRuleTable,
        snapshot_ttl: Duration,
    ) -> Self {
        Self {
            registry,
            cache,
            rules: Arc::new(rules),
            snapshot_ttl,
        }
    }

    /// 先查快照缓存，未命中时读登记表并回填。
    pub async fn get_asset(
        &self,
        ctx: &OpContext,
        asset_id: &str,
    ) -> Result<Option<AssetMetadata>, ServiceError> {
        match self.cache.get_asset_snapshot(ctx, asset_id).await {
            Ok(Some(asset)) => return Ok(Some(asset)),
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(asset_id, error = %err, "asset snapshot read failed");
            }
        }
        let asset = self.registry.find_asset(ctx, asset_id).await?;
        if let Some(asset) = &asset {
            self.cache_snapshot(ctx, asset).await;
        }
        Ok(asset)
    }

    pub async fn list_assets(&self, ctx: &OpContext) -> Result<Vec<AssetMetadata>, ServiceError> {
        Ok(self.registry.list_assets(ctx).await?)
    }

    /// 写入登记表（致命），随后尽力缓存快照。
    ///
    /// 更新时登记表保留原 `created_at`，因此快照与返回值取自写入后回读的行。
    pub async fn create_asset(
        &self,
        ctx: &OpContext,
        asset: AssetMetadata,
    ) -> Result<AssetMetadata, ServiceError> {
        if let Err(err) = self.registry.upsert_asset(ctx, &asset).await {
            tracing::error!(asset_id = %asset.id, error = %err, "asset upsert failed");
            return Err(err.into());
        }
        match self.registry.find_asset(ctx, &asset.id).await {
            Ok(Some(stored)) => {
                self.cache_snapshot(ctx, &stored).await;
                Ok(stored)
            }
            Ok(None) => {
                tracing::warn!(asset_id = %asset.id, "asset missing right after upsert");
                Ok(asset)
            }
            Err(err) => {
                tracing::warn!(asset_id = %asset.id, error = %err, "asset read-back failed, snapshot skipped");
                Ok(asset)
            }
        }
    }

    /// 按规则表由传感器描述推断资产并写入。
    ///
    /// 同一资产 ID 的传感器合并为一个资产；单个资产写入失败记录告警后继续。
    pub async fn initialize_from_sensors(
        &self,
        ctx: &OpContext,
        sensors: &[SensorDescriptor],
    ) -> InitializeReport {
        let mut report = InitializeReport::default();
        let mut grouped: Vec<(AssetClassification, Vec<EntityKey>)> = Vec::new();

        for sensor in sensors {
            let Some(classification) = self.rules.classify(sensor) else {
                tracing::debug!(sensor_id = %sensor.id, "sensor not matched by asset rules");
                report.unclassified.push(sensor.id.clone());
                continue;
            };
            let key = match EntityKey::sensor(sensor.id.as_str()) {
                Ok(key) => key,
                Err(err) => {
                    tracing::warn!(sensor_id = %sensor.id, error = %err, "invalid sensor id");
                    report.unclassified.push(sensor.id.clone());
                    continue;
                }
            };
            let asset_id = classification.asset_id();
            match grouped
                .iter_mut()
                .find(|(existing, _)| existing.asset_id() == asset_id)
            {
                Some((_, keys)) => {
                    if !keys.contains(&key) {
                        keys.push(key);
                    }
                }
                None => grouped.push((classification, vec![key])),
            }
        }

        for (classification, entity_keys) in grouped {
            let asset = derived_asset(&classification, entity_keys);
            let asset_id = asset.id.clone();
            match self.create_asset(ctx, asset).await {
                Ok(_) => report.created.push(asset_id),
                Err(err) => {
                    tracing::warn!(asset_id = %asset_id, error = %err, "skipping asset");
                    report.failed.push(asset_id);
                }
            }
        }
        report
    }

    async fn cache_snapshot(&self, ctx: &OpContext, asset: &AssetMetadata) {
        if let Err(err) = self
            .cache
            .set_asset_snapshot(ctx, &asset.id, asset, self.snapshot_ttl)
            .await
        {
            tracing::warn!(asset_id = %asset.id, error = %err, "asset snapshot cache failed");
        }
    }
}

fn derived_asset(classification: &AssetClassification, entity_keys: Vec<EntityKey>) -> AssetMetadata {
    let now = Utc::now();
    let mut specifications = Map::new();
    specifications.insert(
        "company".to_string(),
        Value::String(classification.company.clone()),
    );
    specifications.insert(
        "equipment".to_string(),
        Value::String(classification.equipment.clone()),
    );
    specifications.insert(
        "products".to_string(),
        Value::Array(
            classification
                .products
                .iter()
                .cloned()
                .map(Value::String)
                .collect(),
        ),
    );
    AssetMetadata {
        id: classification.asset_id(),
        name: classification.asset_name(),
        asset_type: DERIVED_ASSET_TYPE.to_string(),
        location: classification.location.clone(),
        status: DERIVED_ASSET_STATUS.to_string(),
        specifications,
        entity_keys,
        created_at: now,
        updated_at: now,
    }
}
