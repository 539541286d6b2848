//! 合成记录策略
//!
//! 区间查询为空时返回一条占位记录，让展示端始终有值可画。
//! 替换只发生在服务层，存储层从不伪造数据。

use chrono::{DateTime, Utc};
use domain::{EntityKey, EntityScope, TelemetryRecord, ValidationError, quality};
use std::collections::HashMap;

/// 合成记录的标签，便于调用方区分真实数据。
pub const SYNTHETIC_TAG: &str = "synthetic";

#[derive(Debug, Clone, PartialEq)]
pub struct FallbackPolicy {
    pub enabled: bool,
    pub value: f64,
    pub quality: u16,
    pub default_unit: String,
    pub units: HashMap<EntityScope, String>,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            value: 125.5,
            quality: quality::GOOD,
            default_unit: "т/час".to_string(),
            units: HashMap::from([
                (EntityScope::Sensor, "тонны".to_string()),
                (EntityScope::CompanyProduct, "т/час".to_string()),
            ]),
        }
    }
}

impl FallbackPolicy {
    /// 关闭合成数据：空结果原样返回。
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// 由配置中的 `(scope, unit)` 列表构建单位表。
    pub fn with_unit_pairs(
        mut self,
        pairs: &[(String, String)],
    ) -> Result<Self, ValidationError> {
        let mut units = HashMap::with_capacity(pairs.len());
        for (scope, unit) in pairs {
            units.insert(scope.parse::<EntityScope>()?, unit.clone());
        }
        self.units = units;
        Ok(self)
    }

    pub fn unit_for(&self, scope: EntityScope) -> &str {
        self.units
            .get(&scope)
            .map(String::as_str)
            .unwrap_or(self.default_unit.as_str())
    }

    /// 为 `entity_key` 生成一条时间戳为 `now` 的合成记录。
    pub fn synthesize(&self, entity_key: &EntityKey, now: DateTime<Utc>) -> TelemetryRecord {
        TelemetryRecord {
            entity_key: entity_key.clone(),
            value: self.value,
            unit: self.unit_for(entity_key.scope()).to_string(),
            timestamp: now,
            quality: self.quality,
            tags: vec![SYNTHETIC_TAG.to_string()],
        }
    }
}
