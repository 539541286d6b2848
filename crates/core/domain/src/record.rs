//! 遥测记录

use crate::entity::EntityKey;
use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 质量码常量。质量码对核心而言是不透明的标志位，这里只列出已观测到的取值。
pub mod quality {
    pub const BAD: u16 = 0;
    pub const GOOD: u16 = 1;
    /// 厂商定义的 "good, raw"。
    pub const GOOD_RAW: u16 = 192;
}

/// 一条测量记录，落库后不可变。
///
/// `timestamp` 是测量所对应的时间点，而非接收时间。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub entity_key: EntityKey,
    pub value: f64,
    pub unit: String,
    pub timestamp: DateTime<Utc>,
    pub quality: u16,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl TelemetryRecord {
    /// 构造并校验记录（值必须是有限数）。
    pub fn new(
        entity_key: EntityKey,
        value: f64,
        unit: impl Into<String>,
        timestamp: DateTime<Utc>,
        quality: u16,
        tags: Vec<String>,
    ) -> Result<Self, ValidationError> {
        let record = Self {
            entity_key,
            value,
            unit: unit.into(),
            timestamp,
            quality,
            tags,
        };
        record.validate()?;
        Ok(record)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.entity_key.parts().is_empty() {
            return Err(ValidationError::EmptyEntityKey);
        }
        if !self.value.is_finite() {
            return Err(ValidationError::NonFiniteValue);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn key() -> EntityKey {
        EntityKey::sensor("sensor-42").expect("key")
    }

    #[test]
    fn rejects_non_finite_values() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = TelemetryRecord::new(key(), value, "т/час", ts, quality::GOOD, vec![])
                .expect_err("non finite");
            assert_eq!(err, ValidationError::NonFiniteValue);
        }
    }

    #[test]
    fn json_shape_uses_snake_case_and_omits_empty_tags() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let record =
            TelemetryRecord::new(key(), 25.5, "т/час", ts, quality::GOOD, vec![]).expect("record");
        let value = serde_json::to_value(&record).expect("serialize");
        assert_eq!(value["entity_key"]["scope"], "sensor");
        assert_eq!(value["entity_key"]["parts"][0], "sensor-42");
        assert_eq!(value["quality"], 1);
        assert!(value.get("tags").is_none());

        let back: TelemetryRecord = serde_json::from_value(value).expect("deserialize");
        assert_eq!(back, record);
    }
}
