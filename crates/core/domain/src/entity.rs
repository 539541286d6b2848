//! 统一实体键
//!
//! 历史上存在两套并行的键模型：单一传感器 ID，以及（公司 ID, 产品名）对。
//! 这里统一为一个带标签的复合键：`scope` + 有序 `parts`。
//! 存储与缓存只把它当作不透明的 `scope` 字符串和编码后的 `parts` 使用。

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 编码后 parts 之间的分隔符。
pub const PART_SEPARATOR: char = '/';
/// scope 与编码 parts 之间的分隔符（也是缓存键分隔符）。
pub const SCOPE_SEPARATOR: char = ':';

/// 实体作用域。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityScope {
    /// 单一传感器 ID。
    Sensor,
    /// 公司 ID + 产品名。
    CompanyProduct,
}

impl EntityScope {
    pub const ALL: [EntityScope; 2] = [EntityScope::Sensor, EntityScope::CompanyProduct];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityScope::Sensor => "sensor",
            EntityScope::CompanyProduct => "company_product",
        }
    }

    /// 该作用域要求的 parts 数量。
    pub fn arity(&self) -> usize {
        match self {
            EntityScope::Sensor => 1,
            EntityScope::CompanyProduct => 2,
        }
    }
}

impl fmt::Display for EntityScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityScope {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sensor" => Ok(EntityScope::Sensor),
            "company_product" => Ok(EntityScope::CompanyProduct),
            other => Err(ValidationError::UnknownScope(other.to_string())),
        }
    }
}

/// 遥测记录所属的实体键。
///
/// 构造时即校验：parts 非空、数量与 scope 一致、不含保留分隔符。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawEntityKey")]
pub struct EntityKey {
    scope: EntityScope,
    parts: Vec<String>,
}

#[derive(Deserialize)]
struct RawEntityKey {
    scope: EntityScope,
    parts: Vec<String>,
}

impl TryFrom<RawEntityKey> for EntityKey {
    type Error = ValidationError;

    fn try_from(raw: RawEntityKey) -> Result<Self, Self::Error> {
        EntityKey::new(raw.scope, raw.parts)
    }
}

impl EntityKey {
    pub fn new(scope: EntityScope, parts: Vec<String>) -> Result<Self, ValidationError> {
        if parts.is_empty() {
            return Err(ValidationError::EmptyEntityKey);
        }
        if parts.len() != scope.arity() {
            return Err(ValidationError::ArityMismatch {
                scope,
                expected: scope.arity(),
                actual: parts.len(),
            });
        }
        let mut normalized = Vec::with_capacity(parts.len());
        for part in parts {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                return Err(ValidationError::EmptyEntityKey);
            }
            if trimmed.contains(PART_SEPARATOR) || trimmed.contains(SCOPE_SEPARATOR) {
                return Err(ValidationError::InvalidKeyPart(trimmed.to_string()));
            }
            normalized.push(trimmed.to_string());
        }
        Ok(Self {
            scope,
            parts: normalized,
        })
    }

    pub fn sensor(sensor_id: impl Into<String>) -> Result<Self, ValidationError> {
        Self::new(EntityScope::Sensor, vec![sensor_id.into()])
    }

    pub fn company_product(
        company_id: impl Into<String>,
        product_name: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Self::new(
            EntityScope::CompanyProduct,
            vec![company_id.into(), product_name.into()],
        )
    }

    /// 由作用域和编码后的 parts 还原（数据库行、缓存键）。
    pub fn from_encoded(scope: EntityScope, encoded: &str) -> Result<Self, ValidationError> {
        let parts = encoded
            .split(PART_SEPARATOR)
            .map(|part| part.to_string())
            .collect();
        Self::new(scope, parts)
    }

    /// 解析外部输入：`<scope>:<parts>`，不带 scope 时视为传感器 ID。
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ValidationError::EmptyEntityKey);
        }
        match value.split_once(SCOPE_SEPARATOR) {
            Some((scope, rest)) => Self::from_encoded(scope.parse()?, rest),
            None => Self::sensor(value),
        }
    }

    pub fn scope(&self) -> EntityScope {
        self.scope
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// parts 以 `/` 连接后的形式。
    pub fn encoded(&self) -> String {
        self.parts.join(&PART_SEPARATOR.to_string())
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.scope, SCOPE_SEPARATOR, self.encoded())
    }
}

impl FromStr for EntityKey {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_value_parses_as_sensor() {
        let key = EntityKey::parse("sensor-42").expect("parse");
        assert_eq!(key.scope(), EntityScope::Sensor);
        assert_eq!(key.parts(), &["sensor-42".to_string()]);
        assert_eq!(key.to_string(), "sensor:sensor-42");
    }

    #[test]
    fn company_product_round_trips_through_display() {
        let key = EntityKey::company_product("sibur", "Полипропилен").expect("key");
        assert_eq!(key.to_string(), "company_product:sibur/Полипропилен");
        let parsed: EntityKey = key.to_string().parse().expect("parse");
        assert_eq!(parsed, key);
    }

    #[test]
    fn rejects_wrong_arity() {
        let err = EntityKey::new(EntityScope::CompanyProduct, vec!["sibur".to_string()])
            .expect_err("arity");
        assert!(matches!(
            err,
            ValidationError::ArityMismatch {
                expected: 2,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn rejects_blank_and_reserved_parts() {
        assert!(matches!(
            EntityKey::sensor("  "),
            Err(ValidationError::EmptyEntityKey)
        ));
        assert!(matches!(
            EntityKey::parse(""),
            Err(ValidationError::EmptyEntityKey)
        ));
        assert!(matches!(
            EntityKey::sensor("a:b"),
            Err(ValidationError::InvalidKeyPart(_))
        ));
    }

    #[test]
    fn unknown_scope_is_rejected() {
        let err = EntityKey::parse("pump:p-1").expect_err("scope");
        assert!(matches!(err, ValidationError::UnknownScope(scope) if scope == "pump"));
    }

    #[test]
    fn deserialize_validates() {
        let ok: EntityKey =
            serde_json::from_str(r#"{"scope":"sensor","parts":["s-1"]}"#).expect("valid");
        assert_eq!(ok.encoded(), "s-1");
        let bad = serde_json::from_str::<EntityKey>(r#"{"scope":"sensor","parts":[]}"#);
        assert!(bad.is_err());
    }
}
