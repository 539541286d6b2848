//! Postgres 时序存储实现

use crate::context::OpContext;
use crate::error::StoreError;
use crate::traits::{MAX_RANGE_ROWS, TelemetryStore};
use chrono::{DateTime, Utc};
use domain::{EntityKey, EntityScope, TelemetryRecord, TimeWindow};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::str::FromStr;

/// 物理表布局。
///
/// 逻辑上只有一种键（[`EntityKey`]）；历史布局只是把键的 parts 映射到各自的列。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryLayout {
    /// `telemetry_records(scope, entity_key, ...)`，支持所有作用域。
    Unified,
    /// `sensor_telemetry(sensor_id, ...)`，仅传感器键。
    SensorColumns,
    /// `company_telemetry(company_id, product_name, ...)`，仅公司+产品键。
    CompanyProductColumns,
}

impl TelemetryLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            TelemetryLayout::Unified => "unified",
            TelemetryLayout::SensorColumns => "sensor",
            TelemetryLayout::CompanyProductColumns => "company_product",
        }
    }

    fn insert_sql(&self) -> &'static str {
        match self {
            TelemetryLayout::Unified => {
                "insert into telemetry_records (scope, entity_key, value, unit, ts, quality, tags) \
                 values ($1, $2, $3, $4, $5, $6, $7)"
            }
            TelemetryLayout::SensorColumns => {
                "insert into sensor_telemetry (sensor_id, value, unit, timestamp, quality) \
                 values ($1, $2, $3, $4, $5)"
            }
            TelemetryLayout::CompanyProductColumns => {
                "insert into company_telemetry (company_id, product_name, value, unit, timestamp, quality) \
                 values ($1, $2, $3, $4, $5, $6)"
            }
        }
    }

    fn select_sql(&self) -> &'static str {
        match self {
            TelemetryLayout::Unified => {
                "select value, unit, ts, quality, tags \
                 from telemetry_records \
                 where scope = $1 and entity_key = $2 \
                 and ts >= $3 and ts <= $4 \
                 order by ts desc \
                 limit $5"
            }
            TelemetryLayout::SensorColumns => {
                "select value, unit, timestamp as ts, quality, '{}'::text[] as tags \
                 from sensor_telemetry \
                 where sensor_id = $1 \
                 and timestamp >= $2 and timestamp <= $3 \
                 order by timestamp desc \
                 limit $4"
            }
            TelemetryLayout::CompanyProductColumns => {
                "select value, unit, timestamp as ts, quality, '{}'::text[] as tags \
                 from company_telemetry \
                 where company_id = $1 and product_name = $2 \
                 and timestamp >= $3 and timestamp <= $4 \
                 order by timestamp desc \
                 limit $5"
            }
        }
    }

    /// 键在该布局下对应的列值（按 SQL 参数顺序）。
    fn key_columns(&self, entity_key: &EntityKey) -> Result<Vec<String>, StoreError> {
        let unsupported = || StoreError::UnsupportedKey {
            entity_key: entity_key.to_string(),
            layout: self.as_str(),
        };
        match self {
            TelemetryLayout::Unified => Ok(vec![
                entity_key.scope().as_str().to_string(),
                entity_key.encoded(),
            ]),
            TelemetryLayout::SensorColumns => match entity_key.scope() {
                EntityScope::Sensor => Ok(entity_key.parts().to_vec()),
                _ => Err(unsupported()),
            },
            TelemetryLayout::CompanyProductColumns => match entity_key.scope() {
                EntityScope::CompanyProduct => Ok(entity_key.parts().to_vec()),
                _ => Err(unsupported()),
            },
        }
    }

    fn stores_tags(&self) -> bool {
        matches!(self, TelemetryLayout::Unified)
    }
}

impl FromStr for TelemetryLayout {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "unified" => Ok(TelemetryLayout::Unified),
            "sensor" => Ok(TelemetryLayout::SensorColumns),
            "company_product" => Ok(TelemetryLayout::CompanyProductColumns),
            other => Err(format!("unknown telemetry layout: {other}")),
        }
    }
}

pub struct PgTelemetryStore {
    pool: PgPool,
    layout: TelemetryLayout,
}

impl PgTelemetryStore {
    pub fn new(pool: PgPool) -> Self {
        Self::with_layout(pool, TelemetryLayout::Unified)
    }

    pub fn with_layout(pool: PgPool, layout: TelemetryLayout) -> Self {
        Self { pool, layout }
    }
}

fn decode_row(entity_key: &EntityKey, row: &PgRow) -> Result<TelemetryRecord, sqlx::Error> {
    let quality: i32 = row.try_get("quality")?;
    let quality = u16::try_from(quality).map_err(|err| sqlx::Error::ColumnDecode {
        index: "quality".to_string(),
        source: Box::new(err),
    })?;
    let timestamp: DateTime<Utc> = row.try_get("ts")?;
    Ok(TelemetryRecord {
        entity_key: entity_key.clone(),
        value: row.try_get("value")?,
        unit: row.try_get("unit")?,
        timestamp,
        quality,
        tags: row.try_get("tags")?,
    })
}

#[async_trait::async_trait]
impl TelemetryStore for PgTelemetryStore {
    async fn append(&self, ctx: &OpContext, record: &TelemetryRecord) -> Result<(), StoreError> {
        let key = &record.entity_key;
        let columns = self.layout.key_columns(key)?;
        let mut query = sqlx::query(self.layout.insert_sql());
        for column in columns {
            query = query.bind(column);
        }
        query = query
            .bind(record.value)
            .bind(&record.unit)
            .bind(record.timestamp)
            .bind(i32::from(record.quality));
        if self.layout.stores_tags() {
            query = query.bind(record.tags.as_slice());
        }
        ctx.run(
            async {
                query
                    .execute(&self.pool)
                    .await
                    .map_err(|err| StoreError::backend("append", key, None, err))?;
                Ok(())
            },
            |reason| StoreError::cancelled("append", key, reason),
        )
        .await
    }

    async fn query_range(
        &self,
        ctx: &OpContext,
        entity_key: &EntityKey,
        window: TimeWindow,
    ) -> Result<Vec<TelemetryRecord>, StoreError> {
        let columns = self.layout.key_columns(entity_key)?;
        let mut query = sqlx::query(self.layout.select_sql());
        for column in columns {
            query = query.bind(column);
        }
        query = query
            .bind(window.start)
            .bind(window.end)
            .bind(MAX_RANGE_ROWS as i64);
        ctx.run(
            async {
                let rows = query.fetch_all(&self.pool).await.map_err(|err| {
                    StoreError::backend("query_range", entity_key, Some(&window), err)
                })?;
                let mut items = Vec::with_capacity(rows.len());
                for row in rows {
                    let record = decode_row(entity_key, &row).map_err(|err| {
                        StoreError::backend("query_range", entity_key, Some(&window), err)
                    })?;
                    items.push(record);
                }
                Ok(items)
            },
            |reason| StoreError::cancelled("query_range", entity_key, reason),
        )
        .await
    }
}
