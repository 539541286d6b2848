//! 时序存储内存实现

use crate::context::OpContext;
use crate::error::StoreError;
use crate::traits::{MAX_RANGE_ROWS, TelemetryStore};
use domain::{EntityKey, TelemetryRecord, TimeWindow};
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// 时序内存存储
pub struct InMemoryTelemetryStore {
    records: RwLock<HashMap<EntityKey, Vec<TelemetryRecord>>>,
    available: AtomicBool,
    latency: Option<Duration>,
}

impl Default for InMemoryTelemetryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTelemetryStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
            latency: None,
        }
    }

    /// 每次操作前等待 `latency`，模拟慢后端。
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// 切换可用性；不可用时所有操作返回后端错误。
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// 指定实体的行数（用于测试）
    pub fn count_for(&self, entity_key: &EntityKey) -> usize {
        self.records
            .read()
            .map(|records| records.get(entity_key).map(Vec::len).unwrap_or(0))
            .unwrap_or(0)
    }

    /// 总行数（用于测试）
    pub fn len(&self) -> usize {
        self.records
            .read()
            .map(|records| records.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    async fn simulate_io(&self) -> Result<(), String> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if !self.available.load(Ordering::SeqCst) {
            return Err("connection refused".to_string());
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl TelemetryStore for InMemoryTelemetryStore {
    async fn append(&self, ctx: &OpContext, record: &TelemetryRecord) -> Result<(), StoreError> {
        let key = &record.entity_key;
        ctx.run(
            async {
                self.simulate_io()
                    .await
                    .map_err(|message| StoreError::backend("append", key, None, message))?;
                let mut records = self
                    .records
                    .write()
                    .map_err(|_| StoreError::backend("append", key, None, "lock failed"))?;
                records.entry(key.clone()).or_default().push(record.clone());
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
        ctx.run(
            async {
                self.simulate_io().await.map_err(|message| {
                    StoreError::backend("query_range", entity_key, Some(&window), message)
                })?;
                let records = self.records.read().map_err(|_| {
                    StoreError::backend("query_range", entity_key, Some(&window), "lock failed")
                })?;
                let mut selected: Vec<TelemetryRecord> = records
                    .get(entity_key)
                    .map(|items| {
                        items
                            .iter()
                            .filter(|item| window.contains(item.timestamp))
                            .cloned()
                            .collect()
                    })
                    .unwrap_or_default();
                selected.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
                selected.truncate(MAX_RANGE_ROWS);
                Ok(selected)
            },
            |reason| StoreError::cancelled("query_range", entity_key, reason),
        )
        .await
    }
}
