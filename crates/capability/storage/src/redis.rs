//! Redis 缓存与发布订阅实现
//!
//! 值以 JSON 存储并带 TTL；发布订阅使用 Redis PUBLISH/SUBSCRIBE。
//! 命令连接使用 `ConnectionManager`，启动时建立一次并在请求间复用。

use crate::context::OpContext;
use crate::error::CacheError;
use crate::keys::{asset_key, latest_key};
use crate::models::{DEFAULT_SUBSCRIBER_BUFFER, TelemetrySubscription};
use crate::traits::CacheStore;
use domain::{AssetMetadata, EntityKey, TelemetryRecord};
use futures::StreamExt;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::sync::mpsc;

/// Redis 缓存存储
pub struct RedisCacheStore {
    client: redis::Client,
    manager: ConnectionManager,
    subscriber_buffer: usize,
}

impl RedisCacheStore {
    /// 打开客户端并建立共享的命令连接。
    pub async fn connect(redis_url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let manager = ConnectionManager::new(client.clone()).await?;
        Ok(Self {
            client,
            manager,
            subscriber_buffer: DEFAULT_SUBSCRIBER_BUFFER,
        })
    }

    pub fn with_subscriber_buffer(mut self, buffer: usize) -> Self {
        self.subscriber_buffer = buffer.max(1);
        self
    }

    async fn put_json<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let data = serde_json::to_string(value).map_err(|err| CacheError::codec(key, err))?;
        let mut connection = self.manager.clone();
        connection
            .set_ex::<_, _, ()>(key, data, ttl_seconds(ttl))
            .await?;
        Ok(())
    }

    /// `SET key value NX EX ttl`：键已存在时不写入。
    async fn put_json_if_absent<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<bool, CacheError> {
        let data = serde_json::to_string(value).map_err(|err| CacheError::codec(key, err))?;
        let mut connection = self.manager.clone();
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(data)
            .arg("NX")
            .arg("EX")
            .arg(ttl_seconds(ttl))
            .query_async(&mut connection)
            .await?;
        Ok(reply.is_some())
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let mut connection = self.manager.clone();
        let data: Option<String> = connection.get(key).await?;
        data.map(|raw| serde_json::from_str(&raw).map_err(|err| CacheError::codec(key, err)))
            .transpose()
    }
}

/// Redis 可接受的最大过期秒数（毫秒表示不得溢出 i64）。
const MAX_TTL_SECONDS: u64 = (i64::MAX / 1000) as u64;

/// Redis TTL 以秒为单位，至少 1 秒。
fn ttl_seconds(ttl: Duration) -> u64 {
    ttl.as_secs().clamp(1, MAX_TTL_SECONDS)
}

#[async_trait::async_trait]
impl CacheStore for RedisCacheStore {
    async fn set_latest(
        &self,
        ctx: &OpContext,
        entity_key: &EntityKey,
        record: &TelemetryRecord,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let key = latest_key(entity_key);
        ctx.run(self.put_json(&key, record, ttl), |reason| {
            CacheError::cancelled("set_latest", key.clone(), reason)
        })
        .await
    }

    async fn fill_latest(
        &self,
        ctx: &OpContext,
        entity_key: &EntityKey,
        record: &TelemetryRecord,
        ttl: Duration,
    ) -> Result<bool, CacheError> {
        let key = latest_key(entity_key);
        ctx.run(self.put_json_if_absent(&key, record, ttl), |reason| {
            CacheError::cancelled("fill_latest", key.clone(), reason)
        })
        .await
    }

    async fn get_latest(
        &self,
        ctx: &OpContext,
        entity_key: &EntityKey,
    ) -> Result<Option<TelemetryRecord>, CacheError> {
        let key = latest_key(entity_key);
        ctx.run(self.get_json(&key), |reason| {
            CacheError::cancelled("get_latest", key.clone(), reason)
        })
        .await
    }

    async fn set_asset_snapshot(
        &self,
        ctx: &OpContext,
        asset_id: &str,
        asset: &AssetMetadata,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let key = asset_key(asset_id);
        ctx.run(self.put_json(&key, asset, ttl), |reason| {
            CacheError::cancelled("set_asset_snapshot", key.clone(), reason)
        })
        .await
    }

    async fn get_asset_snapshot(
        &self,
        ctx: &OpContext,
        asset_id: &str,
    ) -> Result<Option<AssetMetadata>, CacheError> {
        let key = asset_key(asset_id);
        ctx.run(self.get_json(&key), |reason| {
            CacheError::cancelled("get_asset_snapshot", key.clone(), reason)
        })
        .await
    }

    async fn publish(
        &self,
        ctx: &OpContext,
        channel: &str,
        record: &TelemetryRecord,
    ) -> Result<(), CacheError> {
        ctx.run(
            async {
                let data =
                    serde_json::to_string(record).map_err(|err| CacheError::codec(channel, err))?;
                let mut connection = self.manager.clone();
                connection.publish::<_, _, ()>(channel, data).await?;
                Ok(())
            },
            |reason| CacheError::cancelled("publish", channel, reason),
        )
        .await
    }

    async fn subscribe(
        &self,
        ctx: &OpContext,
        channel: &str,
    ) -> Result<TelemetrySubscription, CacheError> {
        let pubsub = ctx
            .run(
                async {
                    let mut pubsub = self.client.get_async_pubsub().await?;
                    pubsub.subscribe(channel).await?;
                    Ok(pubsub)
                },
                |reason| CacheError::cancelled("subscribe", channel, reason),
            )
            .await?;
        let (tx, rx) = mpsc::channel(self.subscriber_buffer);
        let channel_name = channel.to_string();
        tokio::spawn(async move {
            let mut messages = std::pin::pin!(pubsub.into_on_message());
            loop {
                let message = tokio::select! {
                    _ = tx.closed() => break,
                    message = messages.next() => match message {
                        Some(message) => message,
                        None => break,
                    },
                };
                let payload: String = match message.get_payload() {
                    Ok(payload) => payload,
                    Err(err) => {
                        tracing::warn!(channel = %channel_name, error = %err, "pubsub payload unreadable");
                        continue;
                    }
                };
                let record: TelemetryRecord = match serde_json::from_str(&payload) {
                    Ok(record) => record,
                    Err(err) => {
                        tracing::warn!(channel = %channel_name, error = %err, "pubsub payload malformed");
                        continue;
                    }
                };
                if let Err(mpsc::error::TrySendError::Full(_)) = tx.try_send(record) {
                    tracing::debug!(channel = %channel_name, "subscriber lagging, message dropped");
                }
            }
            tracing::debug!(channel = %channel_name, "subscription closed");
        });
        Ok(TelemetrySubscription::new(rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_is_at_least_one_second() {
        assert_eq!(ttl_seconds(Duration::from_millis(10)), 1);
        assert_eq!(ttl_seconds(Duration::from_secs(300)), 300);
        assert_eq!(ttl_seconds(Duration::MAX), MAX_TTL_SECONDS);
    }
}
