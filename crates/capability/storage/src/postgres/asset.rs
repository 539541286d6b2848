//! Postgres 资产登记表实现

use crate::context::OpContext;
use crate::error::RegistryError;
use crate::traits::AssetRegistry;
use domain::{AssetMetadata, EntityKey};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};

pub struct PgAssetRegistry {
    pool: PgPool,
}

impl PgAssetRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SELECT_COLUMNS: &str = "select id, name, type, location, status, specifications, entity_keys, \
     created_at, updated_at from assets";

fn decode_asset(row: &PgRow) -> Result<AssetMetadata, sqlx::Error> {
    let specifications: Json<serde_json::Map<String, serde_json::Value>> =
        row.try_get("specifications")?;
    let entity_keys: Json<Vec<EntityKey>> = row.try_get("entity_keys")?;
    Ok(AssetMetadata {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        asset_type: row.try_get("type")?,
        location: row.try_get("location")?,
        status: row.try_get("status")?,
        specifications: specifications.0,
        entity_keys: entity_keys.0,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait::async_trait]
impl AssetRegistry for PgAssetRegistry {
    async fn upsert_asset(
        &self,
        ctx: &OpContext,
        asset: &AssetMetadata,
    ) -> Result<(), RegistryError> {
        let query = sqlx::query(
            "insert into assets (id, name, type, location, status, specifications, entity_keys, created_at, updated_at) \
             values ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             on conflict (id) do update set \
               name = excluded.name, \
               type = excluded.type, \
               location = excluded.location, \
               status = excluded.status, \
               specifications = excluded.specifications, \
               entity_keys = excluded.entity_keys, \
               updated_at = excluded.updated_at",
        )
        .bind(&asset.id)
        .bind(&asset.name)
        .bind(&asset.asset_type)
        .bind(&asset.location)
        .bind(&asset.status)
        .bind(Json(&asset.specifications))
        .bind(Json(&asset.entity_keys))
        .bind(asset.created_at)
        .bind(asset.updated_at);
        ctx.run(
            async {
                query
                    .execute(&self.pool)
                    .await
                    .map_err(|err| RegistryError::backend("upsert_asset", err))?;
                Ok(())
            },
            |reason| RegistryError::Cancelled {
                op: "upsert_asset",
                reason,
            },
        )
        .await
    }

    async fn find_asset(
        &self,
        ctx: &OpContext,
        asset_id: &str,
    ) -> Result<Option<AssetMetadata>, RegistryError> {
        let sql = format!("{SELECT_COLUMNS} where id = $1");
        ctx.run(
            async {
                let row = sqlx::query(&sql)
                    .bind(asset_id)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(|err| RegistryError::backend("find_asset", err))?;
                row.as_ref()
                    .map(decode_asset)
                    .transpose()
                    .map_err(|err| RegistryError::backend("find_asset", err))
            },
            |reason| RegistryError::Cancelled {
                op: "find_asset",
                reason,
            },
        )
        .await
    }

    async fn list_assets(&self, ctx: &OpContext) -> Result<Vec<AssetMetadata>, RegistryError> {
        let sql = format!("{SELECT_COLUMNS} order by created_at desc");
        ctx.run(
            async {
                let rows = sqlx::query(&sql)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(|err| RegistryError::backend("list_assets", err))?;
                rows.iter()
                    .map(decode_asset)
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|err| RegistryError::backend("list_assets", err))
            },
            |reason| RegistryError::Cancelled {
                op: "list_assets",
                reason,
            },
        )
        .await
    }
}
