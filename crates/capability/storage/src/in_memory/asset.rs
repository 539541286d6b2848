//! 资产登记表内存实现

use crate::context::OpContext;
use crate::error::RegistryError;
use crate::traits::AssetRegistry;
use domain::AssetMetadata;
use std::collections::HashMap;
use std::sync::RwLock;

/// 资产内存存储
pub struct InMemoryAssetRegistry {
    assets: RwLock<HashMap<String, AssetMetadata>>,
}

impl Default for InMemoryAssetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAssetRegistry {
    pub fn new() -> Self {
        Self {
            assets: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.assets.read().map(|assets| assets.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl AssetRegistry for InMemoryAssetRegistry {
    async fn upsert_asset(
        &self,
        ctx: &OpContext,
        asset: &AssetMetadata,
    ) -> Result<(), RegistryError> {
        ctx.run(
            async {
                let mut assets = self
                    .assets
                    .write()
                    .map_err(|_| RegistryError::backend("upsert_asset", "lock failed"))?;
                let mut stored = asset.clone();
                if let Some(existing) = assets.get(&asset.id) {
                    stored.created_at = existing.created_at;
                }
                assets.insert(stored.id.clone(), stored);
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
        ctx.run(
            async {
                let assets = self
                    .assets
                    .read()
                    .map_err(|_| RegistryError::backend("find_asset", "lock failed"))?;
                Ok(assets.get(asset_id).cloned())
            },
            |reason| RegistryError::Cancelled {
                op: "find_asset",
                reason,
            },
        )
        .await
    }

    async fn list_assets(&self, ctx: &OpContext) -> Result<Vec<AssetMetadata>, RegistryError> {
        ctx.run(
            async {
                let assets = self
                    .assets
                    .read()
                    .map_err(|_| RegistryError::backend("list_assets", "lock failed"))?;
                let mut items: Vec<AssetMetadata> = assets.values().cloned().collect();
                items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
                Ok(items)
            },
            |reason| RegistryError::Cancelled {
                op: "list_assets",
                reason,
            },
        )
        .await
    }
}
