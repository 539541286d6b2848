use chrono::Utc;
use domain::{AssetMetadata, AssetRuleTable, EntityKey, SensorDescriptor};
use ems_pipeline::{AssetService, InitializeReport, ServiceError};
use ems_storage::{
    AssetRegistry, CacheStore, InMemoryAssetRegistry, InMemoryCacheStore, OpContext,
    RegistryError,
};
use std::sync::Arc;
use std::time::Duration;

fn sensor(id: &str, description: &str) -> SensorDescriptor {
    SensorDescriptor {
        id: id.to_string(),
        description: description.to_string(),
    }
}

fn service_with(
    registry: Arc<dyn AssetRegistry>,
    cache: Arc<InMemoryCacheStore>,
) -> AssetService {
    AssetService::new(
        registry,
        cache,
        AssetRuleTable::default(),
        Duration::from_secs(3600),
    )
}

fn manual_asset(id: &str) -> AssetMetadata {
    let now = Utc::now();
    AssetMetadata {
        id: id.to_string(),
        name: "Резервуарный парк".to_string(),
        asset_type: "storage".to_string(),
        location: "Казань".to_string(),
        status: "active".to_string(),
        specifications: serde_json::Map::new(),
        entity_keys: vec![],
        created_at: now,
        updated_at: now,
    }
}

/// 所有写入都失败的登记表。
struct BrokenRegistry;

#[async_trait::async_trait]
impl AssetRegistry for BrokenRegistry {
    async fn upsert_asset(
        &self,
        _ctx: &OpContext,
        _asset: &AssetMetadata,
    ) -> Result<(), RegistryError> {
        Err(RegistryError::backend("upsert_asset", "disk full"))
    }

    async fn find_asset(
        &self,
        _ctx: &OpContext,
        _asset_id: &str,
    ) -> Result<Option<AssetMetadata>, RegistryError> {
        Ok(None)
    }

    async fn list_assets(&self, _ctx: &OpContext) -> Result<Vec<AssetMetadata>, RegistryError> {
        Ok(vec![])
    }
}

#[tokio::test]
async fn sensors_sharing_an_asset_are_grouped() {
    let registry = Arc::new(InMemoryAssetRegistry::new());
    let cache = Arc::new(InMemoryCacheStore::new());
    let service = service_with(registry.clone(), cache.clone());
    let ctx = OpContext::new();

    let report = service
        .initialize_from_sensors(
            &ctx,
            &[
                sensor("s-1", "СИБУР Тобольск Реактор полимеризации"),
                sensor("s-2", "СИБУР Тобольск Линия грануляции"),
                sensor("s-3", "Ставролен Силос 4"),
                sensor("s-4", "Неизвестный объект"),
            ],
        )
        .await;

    assert_eq!(
        report,
        InitializeReport {
            created: vec![
                "СИБУР Холдинг_Тюменская обл.".to_string(),
                "Ставролен_Ставропольский край".to_string(),
            ],
            failed: vec![],
            unclassified: vec!["s-4".to_string()],
        }
    );

    let sibur = service
        .get_asset(&ctx, "СИБУР Холдинг_Тюменская обл.")
        .await
        .expect("get")
        .expect("asset");
    assert_eq!(sibur.name, "СИБУР Холдинг - Тюменская обл.");
    assert_eq!(
        sibur.entity_keys,
        vec![
            EntityKey::sensor("s-1").expect("key"),
            EntityKey::sensor("s-2").expect("key"),
        ]
    );
    assert_eq!(sibur.specifications["equipment"], "Реактор");
    assert_eq!(sibur.specifications["products"][0], "Полипропилен");
    assert_eq!(registry.len(), 2);
}

#[tokio::test]
async fn get_asset_reads_through_and_caches() {
    let registry = Arc::new(InMemoryAssetRegistry::new());
    let cache = Arc::new(InMemoryCacheStore::new());
    let service = service_with(registry.clone(), cache.clone());
    let ctx = OpContext::new();

    registry.upsert_asset(&ctx, &manual_asset("tank-1")).await.expect("upsert");
    assert!(cache.get_asset_snapshot(&ctx, "tank-1").await.expect("cache").is_none());

    let asset = service.get_asset(&ctx, "tank-1").await.expect("get").expect("asset");
    assert_eq!(asset.id, "tank-1");
    let cached = cache.get_asset_snapshot(&ctx, "tank-1").await.expect("cache");
    assert_eq!(cached, Some(asset));

    assert!(service.get_asset(&ctx, "ghost").await.expect("get").is_none());
}

#[tokio::test]
async fn create_asset_survives_cache_outage() {
    let registry = Arc::new(InMemoryAssetRegistry::new());
    let cache = Arc::new(InMemoryCacheStore::new());
    cache.set_available(false);
    let service = service_with(registry.clone(), cache);
    let ctx = OpContext::new();

    service.create_asset(&ctx, manual_asset("tank-1")).await.expect("create");
    let listed = service.list_assets(&ctx).await.expect("list");
    assert_eq!(listed.len(), 1);
    assert!(service.get_asset(&ctx, "tank-1").await.expect("get").is_some());
}

#[tokio::test]
async fn registry_failure_is_fatal_for_create_but_skipped_on_initialize() {
    let cache = Arc::new(InMemoryCacheStore::new());
    let service = service_with(Arc::new(BrokenRegistry), cache);
    let ctx = OpContext::new();

    let err = service
        .create_asset(&ctx, manual_asset("tank-1"))
        .await
        .expect_err("registry down");
    assert!(matches!(err, ServiceError::Registry(_)));

    let report = service
        .initialize_from_sensors(&ctx, &[sensor("s-1", "Кемеровский КХЗ Батарея 2")])
        .await;
    assert!(report.created.is_empty());
    assert_eq!(report.failed, vec!["Кемеровский КХЗ_Кемеровская обл.".to_string()]);
}

#[tokio::test]
async fn recreated_asset_keeps_registry_creation_time() {
    let registry = Arc::new(InMemoryAssetRegistry::new());
    let cache = Arc::new(InMemoryCacheStore::new());
    let service = service_with(registry.clone(), cache.clone());
    let ctx = OpContext::new();

    let mut first = manual_asset("a-1");
    first.created_at = Utc::now() - chrono::Duration::days(30);
    first.updated_at = first.created_at;
    service.create_asset(&ctx, first.clone()).await.expect("create");

    let mut second = manual_asset("a-1");
    second.name = "Резервуарный парк 2".to_string();
    let returned = service.create_asset(&ctx, second).await.expect("recreate");

    let stored = registry
        .find_asset(&ctx, "a-1")
        .await
        .expect("find")
        .expect("asset");
    assert_eq!(stored.created_at, first.created_at);
    assert_eq!(returned, stored);
    let served = service.get_asset(&ctx, "a-1").await.expect("get").expect("asset");
    assert_eq!(served, stored);
    let snapshot = cache
        .get_asset_snapshot(&ctx, "a-1")
        .await
        .expect("snapshot")
        .expect("cached");
    assert_eq!(snapshot.created_at, first.created_at);
    assert_eq!(snapshot.name, "Резервуарный парк 2");
}
