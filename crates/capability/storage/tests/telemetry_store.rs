use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use domain::{EntityKey, TelemetryRecord, TimeWindow, quality};
use ems_storage::{
    InMemoryTelemetryStore, MAX_RANGE_ROWS, OpContext, StoreError, TelemetryStore,
};
use std::time::Duration;

fn record_at(key: &EntityKey, minute: i64, value: f64) -> TelemetryRecord {
    let base = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
    TelemetryRecord::new(
        key.clone(),
        value,
        "т/час",
        base + ChronoDuration::minutes(minute),
        quality::GOOD,
        vec![],
    )
    .expect("record")
}

fn full_day() -> TimeWindow {
    let start = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
    TimeWindow::new(start, start + ChronoDuration::days(1)).expect("window")
}

#[tokio::test]
async fn range_is_descending_and_scoped_to_key() {
    let store = InMemoryTelemetryStore::new();
    let ctx = OpContext::new();
    let a = EntityKey::sensor("sensor-a").expect("key");
    let b = EntityKey::company_product("c-1", "Полиэтилен").expect("key");

    for minute in [5, 1, 3] {
        store
            .append(&ctx, &record_at(&a, minute, minute as f64))
            .await
            .expect("append");
    }
    store.append(&ctx, &record_at(&b, 2, 9.0)).await.expect("append");

    let rows = store.query_range(&ctx, &a, full_day()).await.expect("query");
    let values: Vec<f64> = rows.iter().map(|r| r.value).collect();
    assert_eq!(values, vec![5.0, 3.0, 1.0]);
    assert!(rows.iter().all(|r| r.entity_key == a));
    assert_eq!(store.count_for(&b), 1);
}

#[tokio::test]
async fn window_bounds_are_inclusive() {
    let store = InMemoryTelemetryStore::new();
    let ctx = OpContext::new();
    let key = EntityKey::sensor("sensor-a").expect("key");
    for minute in [0, 10, 20] {
        store
            .append(&ctx, &record_at(&key, minute, minute as f64))
            .await
            .expect("append");
    }
    let start = record_at(&key, 0, 0.0).timestamp;
    let end = record_at(&key, 10, 0.0).timestamp;
    let window = TimeWindow::new(start, end).expect("window");
    let rows = store.query_range(&ctx, &key, window).await.expect("query");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].timestamp, end);
    assert_eq!(rows[1].timestamp, start);
}

#[tokio::test]
async fn range_is_capped() {
    let store = InMemoryTelemetryStore::new();
    let ctx = OpContext::new();
    let key = EntityKey::sensor("dense").expect("key");
    for second in 0..(MAX_RANGE_ROWS as i64 + 200) {
        let mut record = record_at(&key, 0, second as f64);
        record.timestamp += ChronoDuration::seconds(second);
        store.append(&ctx, &record).await.expect("append");
    }
    let rows = store.query_range(&ctx, &key, full_day()).await.expect("query");
    assert_eq!(rows.len(), MAX_RANGE_ROWS);
    assert_eq!(rows[0].value, (MAX_RANGE_ROWS + 199) as f64);
}

#[tokio::test]
async fn unknown_key_yields_empty_result() {
    let store = InMemoryTelemetryStore::new();
    let ctx = OpContext::new();
    let key = EntityKey::sensor("nobody").expect("key");
    let rows = store.query_range(&ctx, &key, full_day()).await.expect("query");
    assert!(rows.is_empty());
}

#[tokio::test]
async fn outage_surfaces_backend_error() {
    let store = InMemoryTelemetryStore::new();
    let ctx = OpContext::new();
    let key = EntityKey::sensor("sensor-a").expect("key");
    store.set_available(false);
    let err = store
        .append(&ctx, &record_at(&key, 0, 1.0))
        .await
        .expect_err("unavailable");
    assert!(matches!(err, StoreError::Backend { op: "append", .. }));
    assert!(store.is_empty());
}

#[tokio::test(start_paused = true)]
async fn deadline_cancels_slow_append_without_partial_write() {
    let store = InMemoryTelemetryStore::new().with_latency(Duration::from_secs(2));
    let ctx = OpContext::with_timeout(Duration::from_millis(100));
    let key = EntityKey::sensor("sensor-a").expect("key");
    let err = store
        .append(&ctx, &record_at(&key, 0, 1.0))
        .await
        .expect_err("deadline");
    assert!(err.is_cancelled());
    assert_eq!(store.count_for(&key), 0);
}
