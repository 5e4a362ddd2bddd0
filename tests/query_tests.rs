use saferide::error::RedeemError;
use saferide::query::{self, UNKNOWN_STATUS};
use saferide::store::{InMemoryStore, StateStore};

#[tokio::test]
async fn test_unknown_vehicle_status() {
    let store = InMemoryStore::new();
    let status = query::vehicle_status(&store, "ghost").await.unwrap();

    assert_eq!(status.latest, None);
    assert_eq!(status.driver_status, UNKNOWN_STATUS);
    assert_eq!(status.vehicle_status, UNKNOWN_STATUS);
    assert!(query::history(&store, "ghost").await.unwrap().is_empty());
    assert!(query::alerts(&store, "ghost").await.unwrap().is_empty());
    assert_eq!(query::points(&store, "ghost").await.unwrap(), 0);
}

#[tokio::test]
async fn test_corrupt_snapshots_are_skipped() {
    let store = InMemoryStore::new();
    store.rpush("history:car-1", "not json".into()).await.unwrap();
    store
        .rpush(
            "history:car-1",
            r#"{"vehicle_id":"car-1","status":"safe","source":"ai","timestamp":5,"heart_rate":70,"lat":0.0,"long":0.0,"confidence":0.5}"#.into(),
        )
        .await
        .unwrap();

    let history = query::history(&store, "car-1").await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].timestamp, 5);
}

#[tokio::test]
async fn test_redeem_happy_path() {
    let store = InMemoryStore::new();
    store.set("points:car-1", "30".into(), None).await.unwrap();

    assert_eq!(query::redeem_points(&store, "car-1", 25).await.unwrap(), 5);
    assert_eq!(query::points(&store, "car-1").await.unwrap(), 5);

    // Exact balance is fine.
    assert_eq!(query::redeem_points(&store, "car-1", 5).await.unwrap(), 0);
}

#[tokio::test]
async fn test_redeem_rejections() {
    let store = InMemoryStore::new();

    assert!(matches!(
        query::redeem_points(&store, "car-1", 10).await,
        Err(RedeemError::NoBalance)
    ));

    store.set("points:car-1", "10".into(), None).await.unwrap();
    assert!(matches!(
        query::redeem_points(&store, "car-1", 0).await,
        Err(RedeemError::InvalidAmount(0))
    ));
    assert!(matches!(
        query::redeem_points(&store, "car-1", -5).await,
        Err(RedeemError::InvalidAmount(-5))
    ));
    assert!(matches!(
        query::redeem_points(&store, "car-1", 11).await,
        Err(RedeemError::Insufficient { available: 10, requested: 11 })
    ));

    assert_eq!(query::points(&store, "car-1").await.unwrap(), 10, "Rejections leave the balance alone");
}

#[tokio::test]
async fn test_concurrent_redemptions_never_overdraw() {
    let store = std::sync::Arc::new(InMemoryStore::new());
    store.set("points:car-1", "10".into(), None).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..5 {
        let store = store.clone();
        handles.push(tokio::spawn(async move { query::redeem_points(&*store, "car-1", 7).await }));
    }

    let mut ok = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            ok += 1;
        }
    }

    assert_eq!(ok, 1);
    assert_eq!(query::points(&*store, "car-1").await.unwrap(), 3);
}
