mod common;

use common::Harness;
use saferide::kernel::router::{Pipeline, Routed, VehicleRouter};
use saferide::query;
use std::sync::Arc;
use std::time::Duration;

const IDLE: Duration = Duration::from_secs(60);

fn router(h: &Harness, capacity: usize) -> VehicleRouter {
    let pipeline = Arc::new(Pipeline::new(h.engine.clone(), h.dispatcher.clone(), h.store.clone()));
    VehicleRouter::new(pipeline, capacity, IDLE)
}

#[tokio::test(start_paused = true)]
async fn test_idle_workers_are_reclaimed() {
    let h = Harness::new();
    let mut router = router(&h, 8);

    for i in 0..500 {
        let event = h.normalize(&format!("car-{}", i), "safe_vehicle", 70);
        assert_eq!(router.route(event), Routed::Queued);
    }
    assert_eq!(router.active_vehicles(), 500);

    tokio::time::sleep(IDLE + Duration::from_secs(1)).await;
    assert_eq!(router.running_workers(), 0, "Idle workers must exit");

    // A vehicle returning before the sweep replaces its closed worker.
    assert_eq!(router.route(h.normalize("car-0", "safe_vehicle", 70)), Routed::Queued);

    assert_eq!(router.reap(), 499);
    assert_eq!(router.active_vehicles(), 1);

    // A vehicle returning after the sweep gets a fresh worker; state lives in the store.
    assert_eq!(router.route(h.normalize("car-7", "safe_vehicle", 70)), Routed::Queued);
    assert!(router.shutdown(Duration::from_secs(5)).await);

    assert_eq!(h.get("safe_streak:car-0").await.as_deref(), Some("2"));
    assert_eq!(h.get("safe_streak:car-7").await.as_deref(), Some("2"));
    assert_eq!(query::history(&*h.store, "car-499").await.unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_busy_worker_is_not_reclaimed() {
    let h = Harness::new();
    let mut router = router(&h, 8);

    for _ in 0..5 {
        router.route(h.normalize("car-1", "safe_vehicle", 70));
        tokio::time::sleep(IDLE / 2).await;
    }
    assert_eq!(router.reap(), 0);
    assert_eq!(router.running_workers(), 1);

    assert!(router.shutdown(Duration::from_secs(5)).await);
    assert_eq!(h.get("safe_streak:car-1").await.as_deref(), Some("5"));
}

#[tokio::test]
async fn test_full_mailbox_drops_without_waiting() {
    let h = Harness::new();
    let mut router = router(&h, 2);

    // Nothing yields between routes, so the worker has not started yet.
    let outcomes: Vec<_> = (0..5)
        .map(|_| router.route(h.normalize("car-1", "safe", 70)))
        .collect();

    assert_eq!(outcomes.iter().filter(|o| **o == Routed::Queued).count(), 2);
    assert_eq!(outcomes.iter().filter(|o| **o == Routed::Dropped).count(), 3);

    assert!(router.shutdown(Duration::from_secs(5)).await);
    assert_eq!(query::history(&*h.store, "car-1").await.unwrap().len(), 2);
}
