mod helpers;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use circlecache_core::{
    ConnectionState, LatLng, LocationTag, SessionGateway, Tracker, TrackerError,
};

use helpers::{config, member, FakeGateway, FakeOracle};

fn two_circles() -> FakeGateway {
    FakeGateway::new(vec![
        ("c1", vec![member("Jane Doe", 40.0, -73.0), member("John Doe", 40.1, -73.1)]),
        ("c2", vec![member("Alex Kim", 41.0, -74.0)]),
    ])
}

async fn connect(gateway: Arc<FakeGateway>, oracle: FakeOracle) -> Tracker {
    Tracker::connect(config(), gateway, Arc::new(oracle)).await
}

/// Tracker with auto refresh on, sharing `gateway` with the test
async fn looping_tracker(gateway: &Arc<FakeGateway>, interval_secs: u64) -> Tracker {
    let shared: Arc<dyn SessionGateway> = gateway.clone();
    let config = config()
        .with_auto_refresh(true)
        .with_refresh_interval_secs(interval_secs);
    Tracker::connect(config, shared, Arc::new(FakeOracle::empty())).await
}

// ============================================================================
// Construction and refresh
// ============================================================================

#[tokio::test]
async fn first_load_lists_members_in_circle_order() {
    let gateway = Arc::new(two_circles());
    let tracker = connect(Arc::clone(&gateway), FakeOracle::empty()).await;

    assert_eq!(tracker.state(), ConnectionState::Connected);
    assert!(tracker.is_logged_in());
    assert_eq!(tracker.circle_count(), 2);
    assert_eq!(
        tracker.list_all_members(),
        vec!["Jane Doe", "John Doe", "Alex Kim"]
    );
    assert_eq!(gateway.fetch_count(), 2);
    assert!(tracker.snapshot().refreshed_at.is_some());
}

#[tokio::test]
async fn refresh_twice_with_same_data_is_idempotent() {
    let gateway = Arc::new(two_circles());
    let tracker = connect(Arc::clone(&gateway), FakeOracle::empty()).await;

    let before = tracker.snapshot().circles.clone();
    let report = tracker.refresh_all().await;
    let after = tracker.snapshot().circles.clone();

    assert_eq!(report.updated, 2);
    assert!(report.failed.is_empty());
    assert_eq!(before, after);
}

#[tokio::test]
async fn failing_circle_keeps_previous_members() {
    let gateway = Arc::new(two_circles());
    let tracker = connect(Arc::clone(&gateway), FakeOracle::empty()).await;

    gateway.set_members("c1", Some(vec![member("Jane Doe", 42.0, -75.0)]));
    gateway.set_members("c2", None);
    let report = tracker.refresh_all().await;

    assert_eq!(report.updated, 1);
    assert_eq!(report.failed, vec!["c2".to_string()]);
    assert_eq!(tracker.list_all_members(), vec!["Jane Doe", "Alex Kim"]);

    let jane = tracker.find_members_by_name(&["jane"]);
    assert_eq!(jane[0].lat_lng, LatLng::new(42.0, -75.0));
}

#[tokio::test]
async fn empty_member_list_counts_as_no_update() {
    let gateway = Arc::new(two_circles());
    let tracker = connect(Arc::clone(&gateway), FakeOracle::empty()).await;

    gateway.set_members("c2", Some(vec![]));
    let report = tracker.refresh_all().await;

    assert_eq!(report.failed, vec!["c2".to_string()]);
    assert_eq!(tracker.list_all_members().len(), 3);
}

#[tokio::test]
async fn rejected_login_degrades_to_empty_snapshot() {
    let gateway = Arc::new(FakeGateway::rejecting_login());
    let tracker = connect(Arc::clone(&gateway), FakeOracle::empty()).await;

    assert_eq!(tracker.state(), ConnectionState::NotLoggedIn);
    assert!(!tracker.is_logged_in());
    assert!(!tracker.is_connected());
    assert_eq!(tracker.circle_count(), 0);
    assert!(tracker.list_all_members().is_empty());
    assert!(tracker.find_members_by_name(&["anyone"]).is_empty());
    assert_eq!(gateway.fetch_count(), 0);

    let distances = tracker.distance_between_users::<&str>(&[]).await;
    assert_eq!(distances, Ok(vec![]));
}

#[tokio::test]
async fn failed_circle_list_is_not_connected() {
    let gateway = Arc::new(FakeGateway::failing_circle_list());
    let tracker = connect(gateway, FakeOracle::empty()).await;

    assert_eq!(tracker.state(), ConnectionState::NotConnected);
    assert!(tracker.is_logged_in());
    assert!(!tracker.is_connected());
    assert!(tracker.circles().is_empty());
}

// ============================================================================
// Lookup
// ============================================================================

#[tokio::test]
async fn name_lookup_is_case_insensitive_substring() {
    let gateway = Arc::new(two_circles());
    let tracker = connect(gateway, FakeOracle::empty()).await;

    for query in ["jane", "DOE", "ane do"] {
        let found = tracker.find_members_by_name(&[query]);
        assert!(
            found.iter().any(|m| m.name == "Jane Doe"),
            "query {query:?} should match Jane Doe"
        );
    }
}

#[tokio::test]
async fn overlapping_queries_return_each_member_once() {
    let gateway = Arc::new(two_circles());
    let tracker = connect(gateway, FakeOracle::empty()).await;

    let found = tracker.find_members_by_name(&["jane", "JANE", "doe"]);
    let names: Vec<&str> = found.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Jane Doe", "John Doe"]);
}

#[tokio::test]
async fn find_by_email_ignores_case() {
    let gateway = Arc::new(two_circles());
    let tracker = connect(gateway, FakeOracle::empty()).await;

    let found = tracker.find_member_by_email("ALEX.KIM@example.com");
    assert_eq!(found.map(|m| m.name), Some("Alex Kim".to_string()));
    assert!(tracker.find_member_by_email("nobody@example.com").is_none());
}

#[tokio::test]
async fn current_location_returns_tags() {
    let gateway = Arc::new(two_circles());
    let tracker = connect(gateway, FakeOracle::empty()).await;

    let tags = tracker.current_location(&["alex"]);
    assert_eq!(
        tags,
        vec![LocationTag {
            name: "Alex Kim".to_string(),
            address: "1 Main St".to_string(),
            since: "Mon Oct 19 12:00:00 2026".to_string(),
        }]
    );
}

#[tokio::test]
async fn movement_detected_from_since_change() {
    let gateway = Arc::new(two_circles());
    let tracker = connect(Arc::clone(&gateway), FakeOracle::empty()).await;

    let tags = tracker.current_location(&["Jane Doe", "Alex Kim"]);

    let mut moved_jane = member("Jane Doe", 40.0, -73.0);
    moved_jane.since = "Mon Oct 19 12:05:00 2026".to_string();
    gateway.set_members("c1", Some(vec![moved_jane, member("John Doe", 40.1, -73.1)]));
    tracker.refresh_all().await;

    let movements = tracker.has_member_moved(&tags).expect("all tagged members present");
    assert_eq!(movements.len(), 2);
    assert_eq!(movements[0].name, "Jane Doe");
    assert!(movements[0].moved);
    assert_eq!(movements[1].name, "Alex Kim");
    assert!(!movements[1].moved);
}

#[tokio::test]
async fn movement_for_vanished_member_is_not_found() {
    let gateway = Arc::new(two_circles());
    let tracker = connect(Arc::clone(&gateway), FakeOracle::empty()).await;

    let tags = tracker.current_location(&["Alex Kim"]);
    gateway.set_members("c2", Some(vec![member("Sam Lee", 0.0, 0.0)]));
    tracker.refresh_all().await;

    assert_eq!(
        tracker.has_member_moved(&tags),
        Err(TrackerError::MemberNotFound("Alex Kim".to_string()))
    );
}

// ============================================================================
// Distances
// ============================================================================

#[tokio::test]
async fn distance_between_two_members() {
    let gateway = Arc::new(FakeGateway::new(vec![(
        "c1",
        vec![member("memberA", 40.0, -73.0), member("memberB", 40.1, -73.1)],
    )]));
    let oracle = FakeOracle::new(&[((40.0, -73.0), (40.1, -73.1), "5 mi")]);
    let tracker = connect(gateway, oracle).await;

    let distances = tracker
        .distance_between_users(&["memberA", "memberB"])
        .await
        .expect("both members present");

    assert_eq!(distances.len(), 1);
    assert_eq!(distances[0].from, "memberA");
    assert_eq!(distances[0].to, "memberB");
    assert_eq!(distances[0].distance, 5.0);
}

#[tokio::test]
async fn distance_pairs_keep_generation_order() {
    let gateway = Arc::new(FakeGateway::new(vec![(
        "c1",
        vec![member("A", 1.0, 1.0), member("B", 2.0, 2.0), member("C", 3.0, 3.0)],
    )]));
    // (A,B) answers slowest, (B,C) fastest
    let oracle = FakeOracle::new(&[
        ((1.0, 1.0), (2.0, 2.0), "10 mi"),
        ((1.0, 1.0), (3.0, 3.0), "20 mi"),
        ((2.0, 2.0), (3.0, 3.0), "30 mi"),
    ])
    .with_delay_ms(50);
    let tracker = connect(gateway, oracle).await;

    let distances = tracker
        .distance_between_users(&["A", "B", "C"])
        .await
        .expect("all members present");

    let pairs: Vec<(&str, &str, f64)> = distances
        .iter()
        .map(|d| (d.from.as_str(), d.to.as_str(), d.distance))
        .collect();
    assert_eq!(
        pairs,
        vec![("A", "B", 10.0), ("A", "C", 20.0), ("B", "C", 30.0)]
    );
}

#[tokio::test]
async fn unparsable_oracle_payload_yields_zero_for_that_pair() {
    let gateway = Arc::new(FakeGateway::new(vec![(
        "c1",
        vec![member("A", 1.0, 1.0), member("B", 2.0, 2.0), member("C", 3.0, 3.0)],
    )]));
    let oracle = FakeOracle::new(&[
        ((1.0, 1.0), (2.0, 2.0), "10 mi"),
        ((1.0, 1.0), (3.0, 3.0), "no route"),
        ((2.0, 2.0), (3.0, 3.0), "30 mi"),
    ]);
    let tracker = connect(gateway, oracle).await;

    let distances = tracker
        .distance_between_users(&["A", "B", "C"])
        .await
        .expect("all members present");
    let values: Vec<f64> = distances.iter().map(|d| d.distance).collect();
    assert_eq!(values, vec![10.0, 0.0, 30.0]);
}

#[tokio::test]
async fn distance_with_unknown_member_is_not_found() {
    let gateway = Arc::new(two_circles());
    let oracle = FakeOracle::empty();
    let calls = Arc::clone(&oracle.calls);
    let tracker = connect(gateway, oracle).await;

    let result = tracker.distance_between_users(&["jane", "ghost"]).await;
    assert_eq!(result, Err(TrackerError::MemberNotFound("ghost".to_string())));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn distance_from_point_follows_query_order() {
    let gateway = Arc::new(two_circles());
    let oracle = FakeOracle::new(&[
        ((40.0, -73.0), (40.5, -73.5), "7 mi"),
        ((41.0, -74.0), (40.5, -73.5), "3 mi"),
    ])
    .with_delay_ms(40);
    let tracker = connect(gateway, oracle).await;

    let distances = tracker
        .distance_from_lat_lng(&["alex", "jane"], LatLng::new(40.5, -73.5))
        .await
        .expect("members present");

    let pairs: Vec<(&str, f64)> = distances
        .iter()
        .map(|d| (d.name.as_str(), d.distance))
        .collect();
    assert_eq!(pairs, vec![("Alex Kim", 3.0), ("Jane Doe", 7.0)]);
}

// ============================================================================
// Background refresh loop
// ============================================================================

#[tokio::test(start_paused = true)]
async fn background_loop_refreshes_until_shutdown() {
    let gateway = Arc::new(FakeGateway::new(vec![("c1", vec![member("Jane Doe", 1.0, 1.0)])]));
    let mut tracker = looping_tracker(&gateway, 10).await;
    assert!(!tracker.is_running());
    let after_connect = gateway.fetch_count();

    assert!(tracker.start());
    assert!(tracker.start(), "second start keeps the single running loop");

    gateway.set_members("c1", Some(vec![member("Jane Moved", 2.0, 2.0)]));
    tokio::time::sleep(Duration::from_secs(25)).await;

    assert!(gateway.fetch_count() >= after_connect + 2);
    assert_eq!(tracker.list_all_members(), vec!["Jane Moved"]);

    tracker.shutdown().await;
    assert!(!tracker.is_running());

    let stopped_at = gateway.fetch_count();
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(gateway.fetch_count(), stopped_at);
}

#[tokio::test(start_paused = true)]
async fn restart_after_stop_runs_a_single_loop() {
    let gateway = Arc::new(FakeGateway::new(vec![("c1", vec![member("Jane Doe", 1.0, 1.0)])]));
    let mut tracker = looping_tracker(&gateway, 10).await;

    assert!(tracker.start());
    tokio::time::sleep(Duration::from_secs(1)).await;
    tracker.stop();
    assert!(!tracker.is_running());
    assert!(tracker.start());
    assert!(tracker.is_running());

    let restarted_at = gateway.fetch_count();
    tokio::time::sleep(Duration::from_secs(100)).await;
    let fetched = gateway.fetch_count() - restarted_at;
    assert!(
        (9..=11).contains(&fetched),
        "one loop at a 10s interval fetches about 10 times in 100s, got {}",
        fetched
    );

    tracker.shutdown().await;
    let stopped_at = gateway.fetch_count();
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(gateway.fetch_count(), stopped_at);
}

#[tokio::test(start_paused = true)]
async fn manual_refresh_waits_for_background_pass() {
    let gateway = Arc::new(two_circles().with_fetch_delay_ms(3_000));
    let mut tracker = looping_tracker(&gateway, 10).await;

    assert!(tracker.start());
    tokio::task::yield_now().await;

    let report = tracker.refresh_all().await;
    assert_eq!(report.updated, 2);
    assert!(report.failed.is_empty());
    assert_eq!(gateway.max_in_flight(), 1, "refresh passes overlapped");

    tracker.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn dropping_tracker_ends_background_loop() {
    let gateway = Arc::new(FakeGateway::new(vec![("c1", vec![member("Jane Doe", 1.0, 1.0)])]));
    let mut tracker = looping_tracker(&gateway, 10).await;
    assert!(tracker.start());
    tokio::time::sleep(Duration::from_secs(1)).await;

    drop(tracker);
    tokio::task::yield_now().await;
    let dropped_at = gateway.fetch_count();
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(gateway.fetch_count(), dropped_at);
}

#[tokio::test]
async fn start_without_auto_refresh_does_nothing() {
    let gateway = Arc::new(two_circles());
    let mut tracker = connect(Arc::clone(&gateway), FakeOracle::empty()).await;

    assert!(!tracker.start());
    assert!(!tracker.is_running());
    tracker.shutdown().await;
    assert_eq!(gateway.fetch_count(), 2);
}
