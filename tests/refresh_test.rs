//! Reconciliation behavior of the sync pass against a mock bridge.

use hue_panel::bridge::mock::MockBridge;
use hue_panel::panel::session::{GroupSession, SharedSession, LAYOUT_RADIUS};
use hue_panel::sync::refresh;
use std::sync::{Arc, RwLock};

fn shared_session() -> SharedSession {
    let mut session = GroupSession::new("tester".into(), 7);
    session.set_dimensions(1920.0, 1080.0);
    Arc::new(RwLock::new(session))
}

async fn three_light_bridge() -> MockBridge {
    let bridge = MockBridge::new();
    bridge.put_light(1, "Desk", false).await;
    bridge.put_light(2, "Shelf", true).await;
    bridge.put_light(3, "Corner", false).await;
    bridge
}

#[tokio::test]
async fn first_refresh_builds_the_mapping() {
    let bridge = three_light_bridge().await;
    let session = shared_session();

    refresh(&session, &bridge).await;

    let s = session.read().unwrap();
    let mut ids: Vec<u32> = s.lights.keys().copied().collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2, 3]);

    assert_eq!(s.lights[&1].label, "Desk");
    assert!(!s.lights[&1].on);
    assert!(s.lights[&2].on);
    assert!(s.lights[&1].last_seen.is_some());

    // Aggregate is the OR: light 2 is on.
    assert!(s.aggregate.on);

    // Lights sit on the layout circle around the center.
    for light in s.lights.values() {
        let dx = light.x - 960.0;
        let dy = light.y - 540.0;
        assert!(((dx * dx + dy * dy).sqrt() - LAYOUT_RADIUS).abs() < 0.01);
    }

    assert!(s.bridge.is_some(), "bridge session must be kept for reuse");
}

#[tokio::test]
async fn identical_membership_updates_fields_in_place() {
    let bridge = three_light_bridge().await;
    let session = shared_session();

    refresh(&session, &bridge).await;
    let (pos_before, change_before) = {
        let s = session.read().unwrap();
        ((s.lights[&1].x, s.lights[&1].y), s.lights[&1].last_change)
    };

    // Rename a light; membership is unchanged.
    bridge.put_light(1, "Desk lamp", false).await;
    refresh(&session, &bridge).await;

    let s = session.read().unwrap();
    assert_eq!(s.lights[&1].label, "Desk lamp");
    assert_eq!((s.lights[&1].x, s.lights[&1].y), pos_before, "no re-layout");
    assert_eq!(
        s.lights[&1].last_change, change_before,
        "unchanged on-state must not move the change timestamp"
    );
}

#[tokio::test]
async fn membership_change_rebuilds_the_whole_mapping() {
    let bridge = three_light_bridge().await;
    let session = shared_session();

    refresh(&session, &bridge).await;
    let pos_before = {
        let s = session.read().unwrap();
        (s.lights[&2].x, s.lights[&2].y)
    };

    bridge.put_light(4, "New", false).await;
    refresh(&session, &bridge).await;

    let s = session.read().unwrap();
    let mut ids: Vec<u32> = s.lights.keys().copied().collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2, 3, 4]);

    // Four lights share the circle now: light 2 moved from the 120-degree
    // slot to the 90-degree slot.
    let pos_after = (s.lights[&2].x, s.lights[&2].y);
    assert_ne!(pos_before, pos_after, "layout must be recomputed");
}

#[tokio::test]
async fn removed_light_disappears_from_the_mapping() {
    let bridge = three_light_bridge().await;
    let session = shared_session();

    refresh(&session, &bridge).await;
    bridge.remove_light(2).await;
    refresh(&session, &bridge).await;

    let s = session.read().unwrap();
    let mut ids: Vec<u32> = s.lights.keys().copied().collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 3]);
    // Light 2 was the only one on; the aggregate follows.
    assert!(!s.aggregate.on);
}

#[tokio::test]
async fn failed_activation_flashes_the_aggregate_and_leaves_the_cache() {
    let bridge = MockBridge::new();
    bridge.put_light(1, "Desk", false).await;
    bridge.fail_connect(true).await;

    let session = shared_session();
    refresh(&session, &bridge).await;

    let s = session.read().unwrap();
    assert!(s.lights.is_empty(), "no mapping without a bridge session");
    assert!(s.bridge.is_none());
    assert!(s.aggregate.err, "error flash must be running");
    assert!(s.err_until.is_some());
}

#[tokio::test]
async fn group_fetch_failure_keeps_the_last_good_cache() {
    let bridge = three_light_bridge().await;
    let session = shared_session();

    refresh(&session, &bridge).await;
    let before: Vec<(u32, String, bool)> = {
        let s = session.read().unwrap();
        let mut v: Vec<_> = s
            .lights
            .iter()
            .map(|(id, l)| (*id, l.label.clone(), l.on))
            .collect();
        v.sort();
        v
    };

    // The bridge changes under us but refuses the membership fetch.
    bridge.put_light(2, "Shelf", false).await;
    bridge.remove_light(3).await;
    bridge.fail_group(true).await;
    refresh(&session, &bridge).await;

    let s = session.read().unwrap();
    let mut after: Vec<_> = s
        .lights
        .iter()
        .map(|(id, l)| (*id, l.label.clone(), l.on))
        .collect();
    after.sort();
    assert_eq!(after, before, "abandoned pass must not touch the cache");
    assert!(s.aggregate.err);
}

#[tokio::test]
async fn single_light_failure_skips_only_that_light() {
    let bridge = three_light_bridge().await;
    let session = shared_session();

    refresh(&session, &bridge).await;

    // Light 2 turns off remotely but its fetch fails; light 1 turns on.
    bridge.put_light(2, "Shelf", false).await;
    bridge.put_light(1, "Desk", true).await;
    bridge.fail_light(2, true).await;
    refresh(&session, &bridge).await;

    let s = session.read().unwrap();
    assert!(s.lights[&1].on, "healthy light must be updated");
    assert!(s.lights[&2].on, "failed light keeps its last-good state");
}

#[tokio::test]
async fn recovery_after_a_failed_pass_resumes_syncing() {
    let bridge = three_light_bridge().await;
    let session = shared_session();

    bridge.fail_connect(true).await;
    refresh(&session, &bridge).await;
    assert!(session.read().unwrap().bridge.is_none());

    // Next activation attempt succeeds; the same pass completes.
    bridge.fail_connect(false).await;
    refresh(&session, &bridge).await;

    let s = session.read().unwrap();
    assert!(s.bridge.is_some());
    assert_eq!(s.lights.len(), 3);
}
