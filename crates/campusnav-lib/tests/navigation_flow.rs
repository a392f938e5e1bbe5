mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;

use campusnav_lib::{
    start_tracking, Command, Coordinates, FeatureKind, NavState, Notice, PositionOptions,
    Rejection, ReplayPositionSource, StepView,
};
use common::{catalog, spawn, spawn_tracking, CountingSource, RecordingProvider, Reply};

const SETTLE: Duration = Duration::from_secs(2);

async fn open_candidates(
    handle: &mut campusnav_lib::ControllerHandle<campusnav_lib::FeatureTable>,
) -> campusnav_lib::NavigationSnapshot {
    handle
        .send(Command::SetOrigin("Kennesaw Hall".into()))
        .unwrap();
    handle.send(Command::SetDestination("Library".into())).unwrap();
    let snapshot = handle
        .wait_for(|s| s.state == NavState::CandidatesOpen)
        .await
        .unwrap();
    assert_eq!(
        handle.next_notice().await,
        Some(Notice::RoutesReady { count: 2 })
    );
    snapshot
}

fn drain(handle: &mut campusnav_lib::ControllerHandle<campusnav_lib::FeatureTable>) -> Vec<Notice> {
    std::iter::from_fn(|| handle.try_notice()).collect()
}

#[tokio::test(start_paused = true)]
async fn keystrokes_within_window_issue_one_request() {
    let provider = RecordingProvider::new();
    let mut handle = spawn(provider.clone());

    handle
        .send(Command::SetOrigin("Kennesaw Hall".into()))
        .unwrap();
    for partial in ["L", "Li", "Lib", "Libr", "Library"] {
        handle
            .send(Command::SetDestination(partial.into()))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    handle
        .wait_for(|s| s.state == NavState::CandidatesOpen)
        .await
        .unwrap();
    tokio::time::sleep(SETTLE).await;

    let calls = provider.calls();
    assert_eq!(calls.len(), 1, "debounce should collapse keystrokes");
    assert_eq!(calls[0].destination_label, "Sturgis Library");
    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn live_fix_is_used_when_origin_is_empty() {
    let provider = RecordingProvider::new();
    let mut handle = spawn(provider.clone());
    let fix = Coordinates::new(-84.58, 34.04);

    handle.send(Command::PositionFix(fix)).unwrap();
    handle.send(Command::SetDestination("Library".into())).unwrap();
    let snapshot = handle
        .wait_for(|s| s.state == NavState::CandidatesOpen)
        .await
        .unwrap();

    let calls = provider.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].origin, fix);
    assert_eq!(calls[0].mode.profile(), "foot-walking");
    assert_eq!(calls[0].origin_label, "My Location");
    assert!(snapshot.panel_open);
    assert_eq!(snapshot.selected_id, Some(0));
    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn sentinel_origin_uses_live_fix() {
    let provider = RecordingProvider::new();
    let mut handle = spawn(provider.clone());
    let fix = Coordinates::new(-84.5849, 34.0371);

    handle.send(Command::SetOrigin("My Location".into())).unwrap();
    handle.send(Command::SetDestination("library".into())).unwrap();
    handle.send(Command::PositionFix(fix)).unwrap();
    handle
        .wait_for(|s| s.state == NavState::CandidatesOpen)
        .await
        .unwrap();

    assert_eq!(provider.calls()[0].origin, fix);
    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn unresolvable_destination_sends_nothing() {
    let provider = RecordingProvider::new();
    let handle = spawn(provider.clone());

    handle
        .send(Command::SetOrigin("Kennesaw Hall".into()))
        .unwrap();
    handle
        .send(Command::SetDestination("Zzzznotaplace".into()))
        .unwrap();
    tokio::time::sleep(SETTLE).await;

    assert!(provider.calls().is_empty());
    assert_eq!(handle.snapshot().state, NavState::Idle);
    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn wheelchair_mode_requests_wheelchair_profile() {
    let provider = RecordingProvider::new();
    let mut handle = spawn(provider.clone());

    handle.send(Command::ToggleMode).unwrap();
    open_candidates(&mut handle).await;

    assert_eq!(provider.calls()[0].mode.profile(), "wheelchair");
    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn confirm_without_selection_is_rejected() {
    let provider = RecordingProvider::new();
    let mut handle = spawn(provider);
    open_candidates(&mut handle).await;

    handle.send(Command::ClearSelection).unwrap();
    handle.send(Command::Confirm).unwrap();

    match handle.next_notice().await {
        Some(Notice::Rejected { rejection, .. }) => assert_eq!(rejection, Rejection::NoSelection),
        other => panic!("unexpected notice {other:?}"),
    }
    let snapshot = handle.snapshot();
    assert_eq!(snapshot.state, NavState::CandidatesOpen);
    assert!(!snapshot.session.is_active);
    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn confirmed_route_can_be_stepped_and_cancelled() {
    let provider = RecordingProvider::new();
    let mut handle = spawn(provider);
    open_candidates(&mut handle).await;

    handle.send(Command::Select(1)).unwrap();
    handle.send(Command::Confirm).unwrap();
    assert_eq!(
        handle.next_notice().await,
        Some(Notice::NavigationStarted { route: 1 })
    );

    for _ in 0..10 {
        handle.send(Command::NextStep).unwrap();
    }
    handle.send(Command::ToggleStepView).unwrap();
    let snapshot = handle
        .wait_for(|s| s.step_view == StepView::OneAtATime)
        .await
        .unwrap();
    assert_eq!(snapshot.state, NavState::RouteActive);
    assert_eq!(snapshot.session.active_candidate_id, Some(1));
    assert_eq!(snapshot.session.steps.len(), 4);
    assert_eq!(snapshot.session.step_cursor, 3);
    assert!(!snapshot.panel_open);

    handle.send(Command::Cancel).unwrap();
    let snapshot = handle
        .wait_for(|s| s.state == NavState::Idle)
        .await
        .unwrap();
    assert!(snapshot.session.steps.is_empty());
    assert!(snapshot.inputs.origin_text.is_empty());

    let navigator = handle.shutdown().await.unwrap();
    let map = navigator.map();
    assert_eq!(map.count(FeatureKind::Marker), 0);
    assert_eq!(map.count(FeatureKind::RouteLine), 0);
    assert_eq!(map.count(FeatureKind::Preview), 0);
    assert_eq!(
        map.count(FeatureKind::AccessibilityMarker),
        navigator.catalog().len()
    );
}

#[tokio::test(start_paused = true)]
async fn active_route_ignores_new_inputs() {
    let provider = RecordingProvider::new();
    let mut handle = spawn(provider.clone());
    open_candidates(&mut handle).await;

    handle.send(Command::Confirm).unwrap();
    handle
        .send(Command::SetDestination("Convocation Center".into()))
        .unwrap();
    tokio::time::sleep(SETTLE).await;

    assert_eq!(provider.calls().len(), 1);
    assert_eq!(handle.snapshot().state, NavState::RouteActive);
    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn arrival_is_acknowledged_and_resets() {
    let provider = RecordingProvider::new();
    let mut handle = spawn(provider);
    open_candidates(&mut handle).await;

    handle.send(Command::Confirm).unwrap();
    handle.send(Command::Arrive).unwrap();
    handle.next_notice().await;

    match handle.next_notice().await {
        Some(Notice::Arrived { message, .. }) => {
            assert_eq!(message, "You have arrived at Sturgis Library.")
        }
        other => panic!("unexpected notice {other:?}"),
    }
    let snapshot = handle
        .wait_for(|s| s.state == NavState::Idle)
        .await
        .unwrap();
    assert!(!snapshot.session.is_active);
    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn stale_response_is_discarded() {
    let provider = RecordingProvider::scripted([
        Reply::Routes(Duration::from_secs(3)),
        Reply::Routes(Duration::from_millis(100)),
    ]);
    let mut handle = spawn(provider.clone());

    handle
        .send(Command::SetOrigin("Kennesaw Hall".into()))
        .unwrap();
    handle.send(Command::SetDestination("Library".into())).unwrap();
    tokio::time::sleep(Duration::from_millis(700)).await;
    assert_eq!(provider.calls().len(), 1, "first request in flight");

    handle
        .send(Command::SetDestination("Convocation Center".into()))
        .unwrap();
    let snapshot = handle
        .wait_for(|s| s.state == NavState::CandidatesOpen)
        .await
        .unwrap();
    assert_eq!(snapshot.candidates[0].destination_label, "Convocation Center");

    tokio::time::sleep(Duration::from_secs(5)).await;
    let snapshot = handle.snapshot();
    assert_eq!(provider.calls().len(), 2);
    assert_eq!(snapshot.candidates[0].destination_label, "Convocation Center");

    let ready = drain(&mut handle)
        .into_iter()
        .filter(|notice| matches!(notice, Notice::RoutesReady { .. }))
        .count();
    assert_eq!(ready, 1, "late response must not be applied");
    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn editing_while_request_in_flight_drops_its_answer() {
    let provider = RecordingProvider::scripted([
        Reply::Routes(Duration::from_millis(300)),
        Reply::Routes(Duration::from_secs(5)),
    ]);
    let mut handle = spawn(provider.clone());

    handle
        .send(Command::SetOrigin("Kennesaw Hall".into()))
        .unwrap();
    handle.send(Command::SetDestination("Library".into())).unwrap();
    tokio::time::sleep(Duration::from_millis(700)).await;
    assert_eq!(provider.calls().len(), 1, "first request in flight");

    handle
        .send(Command::SetDestination("Convocation Center".into()))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let snapshot = handle.snapshot();
    assert_eq!(snapshot.state, NavState::Idle);
    assert!(snapshot.candidates.is_empty(), "Library routes must not open");

    handle.send(Command::Confirm).unwrap();
    match handle.next_notice().await {
        Some(Notice::Rejected { rejection, .. }) => assert_eq!(rejection, Rejection::NoSelection),
        other => panic!("unexpected notice {other:?}"),
    }

    let snapshot = handle
        .wait_for(|s| s.state == NavState::CandidatesOpen)
        .await
        .unwrap();
    assert_eq!(provider.calls().len(), 2);
    assert_eq!(snapshot.candidates[0].destination_label, "Convocation Center");

    handle.send(Command::Confirm).unwrap();
    let snapshot = handle
        .wait_for(|s| s.state == NavState::RouteActive)
        .await
        .unwrap();
    assert_eq!(snapshot.session.destination_label, "Convocation Center");

    let convocation = catalog()
        .find("Convocation Center")
        .expect("fixture location")
        .coordinates;
    let navigator = handle.shutdown().await.unwrap();
    let end = navigator
        .map()
        .get(campusnav_lib::FeatureKey::END_MARKER)
        .expect("end marker drawn");
    assert_eq!(end.geometry, campusnav_lib::map::Geometry::Point(convocation));
}

#[tokio::test(start_paused = true)]
async fn confirm_before_requery_settles_is_refused() {
    let provider = RecordingProvider::new();
    let mut handle = spawn(provider);
    open_candidates(&mut handle).await;

    handle
        .send(Command::SetDestination("Convocation Center".into()))
        .unwrap();
    handle.send(Command::Confirm).unwrap();
    match handle.next_notice().await {
        Some(Notice::Rejected { rejection, .. }) => {
            assert_eq!(rejection, Rejection::RoutesOutdated)
        }
        other => panic!("unexpected notice {other:?}"),
    }
    assert_eq!(handle.snapshot().state, NavState::CandidatesOpen);

    let snapshot = handle
        .wait_for(|s| {
            s.candidates
                .first()
                .is_some_and(|c| c.destination_label == "Convocation Center")
        })
        .await
        .unwrap();
    assert!(!snapshot.session.is_active);
    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn provider_failure_clears_candidates() {
    let provider = RecordingProvider::scripted([
        Reply::Routes(Duration::ZERO),
        Reply::Fail(Duration::from_millis(50)),
    ]);
    let mut handle = spawn(provider);
    open_candidates(&mut handle).await;

    handle
        .send(Command::SetDestination("Convocation Center".into()))
        .unwrap();
    match handle.next_notice().await {
        Some(Notice::RouteUnavailable { message }) => assert!(message.contains("503")),
        other => panic!("unexpected notice {other:?}"),
    }
    let snapshot = handle.snapshot();
    assert!(snapshot.candidates.is_empty());
    assert!(!snapshot.panel_open);
    assert_eq!(snapshot.state, NavState::Idle);
    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn bookmarks_outlive_the_result_set() {
    let provider = RecordingProvider::new();
    let mut handle = spawn(provider);
    open_candidates(&mut handle).await;

    handle.send(Command::ToggleBookmark(1)).unwrap();
    assert!(matches!(
        handle.next_notice().await,
        Some(Notice::Bookmark { .. })
    ));
    handle.send(Command::Cancel).unwrap();
    let snapshot = handle
        .wait_for(|s| s.state == NavState::Idle)
        .await
        .unwrap();

    assert!(snapshot.candidates.is_empty());
    assert_eq!(snapshot.bookmarks.len(), 1);
    assert_eq!(snapshot.bookmarks[0].route.summary, "Route 2");
    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn tracked_positions_move_a_single_marker() {
    let provider = RecordingProvider::new();
    let source = ReplayPositionSource::new(
        [
            Coordinates::new(-84.5847, 34.0379),
            Coordinates::new(-84.5843, 34.0382),
            Coordinates::new(-84.5840, 34.0384),
        ],
        Duration::from_millis(200),
    );
    let (stream, tracking) = start_tracking(source, PositionOptions::default());
    let mut handle = spawn_tracking(provider, stream, tracking);

    let snapshot = handle
        .wait_for(|s| s.inputs.live_fix == Some(Coordinates::new(-84.5840, 34.0384)))
        .await
        .unwrap();
    assert_eq!(snapshot.state, NavState::Idle);

    let navigator = handle.shutdown().await.unwrap();
    assert_eq!(navigator.map().count(FeatureKind::UserLocation), 1);
}

#[tokio::test(start_paused = true)]
async fn shutdown_cancels_position_tracking() {
    let (source, emitted) = CountingSource::new(50, Duration::from_millis(100));
    let (stream, tracking) = start_tracking(source, PositionOptions::default());
    let mut handle = spawn_tracking(RecordingProvider::new(), stream, tracking);

    handle
        .wait_for(|s| s.inputs.live_fix.is_some())
        .await
        .unwrap();
    handle.shutdown().await.unwrap();
    let at_shutdown = emitted.load(Ordering::SeqCst);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(at_shutdown < 50, "source still had fixes left");
    assert_eq!(
        emitted.load(Ordering::SeqCst),
        at_shutdown,
        "no fixes are produced after shutdown"
    );
}
