mod common;

use common::{NOW, fixture_snapshot};
use farm_terminal::farm_fetch::FetchError;
use farm_terminal::settings::Settings;
use farm_terminal::state::{AppState, Delta, FetchDecision, Snapshot, apply_delta_at};

const NOW_MS: i64 = NOW * 1000;

fn keyed_state() -> AppState {
    AppState::new(Settings {
        api_key: "stored-key".to_string(),
        ..Settings::default()
    })
}

fn issue(state: &mut AppState, now_ms: i64, force: bool) -> u64 {
    match state.begin_fetch(now_ms, force) {
        FetchDecision::Issue { seq, .. } => seq,
        other => panic!("expected a fetch to be issued, got {other:?}"),
    }
}

fn empty_snapshot(captured_at_ms: i64) -> Snapshot {
    Snapshot {
        fields: Vec::new(),
        animals: Vec::new(),
        captured_at_ms,
    }
}

#[test]
fn failed_fetch_keeps_previous_cards_and_timestamp() {
    let mut state = keyed_state();
    let seq = issue(&mut state, NOW_MS, true);
    apply_delta_at(
        &mut state,
        Delta::SnapshotReady {
            seq,
            snapshot: fixture_snapshot(NOW_MS),
        },
        NOW,
    );
    assert_eq!(state.owned_fields(), 5);
    let fields_before = state.fields.clone();
    let animals_before = state.animals.clone();

    let seq = issue(&mut state, NOW_MS + 60_000, false);
    apply_delta_at(
        &mut state,
        Delta::FetchFailed {
            seq,
            error: FetchError::UpstreamStatus {
                fields: 500,
                animals: 200,
            },
        },
        NOW + 60,
    );

    assert_eq!(state.fields, fields_before);
    assert_eq!(state.animals, animals_before);
    assert_eq!(state.last_successful_fetch_ms, NOW_MS);
    assert!(state.snapshot.is_some());
    assert!(state.status.is_error);
    assert_eq!(state.status.text, "Error: API Error: Fields 500, Animals 200");
    assert!(!state.loading);
}

#[test]
fn throttled_refresh_is_informational() {
    let mut state = keyed_state();
    let seq = issue(&mut state, NOW_MS, true);
    apply_delta_at(
        &mut state,
        Delta::SnapshotReady {
            seq,
            snapshot: empty_snapshot(NOW_MS),
        },
        NOW,
    );

    assert_eq!(state.begin_fetch(NOW_MS + 10_000, false), FetchDecision::UseCached);
    assert!(!state.status.is_error);
    assert_eq!(state.status.text, "Using cached data. Refresh to force.");

    issue(&mut state, NOW_MS + 10_000, true);
    assert!(state.loading);
}

#[test]
fn missing_key_is_reported_without_issuing() {
    let mut state = AppState::default();
    assert_eq!(state.begin_fetch(NOW_MS, true), FetchDecision::MissingKey);
    assert!(state.status.is_error);
    assert_eq!(state.latest_issued_seq(), 0);
}

#[test]
fn host_key_beats_stored_key() {
    let mut state = keyed_state();
    state.host_key = Some("host-key".to_string());
    match state.begin_fetch(NOW_MS, true) {
        FetchDecision::Issue { api_key, .. } => assert_eq!(api_key, "host-key"),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn stale_snapshot_does_not_overwrite_newer_one() {
    let mut state = keyed_state();
    let first = issue(&mut state, NOW_MS, false);
    let second = issue(&mut state, NOW_MS + 1, false);

    apply_delta_at(
        &mut state,
        Delta::SnapshotReady {
            seq: second,
            snapshot: fixture_snapshot(NOW_MS + 2_000),
        },
        NOW,
    );
    apply_delta_at(
        &mut state,
        Delta::SnapshotReady {
            seq: first,
            snapshot: empty_snapshot(NOW_MS + 3_000),
        },
        NOW,
    );

    assert_eq!(state.applied_seq(), second);
    assert_eq!(state.owned_fields(), 5);
    assert_eq!(state.last_successful_fetch_ms, NOW_MS + 2_000);
}

#[test]
fn stale_failure_does_not_mask_newer_success() {
    let mut state = keyed_state();
    let first = issue(&mut state, NOW_MS, false);
    let second = issue(&mut state, NOW_MS + 1, false);

    apply_delta_at(
        &mut state,
        Delta::SnapshotReady {
            seq: second,
            snapshot: empty_snapshot(NOW_MS + 2_000),
        },
        NOW,
    );
    apply_delta_at(
        &mut state,
        Delta::FetchFailed {
            seq: first,
            error: FetchError::Transport("timed out".to_string()),
        },
        NOW,
    );

    assert!(!state.status.is_error);
    assert!(state.status.text.starts_with("Updated: "));
    assert!(state.logs.iter().any(|l| l.contains("timed out")));
}

#[test]
fn new_snapshot_replaces_ownership_wholesale() {
    let mut state = keyed_state();
    let seq = issue(&mut state, NOW_MS, true);
    apply_delta_at(
        &mut state,
        Delta::SnapshotReady {
            seq,
            snapshot: fixture_snapshot(NOW_MS),
        },
        NOW,
    );
    let seq = issue(&mut state, NOW_MS + 60_000, false);
    apply_delta_at(
        &mut state,
        Delta::SnapshotReady {
            seq,
            snapshot: empty_snapshot(NOW_MS + 60_000),
        },
        NOW + 60,
    );
    assert_eq!(state.owned_fields(), 0);
    assert_eq!(state.owned_animals(), 0);
    assert!(state.timers.is_empty());
}
