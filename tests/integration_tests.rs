// Integration tests for the draft room client.
//
// These tests exercise the system end-to-end through the library crate's
// public API: wire frames folded into the mirrored session, roster loads,
// view derivation, the app event loop over mpsc channels, and local
// persistence across reopens.

use draft_room::api::ApiClient;
use draft_room::app::{self, AppState, DraftSnapshot, UserCommand};
use draft_room::db::LocalStore;
use draft_room::draft::session::DraftStatus;
use draft_room::draft::view::Scope;
use draft_room::players::RosterEvent;
use draft_room::protocol::{ConnectionStatus, Player};
use draft_room::ws_client::{WsClient, WsEvent};

use tokio::sync::mpsc;

// ===========================================================================
// Test helpers
// ===========================================================================

fn player(id: i64, first: &str, last: &str, category: &str) -> Player {
    Player {
        id,
        first_name: first.to_string(),
        last_name: last.to_string(),
        status: "active".to_string(),
        category_code: category.to_string(),
    }
}

fn two_player_roster() -> Vec<Player> {
    vec![
        player(1, "Ada", "Alpha", "A"),
        player(2, "Ben", "Beta", "B"),
    ]
}

/// Build an AppState wired to channels the test controls. The API client
/// points at an unreachable address; tests feed roster data directly.
fn test_state(participant_id: i64) -> (AppState, mpsc::Receiver<RosterEvent>) {
    let (roster_tx, roster_rx) = mpsc::channel(16);
    let state = AppState::new(
        ApiClient::new("http://127.0.0.1:1"),
        LocalStore::open(":memory:").unwrap(),
        participant_id,
        None,
        roster_tx,
    );
    (state, roster_rx)
}

/// Receive snapshots until one satisfies the predicate, panicking after a
/// bounded number of attempts.
async fn snapshot_where(
    ui_rx: &mut mpsc::Receiver<DraftSnapshot>,
    pred: impl Fn(&DraftSnapshot) -> bool,
) -> DraftSnapshot {
    for _ in 0..64 {
        let snapshot = ui_rx
            .recv()
            .await
            .expect("ui channel closed before expected snapshot");
        if pred(&snapshot) {
            return snapshot;
        }
    }
    panic!("expected snapshot never arrived");
}

// ===========================================================================
// Mirrored session through the public API
// ===========================================================================

#[tokio::test]
async fn happy_path_start_pick_derive() {
    let (mut state, _roster_rx) = test_state(100);
    state.handle_roster_event(RosterEvent::Loaded {
        event_id: 9,
        players: two_player_roster(),
    });

    state.handle_frame(
        r#"{"type":"draft_started","eventID":9,"currentTurn":100,"roundNumber":1,"turnDeadline":1000}"#,
    );
    assert_eq!(state.session.status, DraftStatus::InProgress);
    assert_eq!(state.session.current_turn, Some(100));

    state.handle_frame(
        r#"{"type":"draft_state","eventID":9,"status":"in_progress","currentTurn":100,
            "roundNumber":1,"currentPickIndex":0,"totalRounds":2,"pickOrder":[100,200],
            "availableEntities":[1,2],"turnDeadline":1000,"remainingTime":0,"pickHistory":[]}"#,
    );
    state.handle_frame(
        r#"{"type":"pick_made","participantID":100,"entityID":1,"round":1,"autoSelected":false}"#,
    );

    let recorded = &state.session.pick_history[0];
    assert_eq!(recorded.participant_id, 100);
    assert_eq!(recorded.player_id, 1);
    assert_eq!(recorded.pick_number, 1);
    assert_eq!(recorded.round, 1);
    assert!(!recorded.auto_selected);

    // The derived "available" view with no filter shows only Beta.
    let snapshot = state.build_snapshot();
    assert_eq!(snapshot.players.len(), 1);
    assert_eq!(snapshot.players[0].player.last_name, "Beta");
}

#[tokio::test]
async fn missed_deltas_are_healed_by_resync() {
    let (mut state, _roster_rx) = test_state(100);
    state.handle_roster_event(RosterEvent::Loaded {
        event_id: 9,
        players: two_player_roster(),
    });
    state.handle_frame(
        r#"{"type":"draft_started","eventID":9,"currentTurn":100,"roundNumber":1,"turnDeadline":1000}"#,
    );

    // The pick_made and turn_changed deltas were lost; the resync after
    // reconnect carries the whole truth.
    state.handle_frame(
        r#"{"type":"draft_state","eventID":9,"status":"in_progress","currentTurn":200,
            "roundNumber":1,"currentPickIndex":1,"totalRounds":2,"pickOrder":[100,200],
            "availableEntities":[2],"turnDeadline":4000,"remainingTime":0,
            "pickHistory":[{"participantID":100,"entityID":1,"pickNumber":1,"round":1,"autoSelected":false}]}"#,
    );

    assert_eq!(state.session.current_turn, Some(200));
    assert_eq!(state.session.pick_history.len(), 1);
    let snapshot = state.build_snapshot();
    assert_eq!(snapshot.players.len(), 1);
    assert_eq!(snapshot.players[0].player.id, 2);
    assert!(!snapshot.my_turn);
}

#[tokio::test]
async fn auto_selected_pick_is_flagged_through_to_snapshot() {
    let (mut state, _roster_rx) = test_state(100);
    state.handle_frame(
        r#"{"type":"draft_started","eventID":9,"currentTurn":100,"roundNumber":1,"turnDeadline":1000}"#,
    );
    state.handle_frame(
        r#"{"type":"pick_made","participantID":100,"entityID":1,"round":1,"autoSelected":true}"#,
    );
    let snapshot = state.build_snapshot();
    assert!(snapshot.pick_history[0].auto_selected);
}

#[tokio::test]
async fn error_is_surfaced_then_cleared() {
    let (mut state, _roster_rx) = test_state(100);
    state.handle_frame(r#"{"type":"error","error":"busy"}"#);
    assert_eq!(state.build_snapshot().last_error.as_deref(), Some("busy"));
    assert_eq!(state.session.status, DraftStatus::Idle);

    state.handle_frame(
        r#"{"type":"turn_changed","currentTurn":200,"roundNumber":2,"turnDeadline":2000}"#,
    );
    let snapshot = state.build_snapshot();
    assert!(snapshot.last_error.is_none());
    assert_eq!(snapshot.current_turn, Some(200));
}

#[tokio::test]
async fn filter_composition_over_live_state() {
    let (mut state, _roster_rx) = test_state(100);
    state.handle_roster_event(RosterEvent::Loaded {
        event_id: 9,
        players: vec![
            player(1, "Ada", "Alpha", "A"),
            player(2, "Ben", "Balboa", "B"),
            player(3, "Cal", "Alvarez", "A"),
        ],
    });
    // Player 1 already drafted per the authority.
    state.handle_frame(
        r#"{"type":"draft_state","eventID":9,"status":"in_progress","currentTurn":200,
            "roundNumber":1,"currentPickIndex":1,"totalRounds":2,"pickOrder":[100,200],
            "availableEntities":[2,3],"turnDeadline":4000,"remainingTime":0,
            "pickHistory":[{"participantID":100,"entityID":1,"pickNumber":1,"round":1,"autoSelected":false}]}"#,
    );

    state.handle_command(UserCommand::SetScope(Scope::Available));
    state.handle_command(UserCommand::SetQuery("al".into()));
    state.handle_command(UserCommand::ToggleCategory("A".into()));

    // Scope drops Alpha (taken); "al" keeps Balboa and Alvarez; category A
    // keeps only Alvarez.
    let snapshot = state.build_snapshot();
    assert_eq!(snapshot.players.len(), 1);
    assert_eq!(snapshot.players[0].player.last_name, "Alvarez");
}

// ===========================================================================
// App event loop over channels
// ===========================================================================

#[tokio::test]
async fn event_loop_applies_frames_and_publishes_snapshots() {
    let (ws_tx, ws_rx) = mpsc::channel(64);
    let (roster_tx, roster_rx) = mpsc::channel(16);
    let (cmd_tx, cmd_rx) = mpsc::channel(16);
    let (ui_tx, mut ui_rx) = mpsc::channel(64);

    let state = AppState::new(
        ApiClient::new("http://127.0.0.1:1"),
        LocalStore::open(":memory:").unwrap(),
        100,
        None,
        roster_tx.clone(),
    );
    // The connect attempt targets an unreachable port; its status events
    // interleave harmlessly with the frames injected below.
    let ws = WsClient::new("ws://127.0.0.1:1/ws", ws_tx.clone());

    let handle = tokio::spawn(app::run(ws, ws_rx, roster_rx, cmd_rx, ui_tx, state));

    roster_tx
        .send(RosterEvent::Loaded {
            event_id: 9,
            players: two_player_roster(),
        })
        .await
        .unwrap();
    ws_tx
        .send(WsEvent::Message(
            r#"{"type":"draft_started","eventID":9,"currentTurn":100,"roundNumber":1,"turnDeadline":1000}"#.into(),
        ))
        .await
        .unwrap();
    ws_tx
        .send(WsEvent::Message(
            r#"{"type":"draft_state","eventID":9,"status":"in_progress","currentTurn":100,
                "roundNumber":1,"currentPickIndex":0,"totalRounds":2,"pickOrder":[100,200],
                "availableEntities":[1,2],"turnDeadline":1000,"remainingTime":0,"pickHistory":[]}"#
                .into(),
        ))
        .await
        .unwrap();
    ws_tx
        .send(WsEvent::Message(
            r#"{"type":"pick_made","participantID":100,"entityID":1,"round":1,"autoSelected":false}"#.into(),
        ))
        .await
        .unwrap();

    let snapshot = snapshot_where(&mut ui_rx, |s| s.pick_history.len() == 1).await;
    assert_eq!(snapshot.status, DraftStatus::InProgress);
    assert!(snapshot.my_turn);
    assert_eq!(snapshot.players.len(), 1);
    assert_eq!(snapshot.players[0].player.last_name, "Beta");

    cmd_tx.send(UserCommand::Quit).await.unwrap();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn event_loop_pause_resume_scenario() {
    let (ws_tx, ws_rx) = mpsc::channel(64);
    let (roster_tx, roster_rx) = mpsc::channel(16);
    let (cmd_tx, cmd_rx) = mpsc::channel(16);
    let (ui_tx, mut ui_rx) = mpsc::channel(64);

    let state = AppState::new(
        ApiClient::new("http://127.0.0.1:1"),
        LocalStore::open(":memory:").unwrap(),
        100,
        None,
        roster_tx,
    );
    let ws = WsClient::new("ws://127.0.0.1:1/ws", ws_tx.clone());
    let handle = tokio::spawn(app::run(ws, ws_rx, roster_rx, cmd_rx, ui_tx, state));

    ws_tx
        .send(WsEvent::Message(
            r#"{"type":"draft_started","eventID":9,"currentTurn":100,"roundNumber":1,"turnDeadline":1000}"#.into(),
        ))
        .await
        .unwrap();
    ws_tx
        .send(WsEvent::Message(
            r#"{"type":"draft_paused","remainingTime":30}"#.into(),
        ))
        .await
        .unwrap();

    let paused = snapshot_where(&mut ui_rx, |s| s.status == DraftStatus::Paused).await;
    assert_eq!(paused.remaining_time, 30);

    ws_tx
        .send(WsEvent::Message(
            r#"{"type":"draft_resumed","currentTurn":100,"roundNumber":2,"turnDeadline":3000}"#.into(),
        ))
        .await
        .unwrap();

    let resumed = snapshot_where(&mut ui_rx, |s| s.status == DraftStatus::InProgress).await;
    assert_eq!(resumed.round_number, 2);
    assert!(resumed.my_turn);

    cmd_tx.send(UserCommand::Quit).await.unwrap();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn event_loop_leave_draft_clears_state() {
    let (ws_tx, ws_rx) = mpsc::channel(64);
    let (roster_tx, roster_rx) = mpsc::channel(16);
    let (cmd_tx, cmd_rx) = mpsc::channel(16);
    let (ui_tx, mut ui_rx) = mpsc::channel(64);

    let state = AppState::new(
        ApiClient::new("http://127.0.0.1:1"),
        LocalStore::open(":memory:").unwrap(),
        100,
        None,
        roster_tx,
    );
    let ws = WsClient::new("ws://127.0.0.1:1/ws", ws_tx.clone());
    let handle = tokio::spawn(app::run(ws, ws_rx, roster_rx, cmd_rx, ui_tx, state));

    ws_tx
        .send(WsEvent::Message(
            r#"{"type":"draft_started","eventID":9,"currentTurn":100,"roundNumber":1,"turnDeadline":1000}"#.into(),
        ))
        .await
        .unwrap();
    snapshot_where(&mut ui_rx, |s| s.status == DraftStatus::InProgress).await;

    cmd_tx.send(UserCommand::LeaveDraft).await.unwrap();
    let cleared = snapshot_where(&mut ui_rx, |s| s.status == DraftStatus::Idle).await;
    assert!(cleared.event_id.is_none());
    assert!(cleared.pick_history.is_empty());

    cmd_tx.send(UserCommand::Quit).await.unwrap();
    handle.await.unwrap().unwrap();
}

// ===========================================================================
// Local persistence across reopens
// ===========================================================================

#[test]
fn remembered_session_survives_reopen() {
    let path = std::env::temp_dir().join(format!(
        "draftroom-test-{}-{}.sqlite3",
        std::process::id(),
        line!()
    ));
    let path_str = path.to_str().unwrap();
    let _ = std::fs::remove_file(&path);

    {
        let store = LocalStore::open(path_str).unwrap();
        store.remember_session(9, 100).unwrap();
    }
    {
        let store = LocalStore::open(path_str).unwrap();
        let remembered = store.remembered_session().unwrap().unwrap();
        assert_eq!(remembered.event_id, 9);
        assert_eq!(remembered.participant_id, 100);
        store.forget_session().unwrap();
    }
    {
        let store = LocalStore::open(path_str).unwrap();
        assert!(store.remembered_session().unwrap().is_none());
    }

    let _ = std::fs::remove_file(&path);
}

// ===========================================================================
// Scaffold
// ===========================================================================

#[test]
fn default_config_is_valid_toml() {
    let content = std::fs::read_to_string("config/draftroom.toml")
        .expect("config/draftroom.toml should exist");
    let parsed: Result<toml::Value, _> = toml::from_str(&content);
    assert!(
        parsed.is_ok(),
        "config/draftroom.toml is not valid TOML: {:?}",
        parsed.err()
    );
}

#[test]
fn default_config_loads() {
    let cwd = std::env::current_dir().unwrap();
    let config = draft_room::config::load_config_from(&cwd).unwrap();
    assert!(config.server.api_url.starts_with("http"));
    assert!(config.server.ws_url.starts_with("ws"));
}

#[tokio::test]
async fn connection_status_events_reach_snapshots() {
    // No server listens here; the failed connect must surface as status
    // snapshots, never as an error return.
    let (ws_tx, ws_rx) = mpsc::channel(64);
    let (roster_tx, roster_rx) = mpsc::channel(16);
    let (cmd_tx, cmd_rx) = mpsc::channel(16);
    let (ui_tx, mut ui_rx) = mpsc::channel(64);

    let state = AppState::new(
        ApiClient::new("http://127.0.0.1:1"),
        LocalStore::open(":memory:").unwrap(),
        100,
        None,
        roster_tx,
    );
    let ws = WsClient::new("ws://127.0.0.1:1/ws", ws_tx);
    let handle = tokio::spawn(app::run(ws, ws_rx, roster_rx, cmd_rx, ui_tx, state));

    snapshot_where(&mut ui_rx, |s| s.connection == ConnectionStatus::Connecting).await;
    snapshot_where(&mut ui_rx, |s| {
        s.connection == ConnectionStatus::Disconnected
    })
    .await;

    cmd_tx.send(UserCommand::Quit).await.unwrap();
    handle.await.unwrap().unwrap();
}
