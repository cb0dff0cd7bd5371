// Application state and orchestration logic.
//
// The central event loop: folds authority events into the mirrored draft
// session, keeps the roster repository fresh, applies local view-filter
// commands, and publishes a full snapshot to the UI after every change.
// All state mutation happens synchronously inside one handler at a time
// on this single task, so no locking is needed anywhere in the core.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::db::LocalStore;
use crate::draft::session::{DraftSession, DraftStatus};
use crate::draft::view::{self, Scope, SortField, ViewFilter};
use crate::players::{self, PlayerRepository, RosterEvent};
use crate::protocol::{decode_event, ClientCommand, ConnectionStatus, Pick, Player};
use crate::ws_client::{WsClient, WsEvent};

// ---------------------------------------------------------------------------
// Commands and snapshots
// ---------------------------------------------------------------------------

/// A command from the local user.
#[derive(Debug, Clone)]
pub enum UserCommand {
    /// Ask the authority to start the draft.
    StartDraft {
        pick_order: Vec<i64>,
        total_rounds: u32,
        timer_duration: u32,
    },
    /// Select a player on the local participant's turn.
    MakePick { player_id: i64 },
    PauseDraft,
    ResumeDraft,
    /// Replace the free-text filter.
    SetQuery(String),
    SetScope(Scope),
    ToggleCategory(String),
    ToggleSort(SortField),
    /// Retry the roster fetch for the active event.
    ReloadRoster,
    /// Abandon the draft: reset mirrored state, forget the remembered
    /// session, drop the connection.
    LeaveDraft,
    Quit,
}

/// One row of the presented player list.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerRow {
    pub player: Player,
    /// Marked from the roster−pool complement regardless of which scope
    /// is displayed, so an "all" view still flags drafted players.
    pub taken: bool,
}

/// Everything the UI needs to render, published after every applied
/// change. The UI holds no state of its own beyond the last snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct DraftSnapshot {
    pub connection: ConnectionStatus,
    pub status: DraftStatus,
    pub event_id: Option<i64>,
    pub current_turn: Option<i64>,
    pub my_turn: bool,
    pub picks_until_turn: Option<u32>,
    pub round_number: u32,
    pub total_rounds: u32,
    pub turn_deadline: Option<DateTime<Utc>>,
    pub remaining_time: i64,
    pub last_error: Option<String>,
    pub roster_error: Option<String>,
    pub players: Vec<PlayerRow>,
    pub pick_history: Vec<Pick>,
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// The complete application state, exclusively owned by the event loop.
pub struct AppState {
    pub session: DraftSession,
    pub players: PlayerRepository,
    pub filter: ViewFilter,
    pub connection_status: ConnectionStatus,
    /// The local participant's identifier from the join call. Comparing
    /// it against `session.current_turn` is the sole may-I-act signal.
    pub participant_id: i64,
    api: ApiClient,
    db: LocalStore,
    roster_tx: mpsc::Sender<RosterEvent>,
    /// Event id known before any protocol event arrives (remembered
    /// session or join response).
    event_id_hint: Option<i64>,
    /// Event the latest roster fetch was issued for, so each event id
    /// triggers at most one automatic load.
    roster_requested_for: Option<i64>,
}

impl AppState {
    pub fn new(
        api: ApiClient,
        db: LocalStore,
        participant_id: i64,
        event_id_hint: Option<i64>,
        roster_tx: mpsc::Sender<RosterEvent>,
    ) -> Self {
        Self {
            session: DraftSession::new(),
            players: PlayerRepository::new(),
            filter: ViewFilter::default(),
            connection_status: ConnectionStatus::Disconnected,
            participant_id,
            api,
            db,
            roster_tx,
            event_id_hint,
            roster_requested_for: None,
        }
    }

    /// The event id everything is scoped to: the mirrored one once the
    /// authority has spoken, else the remembered/join hint.
    pub fn active_event_id(&self) -> Option<i64> {
        self.session.event_id.or(self.event_id_hint)
    }

    /// Handle one raw text frame from the connection. Malformed frames
    /// and unknown tags are logged and ignored; they never mutate state.
    pub fn handle_frame(&mut self, raw: &str) {
        let Some(event) = decode_event(raw) else {
            warn!(frame = raw, "ignoring unrecognized frame");
            return;
        };
        self.session.apply(event);
        self.after_session_change();
    }

    /// Housekeeping after the session mirror moved: remember the draft we
    /// are in and make sure a roster fetch is in flight for it.
    fn after_session_change(&mut self) {
        if let Some(event_id) = self.session.event_id {
            if self.event_id_hint != Some(event_id) {
                self.event_id_hint = Some(event_id);
                if let Err(e) = self.db.remember_session(event_id, self.participant_id) {
                    warn!("failed to persist remembered session: {e}");
                }
            }
        }
        self.maybe_request_roster();
    }

    /// Kick off a roster load for the active event unless one was already
    /// requested for it. Repeat loads for the same event may race; the
    /// repository's wholesale replacement makes the last writer win.
    pub fn maybe_request_roster(&mut self) {
        let Some(event_id) = self.active_event_id() else {
            return;
        };
        if self.roster_requested_for == Some(event_id) {
            return;
        }
        self.roster_requested_for = Some(event_id);
        players::spawn_load(self.api.clone(), event_id, self.roster_tx.clone());
    }

    pub fn handle_roster_event(&mut self, event: RosterEvent) {
        self.players.apply(event);
    }

    pub fn handle_connection_status(&mut self, status: ConnectionStatus) {
        if status == ConnectionStatus::Connected
            && self.connection_status != ConnectionStatus::Connected
        {
            // Historical continuity cannot be assumed across a connect;
            // the authority follows with a full draft_state resync.
            info!("connected; awaiting full state resync");
        }
        self.connection_status = status;
    }

    /// Apply a user command to local state, returning the wire command to
    /// send when the action belongs to the authority. `LeaveDraft` and
    /// `Quit` are resolved by the caller.
    pub fn handle_command(&mut self, command: UserCommand) -> Option<ClientCommand> {
        match command {
            UserCommand::StartDraft {
                pick_order,
                total_rounds,
                timer_duration,
            } => {
                let Some(draft_id) = self.active_event_id() else {
                    warn!("cannot start draft: no active event");
                    return None;
                };
                Some(ClientCommand::StartDraft {
                    draft_id,
                    pick_order,
                    total_rounds,
                    timer_duration,
                    available_entities: self.players.players().iter().map(|p| p.id).collect(),
                })
            }
            UserCommand::MakePick { player_id } => {
                if !self.session.is_on_the_clock(self.participant_id) {
                    // Send anyway: the authority is the arbiter and will
                    // answer with an error event if this is out of turn.
                    warn!(player_id, "making a pick while not on the clock");
                }
                Some(ClientCommand::MakePick {
                    participant_id: self.participant_id,
                    player_id,
                })
            }
            UserCommand::PauseDraft => Some(ClientCommand::PauseDraft {}),
            UserCommand::ResumeDraft => Some(ClientCommand::ResumeDraft {}),
            UserCommand::SetQuery(query) => {
                self.filter.query = query;
                None
            }
            UserCommand::SetScope(scope) => {
                self.filter.scope = scope;
                None
            }
            UserCommand::ToggleCategory(code) => {
                self.filter.toggle_category(&code);
                None
            }
            UserCommand::ToggleSort(field) => {
                self.filter.toggle_sort(field);
                None
            }
            UserCommand::ReloadRoster => {
                self.roster_requested_for = None;
                self.maybe_request_roster();
                None
            }
            UserCommand::LeaveDraft | UserCommand::Quit => None,
        }
    }

    /// Abandon the active draft: the explicit reset that clears mirrored
    /// state, as opposed to a disconnect, which leaves it intact.
    pub fn leave_draft(&mut self) {
        info!("leaving draft");
        self.session.reset();
        self.players.clear();
        self.filter = ViewFilter::default();
        self.event_id_hint = None;
        self.roster_requested_for = None;
        if let Err(e) = self.db.forget_session() {
            warn!("failed to clear remembered session: {e}");
        }
    }

    /// Capture the full presentation state in one snapshot.
    pub fn build_snapshot(&self) -> DraftSnapshot {
        let roster = self.players.players();
        let pool = self.session.available_player_ids.as_ref();
        let taken = view::taken_ids(roster, pool);
        let players = view::derive(roster, pool, &self.filter)
            .into_iter()
            .map(|p| PlayerRow {
                taken: taken.contains(&p.id),
                player: p.clone(),
            })
            .collect();

        DraftSnapshot {
            connection: self.connection_status,
            status: self.session.status,
            event_id: self.active_event_id(),
            current_turn: self.session.current_turn,
            my_turn: self.session.is_on_the_clock(self.participant_id),
            picks_until_turn: self.session.turns_until(self.participant_id),
            round_number: self.session.round_number,
            total_rounds: self.session.total_rounds,
            turn_deadline: self
                .session
                .turn_deadline
                .and_then(|secs| DateTime::from_timestamp(secs, 0)),
            remaining_time: self.session.remaining_time,
            last_error: self.session.last_error.clone(),
            roster_error: self.players.last_error().map(str::to_string),
            players,
            pick_history: self.session.pick_history.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

/// Run the application event loop.
///
/// Listens on three channels with `tokio::select!`: connection events,
/// roster load outcomes, and user commands. Every handled item is
/// followed by a fresh snapshot on `ui_tx`, so dependents always observe
/// the post-event state before the next event is processed.
pub async fn run(
    mut ws: WsClient,
    mut ws_rx: mpsc::Receiver<WsEvent>,
    mut roster_rx: mpsc::Receiver<RosterEvent>,
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    ui_tx: mpsc::Sender<DraftSnapshot>,
    mut state: AppState,
) -> anyhow::Result<()> {
    info!("application event loop started");

    ws.connect();
    state.maybe_request_roster();
    let _ = ui_tx.send(state.build_snapshot()).await;

    loop {
        tokio::select! {
            ws_event = ws_rx.recv() => {
                match ws_event {
                    Some(WsEvent::Status(status)) => {
                        state.handle_connection_status(status);
                    }
                    Some(WsEvent::Message(raw)) => {
                        state.handle_frame(&raw);
                    }
                    None => {
                        info!("connection channel closed, shutting down");
                        break;
                    }
                }
                let _ = ui_tx.send(state.build_snapshot()).await;
            }

            roster_event = roster_rx.recv() => {
                match roster_event {
                    Some(event) => state.handle_roster_event(event),
                    None => {
                        info!("roster channel closed, shutting down");
                        break;
                    }
                }
                let _ = ui_tx.send(state.build_snapshot()).await;
            }

            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UserCommand::Quit) => {
                        info!("quit command received, shutting down");
                        break;
                    }
                    Some(UserCommand::LeaveDraft) => {
                        state.leave_draft();
                        ws.disconnect();
                    }
                    Some(cmd) => {
                        if let Some(outbound) = state.handle_command(cmd) {
                            if !ws.send(&outbound) {
                                warn!(?outbound, "dropping command: not connected");
                            }
                        }
                    }
                    None => {
                        info!("command channel closed, shutting down");
                        break;
                    }
                }
                let _ = ui_tx.send(state.build_snapshot()).await;
            }
        }
    }

    ws.disconnect();
    info!("application event loop exiting");
    Ok(())
}
