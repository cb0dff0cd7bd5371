// Mirrored draft session state and the reducer that folds authority
// events into it.
//
// The session is a client-side mirror of the authority's draft state. The
// reducer applies every event best-effort to whatever fields the event
// names rather than rejecting events whose preconditions don't hold: the
// transport may redeliver or reorder frames around a reconnect, and
// `draft_state` exists as an idempotent full resync that heals any
// divergence the incremental deltas leave behind.

use std::collections::HashSet;

use serde::Serialize;
use tracing::warn;

use crate::protocol::{Pick, ResyncPayload, ServerEvent, WireStatus};

/// Lifecycle status of the mirrored draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftStatus {
    /// No draft data yet, or explicitly reset after leaving a draft.
    #[default]
    Idle,
    InProgress,
    Paused,
    Completed,
}

impl From<WireStatus> for DraftStatus {
    fn from(status: WireStatus) -> Self {
        match status {
            WireStatus::InProgress => DraftStatus::InProgress,
            WireStatus::Paused => DraftStatus::Paused,
            WireStatus::Completed => DraftStatus::Completed,
        }
    }
}

/// The complete mirrored state of one draft.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DraftSession {
    pub status: DraftStatus,
    /// Identifier of the draft event; set once per session, only a resync
    /// or an explicit reset changes it.
    pub event_id: Option<i64>,
    /// Participant allowed to act now. Only meaningful while in progress.
    pub current_turn: Option<i64>,
    /// 1-based round counter.
    pub round_number: u32,
    pub total_rounds: u32,
    /// Position within the rotation of `pick_order`.
    pub current_pick_index: u32,
    /// Participant order for the draft, fixed once the draft starts.
    pub pick_order: Vec<i64>,
    /// Players not yet selected. `None` means no authoritative pool has
    /// arrived yet — distinct from an empty pool, which means the
    /// authority says nothing is left.
    pub available_player_ids: Option<HashSet<i64>>,
    /// Append-only selection history; never reordered or truncated except
    /// by a full resync.
    pub pick_history: Vec<Pick>,
    /// Unix seconds after which the authority may forfeit the current
    /// turn. Advisory, for display — the client never enforces it.
    pub turn_deadline: Option<i64>,
    /// Authority-reported seconds left on the frozen clock while paused.
    pub remaining_time: i64,
    /// Most recent authority-reported error. Informational only; cleared
    /// by the next state-affecting event.
    pub last_error: Option<String>,
}

impl DraftSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the given participant may act right now. A pure read — the
    /// single signal the UI uses to enable the pick action.
    pub fn is_on_the_clock(&self, participant_id: i64) -> bool {
        self.status == DraftStatus::InProgress && self.current_turn == Some(participant_id)
    }

    /// Fold one authority event into the session.
    ///
    /// Every arm applies unconditionally to the fields it names. The
    /// `error` event is the one exception to the last-error clearing rule:
    /// it records the message and touches nothing else.
    pub fn apply(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::DraftStarted {
                event_id,
                current_turn,
                round_number,
                turn_deadline,
            } => {
                if self.status != DraftStatus::Idle {
                    warn!(status = ?self.status, "draft_started received while not idle");
                }
                self.status = DraftStatus::InProgress;
                self.event_id = Some(event_id);
                self.current_turn = Some(current_turn);
                self.round_number = round_number;
                self.turn_deadline = Some(turn_deadline);
                self.last_error = None;
            }
            ServerEvent::DraftState(payload) => self.resync(payload),
            ServerEvent::PickMade {
                participant_id,
                player_id,
                round,
                auto_selected,
            } => {
                if self.status != DraftStatus::InProgress {
                    warn!(status = ?self.status, player_id, "pick_made received while not in progress");
                }
                self.pick_history.push(Pick {
                    participant_id,
                    player_id,
                    pick_number: self.pick_history.len() as u32 + 1,
                    round,
                    auto_selected,
                });
                // A pool that hasn't arrived yet stays absent; the next
                // resync carries the authoritative membership.
                if let Some(pool) = self.available_player_ids.as_mut() {
                    pool.remove(&player_id);
                }
                self.last_error = None;
            }
            ServerEvent::TurnChanged {
                current_turn,
                round_number,
                turn_deadline,
            } => {
                self.current_turn = Some(current_turn);
                self.round_number = round_number;
                self.turn_deadline = Some(turn_deadline);
                self.last_error = None;
            }
            ServerEvent::DraftCompleted {
                event_id,
                total_rounds,
            } => {
                self.status = DraftStatus::Completed;
                self.event_id = Some(event_id);
                self.total_rounds = total_rounds;
                self.last_error = None;
            }
            ServerEvent::DraftPaused { remaining_time } => {
                self.status = DraftStatus::Paused;
                self.remaining_time = remaining_time;
                self.last_error = None;
            }
            ServerEvent::DraftResumed {
                current_turn,
                round_number,
                turn_deadline,
            } => {
                self.status = DraftStatus::InProgress;
                self.current_turn = Some(current_turn);
                self.round_number = round_number;
                self.turn_deadline = Some(turn_deadline);
                self.last_error = None;
            }
            ServerEvent::Error { error } => {
                self.last_error = Some(error);
            }
        }
    }

    /// Overwrite every mirrored field from a full-state payload. Applying
    /// the same payload twice yields the same state both times.
    fn resync(&mut self, payload: ResyncPayload) {
        self.status = payload.status.into();
        self.event_id = Some(payload.event_id);
        self.current_turn = payload.current_turn;
        self.round_number = payload.round_number;
        self.total_rounds = payload.total_rounds;
        self.current_pick_index = payload.current_pick_index;
        self.pick_order = payload.pick_order;
        self.available_player_ids = payload
            .available_entities
            .map(|ids| ids.into_iter().collect());
        self.pick_history = payload.pick_history;
        self.turn_deadline = payload.turn_deadline;
        self.remaining_time = payload.remaining_time;
        self.last_error = None;
    }

    /// Revert to the idle initial state. The only operation that clears
    /// mirrored state — a dropped connection deliberately does not.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Picks remaining until it is `participant_id`'s turn, following the
    /// authority's snake rotation (odd rounds walk `pick_order` forward,
    /// even rounds backward). Display only; `current_turn` from the wire
    /// is always what decides who may act.
    pub fn turns_until(&self, participant_id: i64) -> Option<u32> {
        if self.status != DraftStatus::InProgress || self.pick_order.is_empty() {
            return None;
        }
        let seats = self.pick_order.len() as u32;
        let total_picks = seats * self.total_rounds;
        for index in self.current_pick_index..total_picks.max(self.current_pick_index) {
            if self.pick_order[snake_seat(index, seats) as usize] == participant_id {
                return Some(index - self.current_pick_index);
            }
        }
        None
    }
}

/// Seat position in `pick_order` for the given overall pick index under
/// snake rotation: 0,1,2,3, 3,2,1,0, 0,1,2,3, …
fn snake_seat(pick_index: u32, seats: u32) -> u32 {
    let round = pick_index / seats + 1;
    let offset = pick_index % seats;
    if round % 2 == 1 {
        offset
    } else {
        seats - 1 - offset
    }
}
