// Wire types shared with the draft authority: inbound events, outbound
// commands, and the REST resource records.
//
// The authority speaks a camelCase dialect with `…ID` suffixes and calls
// draftable items "entities"; everywhere else in this crate they are
// players. The translation happens once, here, through serde renames.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// REST resource records
// ---------------------------------------------------------------------------

/// A draftable player as returned by the roster endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: i64,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    /// Status flag (e.g. "active", "amateur"). Display only.
    pub status: String,
    #[serde(rename = "categoryCode")]
    pub category_code: String,
}

impl Player {
    /// Full display name, the string the free-text filter matches against.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A participant record as returned by the join endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: i64,
    #[serde(rename = "draftID")]
    pub draft_id: i64,
    #[serde(rename = "displayName")]
    pub display_name: String,
    #[serde(rename = "createdAt")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Request body for the one-time join call.
#[derive(Debug, Clone, Serialize)]
pub struct JoinRequest {
    #[serde(rename = "displayName")]
    pub display_name: String,
    pub passkey: String,
}

// ---------------------------------------------------------------------------
// Draft state shared shapes
// ---------------------------------------------------------------------------

/// One resolved selection, both as carried in `draft_state.pickHistory`
/// and as appended locally from `pick_made` deltas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pick {
    #[serde(rename = "participantID")]
    pub participant_id: i64,
    #[serde(rename = "entityID")]
    pub player_id: i64,
    #[serde(rename = "pickNumber")]
    pub pick_number: u32,
    pub round: u32,
    /// True when the authority forfeited the turn (timer expiry auto-pick).
    #[serde(rename = "autoSelected")]
    pub auto_selected: bool,
}

/// Draft status as spelled on the wire inside `draft_state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireStatus {
    InProgress,
    Paused,
    Completed,
}

/// Full-resync payload. Every field overwrites the mirrored session
/// wholesale; `availableEntities` is nullable on the wire and the null is
/// meaningful (no authoritative pool yet, as opposed to an empty one).
#[derive(Debug, Clone, Deserialize)]
pub struct ResyncPayload {
    #[serde(rename = "eventID")]
    pub event_id: i64,
    pub status: WireStatus,
    #[serde(rename = "currentTurn")]
    pub current_turn: Option<i64>,
    #[serde(rename = "roundNumber")]
    pub round_number: u32,
    #[serde(rename = "currentPickIndex")]
    pub current_pick_index: u32,
    #[serde(rename = "totalRounds")]
    pub total_rounds: u32,
    #[serde(rename = "pickOrder")]
    pub pick_order: Vec<i64>,
    #[serde(rename = "availableEntities")]
    pub available_entities: Option<Vec<i64>>,
    #[serde(rename = "turnDeadline")]
    pub turn_deadline: Option<i64>,
    #[serde(rename = "remainingTime", default)]
    pub remaining_time: i64,
    #[serde(rename = "pickHistory", default)]
    pub pick_history: Vec<Pick>,
}

// ---------------------------------------------------------------------------
// Inbound events (authority -> client)
// ---------------------------------------------------------------------------

/// A protocol event received from the authority, discriminated by the
/// `type` tag. The set is closed; frames with an unrecognized tag fail to
/// decode and are dropped at the boundary (see [`decode_event`]).
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    #[serde(rename = "draft_started")]
    DraftStarted {
        #[serde(rename = "eventID")]
        event_id: i64,
        #[serde(rename = "currentTurn")]
        current_turn: i64,
        #[serde(rename = "roundNumber")]
        round_number: u32,
        #[serde(rename = "turnDeadline")]
        turn_deadline: i64,
    },
    #[serde(rename = "draft_state")]
    DraftState(ResyncPayload),
    #[serde(rename = "pick_made")]
    PickMade {
        #[serde(rename = "participantID")]
        participant_id: i64,
        #[serde(rename = "entityID")]
        player_id: i64,
        round: u32,
        #[serde(rename = "autoSelected")]
        auto_selected: bool,
    },
    #[serde(rename = "turn_changed")]
    TurnChanged {
        #[serde(rename = "currentTurn")]
        current_turn: i64,
        #[serde(rename = "roundNumber")]
        round_number: u32,
        #[serde(rename = "turnDeadline")]
        turn_deadline: i64,
    },
    #[serde(rename = "draft_completed")]
    DraftCompleted {
        #[serde(rename = "eventID")]
        event_id: i64,
        #[serde(rename = "totalRounds")]
        total_rounds: u32,
    },
    #[serde(rename = "draft_paused")]
    DraftPaused {
        #[serde(rename = "remainingTime")]
        remaining_time: i64,
    },
    #[serde(rename = "draft_resumed")]
    DraftResumed {
        #[serde(rename = "currentTurn")]
        current_turn: i64,
        #[serde(rename = "roundNumber")]
        round_number: u32,
        #[serde(rename = "turnDeadline")]
        turn_deadline: i64,
    },
    #[serde(rename = "error")]
    Error { error: String },
}

/// Decode a raw text frame into a [`ServerEvent`].
///
/// Returns `None` for malformed JSON and for unknown `type` tags — an
/// unrecognized tag indicates version skew, not a state change, so the
/// frame must never mutate the session. Callers log and move on.
pub fn decode_event(raw: &str) -> Option<ServerEvent> {
    serde_json::from_str(raw).ok()
}

// ---------------------------------------------------------------------------
// Outbound commands (client -> authority)
// ---------------------------------------------------------------------------

/// A command sent to the authority over the live connection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ClientCommand {
    #[serde(rename = "start_draft")]
    StartDraft {
        #[serde(rename = "draftID")]
        draft_id: i64,
        #[serde(rename = "pickOrder")]
        pick_order: Vec<i64>,
        #[serde(rename = "totalRounds")]
        total_rounds: u32,
        #[serde(rename = "timerDuration")]
        timer_duration: u32,
        #[serde(rename = "availableEntities")]
        available_entities: Vec<i64>,
    },
    #[serde(rename = "make_pick")]
    MakePick {
        #[serde(rename = "participantID")]
        participant_id: i64,
        #[serde(rename = "entityID")]
        player_id: i64,
    },
    #[serde(rename = "pause_draft")]
    PauseDraft {},
    #[serde(rename = "resume_draft")]
    ResumeDraft {},
}

impl ClientCommand {
    /// Serialize for the wire. Infallible for this closed set of shapes.
    pub fn to_wire(&self) -> String {
        serde_json::to_string(self).expect("client command serialization cannot fail")
    }
}

// ---------------------------------------------------------------------------
// Connection status
// ---------------------------------------------------------------------------

/// Transport connection status as surfaced to the rest of the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
}
