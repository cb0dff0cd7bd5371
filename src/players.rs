// The held roster of draftable players for the active event.
//
// The roster is fetched once per event from the resource endpoint and
// replaced wholesale on success — the authority owns membership, there is
// no incremental merge. A failed refresh keeps whatever roster was already
// held and records the reason.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::protocol::Player;

/// Outcome of an asynchronous roster load, delivered to the app loop.
#[derive(Debug, Clone)]
pub enum RosterEvent {
    Loaded { event_id: i64, players: Vec<Player> },
    Failed { event_id: i64, message: String },
}

/// Holds the roster for the active event.
#[derive(Debug, Default)]
pub struct PlayerRepository {
    players: Vec<Player>,
    last_error: Option<String>,
}

impl PlayerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// The full held roster, in the order the authority returned it.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Reason the most recent load failed, if it did.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Fold a load outcome into the repository. Two loads for the same
    /// event may race; whichever lands last wins, which is safe because
    /// each success is a full replacement.
    pub fn apply(&mut self, event: RosterEvent) {
        match event {
            RosterEvent::Loaded { event_id, players } => {
                info!(event_id, count = players.len(), "roster loaded");
                self.players = players;
                self.last_error = None;
            }
            RosterEvent::Failed { event_id, message } => {
                warn!(event_id, %message, "roster load failed; keeping previous roster");
                self.last_error = Some(message);
            }
        }
    }

    /// Drop the held roster (used when leaving a draft).
    pub fn clear(&mut self) {
        self.players.clear();
        self.last_error = None;
    }
}

/// Spawn a single-attempt roster fetch, delivering the outcome through
/// `tx`. The caller decides if and when to try again.
pub fn spawn_load(
    api: ApiClient,
    event_id: i64,
    tx: mpsc::Sender<RosterEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let event = match api.event_players(event_id).await {
            Ok(players) => RosterEvent::Loaded { event_id, players },
            Err(e) => RosterEvent::Failed {
                event_id,
                message: e.to_string(),
            },
        };
        let _ = tx.send(event).await;
    })
}
