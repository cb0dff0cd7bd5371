// Draft room client entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, keep stdout for status output)
// 2. Load config
// 3. Open the local store, look for a remembered draft session
// 4. Join the draft if nothing is remembered
// 5. Create mpsc channels
// 6. Spawn the app event loop
// 7. Print snapshots until Ctrl+C

use draft_room::api::ApiClient;
use draft_room::app::{self, AppState, DraftSnapshot, UserCommand};
use draft_room::config;
use draft_room::db::LocalStore;
use draft_room::ws_client::WsClient;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;
    info!("draft room client starting up");

    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "config loaded: api={}, ws={}",
        config.server.api_url, config.server.ws_url
    );

    let db = LocalStore::open(&config.db_path).context("failed to open local store")?;
    let api = ApiClient::new(&config.server.api_url);

    // Rejoin the remembered draft, or join fresh with the configured
    // credentials.
    let (participant_id, event_id) = match db.remembered_session()? {
        Some(remembered) => {
            info!(
                "resuming remembered draft: event {} as participant {}",
                remembered.event_id, remembered.participant_id
            );
            (remembered.participant_id, Some(remembered.event_id))
        }
        None => {
            let participant = api
                .join(&config.session.display_name, &config.session.passkey)
                .await
                .context("failed to join draft")?;
            info!(
                "joined draft {} as participant {} ({})",
                participant.draft_id, participant.id, participant.display_name
            );
            db.remember_session(participant.draft_id, participant.id)?;
            (participant.id, Some(participant.draft_id))
        }
    };

    let (ws_tx, ws_rx) = mpsc::channel(256);
    let (roster_tx, roster_rx) = mpsc::channel(64);
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (ui_tx, mut ui_rx) = mpsc::channel(256);

    let ws = WsClient::new(&config.server.ws_url, ws_tx);
    let state = AppState::new(api, db, participant_id, event_id, roster_tx);

    let app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(ws, ws_rx, roster_rx, cmd_rx, ui_tx, state).await {
            error!("application loop error: {e}");
        }
    });

    // Status printer: the stand-in for a real presentation layer.
    loop {
        tokio::select! {
            snapshot = ui_rx.recv() => {
                match snapshot {
                    Some(snapshot) => print_snapshot(&snapshot, participant_id),
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received, shutting down");
                let _ = cmd_tx.send(UserCommand::Quit).await;
                break;
            }
        }
    }

    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), app_handle).await;
    info!("draft room client shut down cleanly");
    Ok(())
}

fn print_snapshot(snapshot: &DraftSnapshot, participant_id: i64) {
    let turn = match snapshot.current_turn {
        Some(id) if snapshot.my_turn => format!("participant {id} (you)"),
        Some(id) => format!("participant {id}"),
        None => "-".to_string(),
    };
    println!(
        "[{:?}] draft {:?} round {}/{} | turn: {} | picks: {} | showing {} players{}",
        snapshot.connection,
        snapshot.status,
        snapshot.round_number,
        snapshot.total_rounds,
        turn,
        snapshot.pick_history.len(),
        snapshot.players.len(),
        snapshot
            .last_error
            .as_deref()
            .map(|e| format!(" | error: {e}"))
            .unwrap_or_default(),
    );
    if let Some(deadline) = snapshot.turn_deadline {
        if snapshot.my_turn {
            println!("  your pick is due by {}", deadline.to_rfc3339());
        } else if let Some(n) = snapshot.picks_until_turn {
            println!("  {n} picks until participant {participant_id} is up");
        }
    }
}

/// Initialize tracing to a log file, keeping stdout free for the status
/// printer.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;
    let log_file = std::fs::File::create(log_dir.join("draftroom.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("draft_room=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
