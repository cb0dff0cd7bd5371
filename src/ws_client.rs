// WebSocket connection to the draft authority.
//
// Owns the connect/disconnect lifecycle and forwards received frames to
// the application layer in transport order. No reconnect or backoff
// policy lives here — callers observe status events and decide when to
// call `connect` again. After a fresh connect the authority is expected
// to send a full `draft_state` resync; this module only carries frames.

use futures_util::{SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{info, warn};

use crate::protocol::{ClientCommand, ConnectionStatus};

/// Events emitted by the connection to the application layer.
#[derive(Debug, Clone, PartialEq)]
pub enum WsEvent {
    /// The connection status changed.
    Status(ConnectionStatus),
    /// A text frame was received (raw JSON string), in transport order.
    Message(String),
}

/// Client side of the authority connection.
pub struct WsClient {
    url: String,
    events: mpsc::Sender<WsEvent>,
    task: Option<JoinHandle<()>>,
    outbound: Option<mpsc::Sender<Message>>,
}

impl WsClient {
    pub fn new(url: &str, events: mpsc::Sender<WsEvent>) -> Self {
        Self {
            url: url.to_string(),
            events,
            task: None,
            outbound: None,
        }
    }

    /// Whether a connection task is currently alive (connecting or
    /// connected).
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Open the connection. A no-op when already connecting or connected.
    ///
    /// Status transitions and received frames are delivered through the
    /// event channel; the task emits a final `Disconnected` when the
    /// connection ends for any reason.
    pub fn connect(&mut self) {
        if self.is_active() {
            return;
        }

        let url = self.url.clone();
        let events = self.events.clone();
        let (out_tx, mut out_rx) = mpsc::channel::<Message>(64);
        self.outbound = Some(out_tx);

        self.task = Some(tokio::spawn(async move {
            let _ = events
                .send(WsEvent::Status(ConnectionStatus::Connecting))
                .await;

            let stream = match connect_async(url.as_str()).await {
                Ok((stream, _)) => stream,
                Err(e) => {
                    warn!(%url, "connection failed: {e}");
                    let _ = events
                        .send(WsEvent::Status(ConnectionStatus::Disconnected))
                        .await;
                    return;
                }
            };
            info!(%url, "connected");
            let _ = events
                .send(WsEvent::Status(ConnectionStatus::Connected))
                .await;

            let (mut write, read) = stream.split();
            let writer = tokio::spawn(async move {
                while let Some(msg) = out_rx.recv().await {
                    if write.send(msg).await.is_err() {
                        break;
                    }
                }
            });

            let _ = process_message_stream(read, &events).await;
            writer.abort();

            let _ = events
                .send(WsEvent::Status(ConnectionStatus::Disconnected))
                .await;
        }));
    }

    /// Tear down the connection. A no-op when already disconnected.
    /// Mirrored draft state is deliberately untouched — only an explicit
    /// session reset clears it.
    pub fn disconnect(&mut self) {
        self.outbound = None;
        let Some(task) = self.task.take() else {
            return;
        };
        if task.is_finished() {
            // The task already emitted its final Disconnected.
            return;
        }
        task.abort();
        let _ = self
            .events
            .try_send(WsEvent::Status(ConnectionStatus::Disconnected));
    }

    /// Queue a command for the authority. Returns false when there is no
    /// live connection to send on.
    pub fn send(&self, command: &ClientCommand) -> bool {
        match &self.outbound {
            Some(out) => out.try_send(Message::Text(command.to_wire().into())).is_ok(),
            None => false,
        }
    }
}

/// Forward raw WebSocket messages from any [`Stream`] through `tx`,
/// preserving order. Stops on a close frame or a stream error. Returns
/// `Err(())` when the channel is closed (receiver dropped), signalling
/// the caller to stop.
///
/// Generic over the stream type so ordering behavior is testable with
/// in-memory streams, no sockets involved.
pub async fn process_message_stream<St>(
    mut stream: St,
    tx: &mpsc::Sender<WsEvent>,
) -> Result<(), ()>
where
    St: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    while let Some(msg_result) = stream.next().await {
        match msg_result {
            Ok(Message::Text(text)) => {
                if tx.send(WsEvent::Message(text.to_string())).await.is_err() {
                    return Err(());
                }
            }
            Ok(Message::Close(_)) => {
                info!("authority sent close frame");
                break;
            }
            Err(e) => {
                warn!("websocket error: {e}");
                break;
            }
            _ => {
                // Ignore Binary, Ping, Pong, Frame variants.
            }
        }
    }
    Ok(())
}
