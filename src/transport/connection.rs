//! WebSocket connection and event loop.
//!
//! Each accepted socket gets one [`Connection`] handle, stored in the
//! [`ConnectionPool`], and one event loop task that owns the socket.
//!
//! # Event Loop
//!
//! The loop handles:
//!
//! - Incoming text frames, decoded into [`ClientCommand`]s for the hub
//! - Outgoing [`ServerEvent`]s queued through the handle
//! - Close, error or end of stream, which deregisters the connection and
//!   reports the disconnect

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, trace, warn};

use crate::identifiers::ConnectionId;
use crate::protocol::{ClientCommand, ServerEvent};

use super::hub::HubHandle;
use super::pool::ConnectionPool;

// ============================================================================
// Types
// ============================================================================

/// Write half of an accepted WebSocket.
type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;

// ============================================================================
// Outbound
// ============================================================================

/// Internal commands for the event loop.
#[derive(Debug)]
pub(crate) enum Outbound {
    /// Write a notification to the socket.
    Event(ServerEvent),
    /// Close the socket.
    Shutdown,
}

// ============================================================================
// Connection
// ============================================================================

/// Handle to one client socket.
///
/// Cheap to clone. Sending never blocks; events queued after the loop has
/// ended are dropped.
#[derive(Debug, Clone)]
pub struct Connection {
    /// Identity assigned at accept time.
    id: ConnectionId,
    /// Channel into the event loop.
    outbound_tx: mpsc::UnboundedSender<Outbound>,
}

impl Connection {
    /// Creates a handle and the receiver its event loop will drain.
    pub(crate) fn open(id: ConnectionId) -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        (Self { id, outbound_tx }, outbound_rx)
    }

    /// Returns the connection identity.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queues a notification. Returns `false` if the socket is gone.
    pub fn send(&self, event: ServerEvent) -> bool {
        self.outbound_tx.send(Outbound::Event(event)).is_ok()
    }

    /// Asks the event loop to close the socket.
    pub fn shutdown(&self) {
        let _ = self.outbound_tx.send(Outbound::Shutdown);
    }

    /// Event loop that handles WebSocket I/O until the socket closes.
    pub(crate) async fn run_event_loop(
        ws_stream: WebSocketStream<TcpStream>,
        id: ConnectionId,
        mut outbound_rx: mpsc::UnboundedReceiver<Outbound>,
        hub: HubHandle,
        pool: Arc<ConnectionPool>,
    ) {
        let (mut ws_write, mut ws_read) = ws_stream.split();

        loop {
            tokio::select! {
                // Frames from the client
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            if !Self::handle_incoming_message(id, text.as_str(), &hub) {
                                debug!(connection = %id, "Hub stopped, closing socket");
                                let _ = ws_write.close().await;
                                break;
                            }
                        }

                        Some(Ok(Message::Close(_))) => {
                            debug!(connection = %id, "WebSocket closed by client");
                            break;
                        }

                        Some(Err(e)) => {
                            debug!(connection = %id, error = %e, "WebSocket error");
                            break;
                        }

                        None => {
                            debug!(connection = %id, "WebSocket stream ended");
                            break;
                        }

                        // Ignore Binary, Ping, Pong
                        _ => {}
                    }
                }

                // Notifications from the hub
                outbound = outbound_rx.recv() => {
                    match outbound {
                        Some(Outbound::Event(event)) => {
                            if !Self::handle_outgoing_event(id, &event, &mut ws_write).await {
                                break;
                            }
                        }

                        Some(Outbound::Shutdown) => {
                            debug!(connection = %id, "Shutdown command received");
                            let _ = ws_write.close().await;
                            break;
                        }

                        None => {
                            debug!(connection = %id, "Outbound channel closed");
                            break;
                        }
                    }
                }
            }
        }

        // Deregister before reporting, so the core already sees the
        // identity as stale while the disconnect is queued.
        pool.remove(id);
        let _ = hub.disconnect(id);

        debug!(connection = %id, "Event loop terminated");
    }

    /// Decodes a client frame and forwards it to the hub.
    ///
    /// Undecodable frames are skipped. Returns `false` if the hub is gone.
    fn handle_incoming_message(id: ConnectionId, text: &str, hub: &HubHandle) -> bool {
        let command = match ClientCommand::decode(text) {
            Ok(command) => command,
            Err(e) => {
                warn!(connection = %id, error = %e, "Ignoring undecodable frame");
                return true;
            }
        };

        trace!(connection = %id, command = command.name(), "Frame received");
        hub.dispatch(id, command).is_ok()
    }

    /// Writes one notification. Returns `false` if the socket failed.
    async fn handle_outgoing_event(
        id: ConnectionId,
        event: &ServerEvent,
        ws_write: &mut WsSink,
    ) -> bool {
        let json = match event.encode() {
            Ok(json) => json,
            Err(e) => {
                warn!(connection = %id, error = %e, "Failed to encode event");
                return true;
            }
        };

        if let Err(e) = ws_write.send(Message::Text(json.into())).await {
            debug!(connection = %id, error = %e, "Failed to write event");
            return false;
        }

        trace!(connection = %id, event = event.name(), "Event sent");
        true
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_queues_events_in_order() {
        let (connection, mut rx) = Connection::open(ConnectionId::generate());

        assert!(connection.send(ServerEvent::Waiting));
        assert!(connection.send(ServerEvent::PartnerFound));
        connection.shutdown();

        assert!(matches!(rx.recv().await, Some(Outbound::Event(ServerEvent::Waiting))));
        assert!(matches!(rx.recv().await, Some(Outbound::Event(ServerEvent::PartnerFound))));
        assert!(matches!(rx.recv().await, Some(Outbound::Shutdown)));
    }

    #[test]
    fn test_send_after_loop_ended() {
        let (connection, rx) = Connection::open(ConnectionId::generate());
        drop(rx);

        assert!(!connection.send(ServerEvent::Idle));
    }

    #[test]
    fn test_clone_keeps_identity() {
        let (connection, _rx) = Connection::open(ConnectionId::generate());
        assert_eq!(connection.clone().id(), connection.id());
    }
}
