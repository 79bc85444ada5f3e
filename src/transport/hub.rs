//! Single owner of the matchmaking state.
//!
//! Every connect, client command, disconnect and window reset is sent to
//! one hub task and applied to the [`Controller`] one at a time, so pool
//! and pairing mutations never interleave. The hub then carries out the
//! returned effects: notifications go to the [`ConnectionPool`], window
//! resets become abortable sleep tasks.
//!
//! ```text
//!  socket loops ──┐                       ┌──► ConnectionPool::notify
//!                 ├──► HubCommand ──► Hub ┤
//!  reset timers ──┘       (mpsc)          └──► spawn / abort reset timers
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use rustc_hash::FxHashMap;
use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, trace};

use crate::chat::{Controller, Effect};
use crate::error::{Error, Result};
use crate::identifiers::{ConnectionId, ResetToken};
use crate::protocol::ClientCommand;

use super::pool::ConnectionPool;

// ============================================================================
// HubCommand
// ============================================================================

/// Events processed by the hub, in arrival order.
#[derive(Debug)]
enum HubCommand {
    /// A socket was accepted and registered.
    Connect(ConnectionId),
    /// A decoded client frame.
    Client {
        id: ConnectionId,
        command: ClientCommand,
    },
    /// A socket closed.
    Disconnect(ConnectionId),
    /// A rate-limit window elapsed.
    WindowElapsed { id: ConnectionId, token: ResetToken },
    /// Stop processing.
    Shutdown,
}

// ============================================================================
// HubHandle
// ============================================================================

/// Sending side of the hub. Cheap to clone.
#[derive(Debug, Clone)]
pub struct HubHandle {
    command_tx: mpsc::UnboundedSender<HubCommand>,
}

impl HubHandle {
    /// Reports a new connection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the hub has stopped.
    pub fn connect(&self, id: ConnectionId) -> Result<()> {
        self.send(HubCommand::Connect(id))
    }

    /// Forwards a client command.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the hub has stopped.
    pub fn dispatch(&self, id: ConnectionId, command: ClientCommand) -> Result<()> {
        self.send(HubCommand::Client { id, command })
    }

    /// Reports a closed connection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the hub has stopped.
    pub fn disconnect(&self, id: ConnectionId) -> Result<()> {
        self.send(HubCommand::Disconnect(id))
    }

    /// Stops the hub after the commands already queued.
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(HubCommand::Shutdown);
    }

    fn send(&self, command: HubCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|_| Error::ConnectionClosed)
    }
}

// ============================================================================
// Hub
// ============================================================================

/// The task owning the [`Controller`].
pub struct Hub {
    /// Matchmaking state.
    controller: Controller<Arc<ConnectionPool>>,
    /// Notification delivery.
    pool: Arc<ConnectionPool>,
    /// Pending window resets by owner.
    timers: FxHashMap<ConnectionId, (ResetToken, AbortHandle)>,
    /// Used by reset timers to post back; weak so the hub stops once every
    /// handle is dropped.
    command_tx: mpsc::WeakUnboundedSender<HubCommand>,
    /// Incoming commands.
    command_rx: mpsc::UnboundedReceiver<HubCommand>,
}

impl Hub {
    /// Spawns the hub task.
    ///
    /// The controller must use `pool` as its liveness registry.
    pub fn spawn(
        controller: Controller<Arc<ConnectionPool>>,
        pool: Arc<ConnectionPool>,
    ) -> (HubHandle, JoinHandle<()>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let hub = Self {
            controller,
            pool,
            timers: FxHashMap::default(),
            command_tx: command_tx.downgrade(),
            command_rx,
        };

        let task = tokio::spawn(hub.run());
        (HubHandle { command_tx }, task)
    }

    /// Processes commands until shutdown.
    async fn run(mut self) {
        debug!("Hub started");

        while let Some(command) = self.command_rx.recv().await {
            let effects = match command {
                HubCommand::Connect(id) => self.controller.connect(id),
                HubCommand::Client { id, command } => self.controller.handle(id, command),
                HubCommand::Disconnect(id) => self.controller.disconnect(id),
                HubCommand::WindowElapsed { id, token } => {
                    self.finish_timer(id, token);
                    self.controller.window_elapsed(id, token);
                    continue;
                }
                HubCommand::Shutdown => {
                    debug!("Shutdown command received");
                    break;
                }
            };

            self.apply(effects);
        }

        for (_, (_, handle)) in self.timers.drain() {
            handle.abort();
        }

        debug!("Hub terminated");
    }

    /// Carries out effects in order.
    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Notify { to, event } => {
                    self.pool.notify(to, event);
                }
                Effect::ScheduleReset {
                    connection,
                    token,
                    after,
                } => self.schedule_reset(connection, token, after),
                Effect::CancelReset { connection, token } => {
                    self.cancel_reset(connection, token);
                }
            }
        }
    }

    /// Starts a timer that reports the window reset back to the hub.
    fn schedule_reset(&mut self, connection: ConnectionId, token: ResetToken, after: Duration) {
        let Some(command_tx) = self.command_tx.upgrade() else {
            return;
        };

        let task = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = command_tx.send(HubCommand::WindowElapsed {
                id: connection,
                token,
            });
        });

        if let Some((_, previous)) = self.timers.insert(connection, (token, task.abort_handle())) {
            previous.abort();
        }

        trace!(connection = %connection, %token, ?after, "Reset scheduled");
    }

    /// Aborts the pending timer of `connection` if it carries `token`.
    fn cancel_reset(&mut self, connection: ConnectionId, token: ResetToken) {
        if let Some((pending, handle)) = self.timers.remove(&connection) {
            if pending == token {
                handle.abort();
                trace!(connection = %connection, %token, "Reset cancelled");
            } else {
                self.timers.insert(connection, (pending, handle));
            }
        }
    }

    /// Forgets a timer that has fired.
    fn finish_timer(&mut self, connection: ConnectionId, token: ResetToken) {
        if self
            .timers
            .get(&connection)
            .is_some_and(|(pending, _)| *pending == token)
        {
            self.timers.remove(&connection);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
