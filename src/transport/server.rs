//! WebSocket chat server.
//!
//! # Connection Flow
//!
//! 1. [`ChatServer::bind`] binds the listener and spawns the hub
//! 2. The accept loop upgrades each TCP stream to WebSocket, with the
//!    configured payload cap
//! 3. The connection is registered in the pool and announced to the hub
//! 4. Its event loop forwards frames until the socket closes

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tracing::{debug, error, info, warn};

use crate::chat::{Controller, ProfanityFilter, Sanitizer};
use crate::config::ServerConfig;
use crate::error::{Error, Result};
use crate::identifiers::ConnectionId;

use super::hub::{Hub, HubHandle};
use super::pool::ConnectionPool;
use super::Connection;

// ============================================================================
// Constants
// ============================================================================

/// How often the accept loop checks the shutdown flag.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(100);

// ============================================================================
// ChatServer
// ============================================================================

/// Accepts WebSocket clients and feeds them to the matchmaking hub.
///
/// # Example
///
/// ```ignore
/// use orion_chat::{ChatServer, ServerConfig};
///
/// let server = ChatServer::bind(ServerConfig::from_env()?).await?;
/// println!("listening on {}", server.ws_url());
///
/// tokio::signal::ctrl_c().await?;
/// server.shutdown().await;
/// ```
pub struct ChatServer {
    /// Address the listener is bound to.
    local_addr: SocketAddr,

    /// Live connections.
    pool: Arc<ConnectionPool>,

    /// Channel into the hub.
    hub: HubHandle,

    /// Per-socket limits.
    ws_config: WebSocketConfig,

    /// Shutdown flag.
    shutdown: AtomicBool,
}

// ============================================================================
// ChatServer - Constructor
// ============================================================================

impl ChatServer {
    /// Binds the server with the default profanity filter.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the configuration is invalid
    /// - [`Error::Io`] if binding fails
    pub async fn bind(config: ServerConfig) -> Result<Arc<Self>> {
        Self::bind_with_sanitizer(config, ProfanityFilter::default()).await
    }

    /// Binds the server with a custom text filter.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the configuration is invalid
    /// - [`Error::Io`] if binding fails
    pub async fn bind_with_sanitizer(
        config: ServerConfig,
        sanitizer: impl Sanitizer + 'static,
    ) -> Result<Arc<Self>> {
        config.validate()?;

        let listener = TcpListener::bind(config.socket_addr()).await?;
        let local_addr = listener.local_addr()?;

        let pool = Arc::new(ConnectionPool::new());
        let controller =
            Controller::new(Arc::clone(&pool), config.chat).with_sanitizer(sanitizer);
        let (hub, _task) = Hub::spawn(controller, Arc::clone(&pool));

        let ws_config = WebSocketConfig::default()
            .max_message_size(Some(config.max_payload))
            .max_frame_size(Some(config.max_payload));

        let server = Arc::new(Self {
            local_addr,
            pool,
            hub,
            ws_config,
            shutdown: AtomicBool::new(false),
        });

        // Spawn accept loop
        let server_clone = Arc::clone(&server);
        tokio::spawn(async move {
            server_clone.accept_loop(listener).await;
        });

        info!(addr = %local_addr, "Chat server started");

        Ok(server)
    }
}

// ============================================================================
// ChatServer - Public API
// ============================================================================

impl ChatServer {
    /// Returns the port the server is bound to.
    #[inline]
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.local_addr.port()
    }

    /// Returns the bound socket address.
    #[inline]
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns a WebSocket URL clients can connect to.
    ///
    /// A wildcard bind address is reported as `127.0.0.1`.
    #[must_use]
    pub fn ws_url(&self) -> String {
        let ip = match self.local_addr.ip() {
            ip if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
            ip => ip,
        };
        format!("ws://{}", SocketAddr::new(ip, self.port()))
    }

    /// Returns the number of connected clients.
    #[inline]
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.pool.connection_count()
    }

    /// Stops accepting, closes every connection and stops the hub.
    pub async fn shutdown(&self) {
        info!("Chat server shutting down");

        // Signal accept loop to stop
        self.shutdown.store(true, Ordering::SeqCst);

        self.pool.shutdown_all();
        self.hub.shutdown();

        // Let the accept loop observe the flag
        tokio::time::sleep(ACCEPT_POLL_INTERVAL).await;

        info!("Chat server shutdown complete");
    }
}

// ============================================================================
// ChatServer - Accept Loop
// ============================================================================

impl ChatServer {
    /// Background task that accepts new connections.
    async fn accept_loop(self: Arc<Self>, listener: TcpListener) {
        debug!("Accept loop started");

        loop {
            if self.shutdown.load(Ordering::SeqCst) {
                debug!("Accept loop shutting down");
                break;
            }

            // Accept with timeout to allow checking shutdown flag
            match timeout(ACCEPT_POLL_INTERVAL, listener.accept()).await {
                Ok(Ok((stream, addr))) => {
                    let server = Arc::clone(&self);
                    tokio::spawn(async move {
                        match server.handle_connection(stream, addr).await {
                            Ok(()) => {}
                            Err(e) if e.is_connection_error() => {
                                debug!(error = %e, ?addr, "Connection dropped before registration");
                            }
                            Err(e) => warn!(error = %e, ?addr, "Connection handling failed"),
                        }
                    });
                }
                Ok(Err(e)) => {
                    error!(error = %e, "Accept failed");
                }
                Err(_) => continue,
            }
        }

        debug!("Accept loop terminated");
    }

    /// Upgrades one stream and hands it to a connection event loop.
    async fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) -> Result<()> {
        debug!(?addr, "New TCP connection");

        let ws_stream =
            tokio_tungstenite::accept_async_with_config(stream, Some(self.ws_config)).await?;

        let id = ConnectionId::generate();
        let (connection, outbound_rx) = Connection::open(id);

        // Register before announcing, so the hub sees the connection as
        // live from its first event.
        self.pool.insert(connection);
        if let Err(e) = self.hub.connect(id) {
            self.pool.remove(id);
            return Err(e);
        }

        info!(connection = %id, ?addr, "WebSocket connection established");

        tokio::spawn(Connection::run_event_loop(
            ws_stream,
            id,
            outbound_rx,
            self.hub.clone(),
            Arc::clone(&self.pool),
        ));

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
