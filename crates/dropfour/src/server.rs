//! `DropfourServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → lobby.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use dropfour_lobby::{Master, MasterHandle, spawn_master};
use dropfour_protocol::JsonCodec;
use dropfour_transport::{Transport, WebSocketTransport};

use crate::DropfourError;
use crate::handler::handle_connection;

/// Runtime settings for a server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,
    /// A connection that sends nothing for this long is closed.
    pub idle_timeout: Duration,
    /// Capacity of the master actor's command queue.
    pub channel_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            idle_timeout: Duration::from_secs(30),
            channel_size: 1024,
        }
    }
}

/// State shared by every connection task.
pub(crate) struct ServerState {
    pub(crate) master: MasterHandle,
    pub(crate) codec: JsonCodec,
    pub(crate) idle_timeout: Duration,
}

/// Builder for configuring and starting a dropfour server.
///
/// # Example
///
/// ```rust,no_run
/// use dropfour::prelude::*;
///
/// # async fn start() -> Result<(), DropfourError> {
/// let server = DropfourServer::builder()
///     .bind("127.0.0.1:8080")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
#[derive(Debug, Default)]
pub struct DropfourServerBuilder {
    config: ServerConfig,
}

impl DropfourServerBuilder {
    /// Creates a builder with [`ServerConfig::default`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing configuration.
    pub fn with_config(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    pub fn channel_size(mut self, size: usize) -> Self {
        self.config.channel_size = size;
        self
    }

    /// Binds the listener and starts the master actor.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn build(self) -> Result<DropfourServer, DropfourError> {
        let ServerConfig {
            bind_addr,
            idle_timeout,
            channel_size,
        } = self.config;

        if channel_size == 0 {
            return Err(DropfourError::Config(
                "channel size must be at least 1".into(),
            ));
        }
        if idle_timeout.is_zero() {
            return Err(DropfourError::Config(
                "idle timeout must be non-zero".into(),
            ));
        }

        let transport = WebSocketTransport::bind(&bind_addr).await?;
        let master = spawn_master(Master::new(), channel_size);

        let state = Arc::new(ServerState {
            master,
            codec: JsonCodec,
            idle_timeout,
        });

        Ok(DropfourServer { transport, state })
    }
}

/// A bound dropfour server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct DropfourServer {
    transport: WebSocketTransport,
    state: Arc<ServerState>,
}

impl DropfourServer {
    pub fn builder() -> DropfourServerBuilder {
        DropfourServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// A handle to the running master, for stats or shutdown.
    pub fn master(&self) -> MasterHandle {
        self.state.master.clone()
    }

    /// Runs the accept loop until the process is terminated.
    ///
    /// The loop only takes sockets. The WebSocket upgrade and everything
    /// after it run in the connection's own task, so a slow or silent
    /// peer cannot stall other clients.
    pub async fn run(mut self) -> Result<(), DropfourError> {
        tracing::info!(addr = ?self.local_addr().ok(), "dropfour server running");

        loop {
            match self.transport.accept().await {
                Ok(pending) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(pending, state).await {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                }
            }
        }
    }
}
