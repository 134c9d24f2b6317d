//! `DuelhallServer` builder and accept loop.
//!
//! Ties the layers together: WebSocket transport → JSON codec → registry
//! actor.

use std::future::Future;
use std::sync::Arc;

use duelhall_lobby::{GameSession, LobbyConfig};
use duelhall_protocol::{Codec, JsonCodec};
use duelhall_transport::{Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::{DuelhallError, RegistryHandle, ServerConfig, spawn_registry};

/// Shared server state passed to each connection task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) registry: RegistryHandle,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a Duelhall server.
///
/// # Example
///
/// ```rust,no_run
/// use duelhall::prelude::*;
///
/// # async fn run() -> Result<(), DuelhallError> {
/// let server = DuelhallServer::builder()
///     .bind("127.0.0.1:4000")
///     .build::<TicTacToe>()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct DuelhallServerBuilder {
    bind_addr: String,
    lobby_config: LobbyConfig,
}

impl DuelhallServerBuilder {
    /// Creates a builder with [`ServerConfig::default`] settings.
    pub fn new() -> Self {
        Self::from_config(ServerConfig::default())
    }

    /// Creates a builder from a loaded configuration.
    pub fn from_config(config: ServerConfig) -> Self {
        Self {
            bind_addr: config.bind_addr(),
            lobby_config: config.lobby,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the lobby settings.
    pub fn lobby_config(mut self, config: LobbyConfig) -> Self {
        self.lobby_config = config;
        self
    }

    /// Binds the listener and starts the registry actor for game `G`.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build<G: GameSession>(
        self,
    ) -> Result<DuelhallServer<JsonCodec>, DuelhallError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        let registry = spawn_registry::<G>(self.lobby_config);

        let state = Arc::new(ServerState {
            registry,
            codec: JsonCodec,
        });

        Ok(DuelhallServer { transport, state })
    }
}

impl Default for DuelhallServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Duelhall server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct DuelhallServer<C: Codec = JsonCodec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl DuelhallServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> DuelhallServerBuilder {
        DuelhallServerBuilder::new()
    }
}

impl<C: Codec> DuelhallServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Handle to the registry actor, e.g. for [`RegistryHandle::stats`].
    pub fn registry(&self) -> &RegistryHandle {
        &self.state.registry
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), DuelhallError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `shutdown` resolves, then stops the
    /// registry actor.
    ///
    /// Connections already accepted keep their tasks, but every event they
    /// send afterwards is dropped.
    pub async fn run_until(
        mut self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), DuelhallError> {
        tracing::info!(addr = ?self.local_addr().ok(), "Duelhall server running");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(conn, state).await {
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
                },
                () = &mut shutdown => break,
            }
        }

        tracing::info!("shutting down");
        self.transport.shutdown().await?;
        // Already stopped is fine.
        let _ = self.state.registry.shutdown();
        Ok(())
    }
}
