//! Registry actor: the one task that owns every lobby.
//!
//! Connection handlers never touch lobby state. They push commands into an
//! unbounded channel and the actor applies them one at a time, so every
//! event sees the effects of all earlier ones and nothing in between.

use duelhall_lobby::{
    ChannelHub, EventSender, GameSession, LobbyConfig, LobbyRegistry,
};
use duelhall_protocol::{ClientEvent, ConnectionId};
use tokio::sync::{mpsc, oneshot};

use crate::DuelhallError;

/// Commands sent to the registry actor through its channel.
pub(crate) enum RegistryCommand {
    /// Start routing events for a freshly accepted connection.
    Connect {
        conn: ConnectionId,
        sender: EventSender,
    },

    /// A decoded event from a client.
    Event {
        conn: ConnectionId,
        event: ClientEvent,
    },

    /// The connection is gone: leave its lobby and drop its queue.
    Disconnect { conn: ConnectionId },

    /// Request live counters.
    Stats { reply: oneshot::Sender<RegistryStats> },

    /// Stop the actor. Queued commands behind this one are dropped.
    Shutdown,
}

/// Live counters reported by the registry actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
    pub lobbies: usize,
    pub connections: usize,
}

/// Handle to the running registry actor.
///
/// Cheap to clone. Sends never wait: the channel is unbounded so a
/// `Drop` impl can use it.
#[derive(Clone)]
pub struct RegistryHandle {
    sender: mpsc::UnboundedSender<RegistryCommand>,
}

impl RegistryHandle {
    fn send(&self, cmd: RegistryCommand) -> Result<(), DuelhallError> {
        self.sender
            .send(cmd)
            .map_err(|_| DuelhallError::RegistryUnavailable)
    }

    pub fn connect(
        &self,
        conn: ConnectionId,
        sender: EventSender,
    ) -> Result<(), DuelhallError> {
        self.send(RegistryCommand::Connect { conn, sender })
    }

    pub fn dispatch(
        &self,
        conn: ConnectionId,
        event: ClientEvent,
    ) -> Result<(), DuelhallError> {
        self.send(RegistryCommand::Event { conn, event })
    }

    pub fn disconnect(&self, conn: ConnectionId) -> Result<(), DuelhallError> {
        self.send(RegistryCommand::Disconnect { conn })
    }

    /// Asks the actor for its counters. The answer reflects every command
    /// sent through any handle before this call.
    pub async fn stats(&self) -> Result<RegistryStats, DuelhallError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RegistryCommand::Stats { reply: reply_tx })?;
        reply_rx.await.map_err(|_| DuelhallError::RegistryUnavailable)
    }

    pub fn shutdown(&self) -> Result<(), DuelhallError> {
        self.send(RegistryCommand::Shutdown)
    }
}

/// The internal actor state. Runs inside a Tokio task.
struct RegistryActor<G: GameSession> {
    registry: LobbyRegistry<G>,
    hub: ChannelHub,
    receiver: mpsc::UnboundedReceiver<RegistryCommand>,
}

impl<G: GameSession> RegistryActor<G> {
    async fn run(mut self) {
        tracing::info!("registry actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RegistryCommand::Connect { conn, sender } => {
                    self.hub.register(conn, sender);
                    tracing::debug!(
                        %conn,
                        connections = self.hub.connection_count(),
                        "connection registered"
                    );
                }
                RegistryCommand::Event { conn, event } => {
                    self.registry.handle(&mut self.hub, conn, event);
                }
                RegistryCommand::Disconnect { conn } => {
                    self.registry.disconnect(&mut self.hub, conn);
                    self.hub.unregister(conn);
                    tracing::debug!(
                        %conn,
                        connections = self.hub.connection_count(),
                        "connection unregistered"
                    );
                }
                RegistryCommand::Stats { reply } => {
                    let _ = reply.send(RegistryStats {
                        lobbies: self.registry.lobby_count(),
                        connections: self.hub.connection_count(),
                    });
                }
                RegistryCommand::Shutdown => break,
            }
        }

        tracing::info!("registry actor stopped");
    }
}

/// Spawns a registry actor on the current runtime and returns its handle.
///
/// The actor stops on [`RegistryHandle::shutdown`] or once every handle is
/// dropped.
pub fn spawn_registry<G: GameSession>(config: LobbyConfig) -> RegistryHandle {
    let (sender, receiver) = mpsc::unbounded_channel();
    let actor = RegistryActor::<G> {
        registry: LobbyRegistry::new(config),
        hub: ChannelHub::new(),
        receiver,
    };
    tokio::spawn(actor.run());
    RegistryHandle { sender }
}
