//! The `Outbox` trait: where the registry puts everything it says.
//!
//! The registry never touches sockets. It subscribes connections to lobby
//! groups and hands events to an `Outbox`; the server plugs in a
//! [`ChannelHub`](crate::ChannelHub), tests can plug in anything.
//!
//! # Ordering
//!
//! Implementations must deliver events sent to the same connection (alone
//! or through a group) in the order they were handed over. Nothing is
//! promised across different connections.

use duelhall_protocol::{ConnectionId, LobbyId, Recipient, ServerEvent};

/// Room-scoped pub/sub used by the lobby registry.
pub trait Outbox {
    /// Adds `conn` to the broadcast group of `lobby`. Idempotent.
    fn subscribe(&mut self, lobby: &LobbyId, conn: ConnectionId);

    /// Removes `conn` from the broadcast group of `lobby`.
    fn unsubscribe(&mut self, lobby: &LobbyId, conn: ConnectionId);

    /// Sends to a single connection. Fire-and-forget.
    fn send(&mut self, conn: ConnectionId, event: ServerEvent);

    /// Sends to every connection in the group of `lobby`. Fire-and-forget.
    fn broadcast(&mut self, lobby: &LobbyId, event: ServerEvent);

    /// Delivers game output, resolving each recipient.
    fn deliver(&mut self, outbound: Vec<(Recipient, ServerEvent)>) {
        for (recipient, event) in outbound {
            match recipient {
                Recipient::Lobby(lobby) => self.broadcast(&lobby, event),
                Recipient::Connection(conn) => self.send(conn, event),
            }
        }
    }
}
