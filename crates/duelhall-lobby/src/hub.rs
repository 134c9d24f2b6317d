//! Channel-backed [`Outbox`]: one unbounded queue per connection.
//!
//! Each connection's queue is drained by a single writer task, so events
//! reach a client in exactly the order the hub accepted them.

use std::collections::HashMap;

use duelhall_protocol::{ConnectionId, LobbyId, ServerEvent};
use indexmap::IndexSet;
use tokio::sync::mpsc;

use crate::Outbox;

/// Channel sender for delivering events to one connection.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Connection registry plus lobby broadcast groups.
#[derive(Debug, Default)]
pub struct ChannelHub {
    senders: HashMap<ConnectionId, EventSender>,
    groups: HashMap<LobbyId, IndexSet<ConnectionId>>,
}

impl ChannelHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts routing events for `conn` into `sender`.
    pub fn register(&mut self, conn: ConnectionId, sender: EventSender) {
        self.senders.insert(conn, sender);
    }

    /// Drops the connection's queue and removes it from every group.
    ///
    /// Dropping the sender lets the writer task drain and exit.
    pub fn unregister(&mut self, conn: ConnectionId) {
        self.senders.remove(&conn);
        self.groups.retain(|_, members| {
            members.shift_remove(&conn);
            !members.is_empty()
        });
    }

    pub fn connection_count(&self) -> usize {
        self.senders.len()
    }

    /// Number of connections subscribed to `lobby`.
    pub fn group_size(&self, lobby: &LobbyId) -> usize {
        self.groups.get(lobby).map_or(0, IndexSet::len)
    }

    /// Silently drops the event if the receiver is gone.
    fn push(&self, conn: ConnectionId, event: ServerEvent) {
        if let Some(sender) = self.senders.get(&conn) {
            if sender.send(event).is_err() {
                tracing::debug!(%conn, "receiver gone, event dropped");
            }
        }
    }
}

impl Outbox for ChannelHub {
    fn subscribe(&mut self, lobby: &LobbyId, conn: ConnectionId) {
        self.groups.entry(lobby.clone()).or_default().insert(conn);
    }

    fn unsubscribe(&mut self, lobby: &LobbyId, conn: ConnectionId) {
        if let Some(members) = self.groups.get_mut(lobby) {
            members.shift_remove(&conn);
            if members.is_empty() {
                self.groups.remove(lobby);
            }
        }
    }

    fn send(&mut self, conn: ConnectionId, event: ServerEvent) {
        self.push(conn, event);
    }

    fn broadcast(&mut self, lobby: &LobbyId, event: ServerEvent) {
        let Some(members) = self.groups.get(lobby) else {
            return;
        };
        for conn in members {
            self.push(*conn, event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duelhall_protocol::Recipient;

    fn conn(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    fn error(text: &str) -> ServerEvent {
        ServerEvent::ErrorMessage(text.into())
    }

    #[test]
    fn test_broadcast_reaches_group_members_only() {
        let mut hub = ChannelHub::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        hub.register(conn(1), tx1);
        hub.register(conn(2), tx2);
        hub.subscribe(&LobbyId::from("L1"), conn(1));

        hub.broadcast(&LobbyId::from("L1"), error("hello"));

        assert_eq!(rx1.try_recv().unwrap(), error("hello"));
        assert!(rx2.try_recv().is_err());
    }

    #[test]
    fn test_same_group_events_arrive_in_send_order() {
        let mut hub = ChannelHub::new();
        let lobby = LobbyId::from("L1");
        let mut receivers = Vec::new();
        for id in 1..=3 {
            let (tx, rx) = mpsc::unbounded_channel();
            hub.register(conn(id), tx);
            hub.subscribe(&lobby, conn(id));
            receivers.push(rx);
        }

        // Interleave group broadcasts with direct sends to one member.
        for n in 0..20 {
            hub.broadcast(&lobby, error(&format!("b{n}")));
            hub.send(conn(2), error(&format!("d{n}")));
        }

        for (idx, rx) in receivers.iter_mut().enumerate() {
            let mut expected = Vec::new();
            for n in 0..20 {
                expected.push(error(&format!("b{n}")));
                if idx == 1 {
                    expected.push(error(&format!("d{n}")));
                }
            }
            let mut got = Vec::new();
            while let Ok(event) = rx.try_recv() {
                got.push(event);
            }
            assert_eq!(got, expected, "receiver {idx}");
        }
    }

    #[test]
    fn test_unsubscribe_removes_empty_group() {
        let mut hub = ChannelHub::new();
        let lobby = LobbyId::from("L1");
        let (tx, _rx) = mpsc::unbounded_channel();
        hub.register(conn(1), tx);
        hub.subscribe(&lobby, conn(1));
        assert_eq!(hub.group_size(&lobby), 1);

        hub.unsubscribe(&lobby, conn(1));
        assert_eq!(hub.group_size(&lobby), 0);
    }

    #[test]
    fn test_unregister_closes_queue() {
        let mut hub = ChannelHub::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        hub.register(conn(1), tx);
        hub.subscribe(&LobbyId::from("L1"), conn(1));

        hub.unregister(conn(1));

        assert_eq!(hub.connection_count(), 0);
        assert_eq!(hub.group_size(&LobbyId::from("L1")), 0);
        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }

    #[test]
    fn test_deliver_resolves_recipients() {
        let mut hub = ChannelHub::new();
        let lobby = LobbyId::from("L1");
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        hub.register(conn(1), tx1);
        hub.register(conn(2), tx2);
        hub.subscribe(&lobby, conn(1));
        hub.subscribe(&lobby, conn(2));

        hub.deliver(vec![
            (Recipient::Connection(conn(2)), error("direct")),
            (Recipient::Lobby(lobby), error("all")),
        ]);

        assert_eq!(rx1.try_recv().unwrap(), error("all"));
        assert_eq!(rx2.try_recv().unwrap(), error("direct"));
        assert_eq!(rx2.try_recv().unwrap(), error("all"));
    }
}
