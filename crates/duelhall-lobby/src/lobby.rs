//! A single lobby: members, creator and the optional bound game.

use duelhall_protocol::{ConnectionId, LobbyId, PlayerEntry, Roster};
use indexmap::IndexMap;

use crate::GameSession;

/// A lobby member as shown in the roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Free-form display name. Not unique.
    pub name: String,
    pub ready: bool,
}

/// A named group of connections sharing at most one game.
///
/// Members are kept in join order. That order decides who gets seated
/// when a game starts and who inherits the creator role.
///
/// Invariant: while the lobby has members, `creator` is one of them. An
/// empty lobby is removed by the registry, never kept around.
#[derive(Debug)]
pub struct Lobby<G> {
    id: LobbyId,
    creator: ConnectionId,
    members: IndexMap<ConnectionId, Member>,
    game: Option<G>,
}

impl<G: GameSession> Lobby<G> {
    pub(crate) fn new(id: LobbyId, creator: ConnectionId) -> Self {
        Self {
            id,
            creator,
            members: IndexMap::new(),
            game: None,
        }
    }

    pub fn id(&self) -> &LobbyId {
        &self.id
    }

    pub fn creator(&self) -> ConnectionId {
        self.creator
    }

    pub fn member(&self, conn: ConnectionId) -> Option<&Member> {
        self.members.get(&conn)
    }

    /// Member ids in join order.
    pub fn member_ids(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.members.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn all_ready(&self) -> bool {
        self.members.values().all(|m| m.ready)
    }

    /// The bound game, running or finished.
    pub fn game(&self) -> Option<&G> {
        self.game.as_ref()
    }

    /// The `playersUpdate` payload for this lobby.
    pub fn roster(&self) -> Roster {
        Roster {
            creator_id: self.creator,
            players: self
                .members
                .iter()
                .map(|(id, m)| PlayerEntry {
                    id: *id,
                    name: m.name.clone(),
                    ready: m.ready,
                })
                .collect(),
        }
    }

    /// Inserts or overwrites a member. An existing member keeps its place
    /// in the join order but loses its ready flag.
    pub(crate) fn upsert_member(&mut self, conn: ConnectionId, name: String) {
        self.members.insert(conn, Member { name, ready: false });
    }

    /// Returns `false` if `conn` is not a member.
    pub(crate) fn set_ready(&mut self, conn: ConnectionId, ready: bool) -> bool {
        match self.members.get_mut(&conn) {
            Some(member) => {
                member.ready = ready;
                true
            }
            None => false,
        }
    }

    /// Removes a member and, if it was the creator, promotes the earliest
    /// remaining member. Returns the newly promoted creator, if any.
    pub(crate) fn remove_member(
        &mut self,
        conn: ConnectionId,
    ) -> Option<ConnectionId> {
        self.members.shift_remove(&conn)?;
        if conn != self.creator {
            return None;
        }
        let next = self.members.keys().next().copied()?;
        self.creator = next;
        Some(next)
    }

    pub(crate) fn game_mut(&mut self) -> Option<&mut G> {
        self.game.as_mut()
    }

    pub(crate) fn bind_game(&mut self, game: G) {
        self.game = Some(game);
    }

    pub(crate) fn take_game(&mut self) -> Option<G> {
        self.game.take()
    }
}
