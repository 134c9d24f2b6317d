//! The `GameSession` trait: the capability set a lobby needs from a game.
//!
//! A lobby holds at most one session. The registry creates it on
//! `startGame`, feeds it moves, hands late joiners its snapshot and calls
//! `cleanup` when the lobby is destroyed. Nothing else about the game leaks
//! into the lobby layer.

use duelhall_protocol::{ConnectionId, LobbyId, Recipient, ServerEvent};

use crate::LobbyError;

/// Events produced by a game operation, each with its addressee.
pub type Outbound = Vec<(Recipient, ServerEvent)>;

/// One live match bound to one lobby.
pub trait GameSession: Send + 'static {
    /// Seats players from the lobby's members, in join order.
    ///
    /// # Errors
    /// [`LobbyError::InsufficientPlayers`] when there are not enough
    /// members to fill every seat.
    fn new(lobby_id: LobbyId, members: &[ConnectionId]) -> Result<Self, LobbyError>
    where
        Self: Sized;

    /// Resets to the opening position and returns the start snapshots.
    fn start(&mut self) -> Outbound;

    /// Applies a move from `sender`.
    ///
    /// Invalid moves are dropped without an error event; the returned list
    /// is empty in that case.
    fn make_move(&mut self, sender: ConnectionId, index: i64) -> Outbound;

    /// Current state, addressed to an onlooker who holds no seat.
    fn snapshot(&self) -> ServerEvent;

    /// Returns `true` once a result has been reached.
    fn is_finished(&self) -> bool;

    /// Teardown hook, called by the owning lobby right before it is
    /// dropped. Default: no-op.
    fn cleanup(&mut self) {}
}
