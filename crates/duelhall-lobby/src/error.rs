//! Error types for the lobby layer.

/// Reasons a `startGame` request is refused.
///
/// All of these are reported to the requester only, as an `errorMessage`
/// carrying the `Display` text. Lobby state is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LobbyError {
    /// Only the lobby's creator may start a game.
    #[error("only the lobby creator can start the game")]
    NotCreator,

    /// The lobby already holds a game, running or finished.
    #[error("game already started")]
    AlreadyStarted,

    /// Too few members to seat every player.
    #[error("not enough players to start the game (need {required}, have {present})")]
    InsufficientPlayers { required: usize, present: usize },

    /// Readiness gating is on and someone has not flagged ready.
    #[error("not every player is ready")]
    PlayersNotReady,
}
