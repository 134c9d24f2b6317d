//! Wire types for Duelhall's event protocol.
//!
//! Every message on the wire is a named event with a payload:
//!
//! ```json
//! { "event": "makeMove", "data": { "index": 4 } }
//! ```
//!
//! [`ClientEvent`] is what clients send, [`ServerEvent`] is what the server
//! pushes back. Field names are camelCase because the clients are browser
//! code.

use std::fmt;

use duelhall_transport::ConnectionId;
use serde::de::IgnoredAny;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Client-chosen name of a lobby. Unique key in the registry.
///
/// Not validated: any string (including the empty one) names a lobby.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LobbyId(pub String);

impl LobbyId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LobbyId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Display for LobbyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Board vocabulary
// ---------------------------------------------------------------------------

/// One of the two player marks. X always moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    /// The opposing mark.
    pub fn other(self) -> Self {
        match self {
            Self::X => Self::O,
            Self::O => Self::X,
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X => f.write_str("X"),
            Self::O => f.write_str("O"),
        }
    }
}

/// A board cell: `None` is empty. Serializes as `"X"`, `"O"` or `null`.
pub type Cell = Option<Mark>;

/// Number of cells on the board.
pub const BOARD_CELLS: usize = 9;

/// The 3×3 board in row-major order.
pub type Board = [Cell; BOARD_CELLS];

/// Terminal result of a game. Serializes as `"X"`, `"O"` or `"Draw"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    X,
    O,
    Draw,
}

impl Outcome {
    /// The winning mark, or `None` for a draw.
    pub fn winner(self) -> Option<Mark> {
        match self {
            Self::X => Some(Mark::X),
            Self::O => Some(Mark::O),
            Self::Draw => None,
        }
    }
}

impl From<Mark> for Outcome {
    fn from(mark: Mark) -> Self {
        match mark {
            Mark::X => Self::X,
            Mark::O => Self::O,
        }
    }
}

// ---------------------------------------------------------------------------
// Recipient
// ---------------------------------------------------------------------------

/// Who an outbound event is addressed to.
///
/// Game logic returns `(Recipient, ServerEvent)` pairs; the lobby layer
/// resolves them against its broadcast groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// Every connection subscribed to the lobby's group.
    Lobby(LobbyId),

    /// One connection, addressed individually.
    Connection(ConnectionId),
}

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// Events a client can send.
///
/// `#[serde(tag = "event", content = "data")]` gives the adjacently tagged
/// shape `{ "event": "setReady", "data": { "ready": true } }`. `startGame`
/// carries `{}`, though a missing or `null` `data` is accepted too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Join (or create) a lobby under a display name.
    #[serde(rename_all = "camelCase")]
    JoinLobby {
        lobby_id: LobbyId,
        player_name: String,
    },

    /// Toggle the readiness flag shown in the roster.
    SetReady { ready: bool },

    /// Ask to start the lobby's game. Creator only.
    StartGame(StartGamePayload),

    /// Place the sender's mark on a cell.
    ///
    /// Signed so that out-of-range input still decodes and is rejected by
    /// the rules rather than by the decoder.
    MakeMove { index: i64 },
}

/// Payload of `startGame`. Carries nothing.
///
/// Serializes as `{}`. Decodes from an absent `data`, `null`, or any value,
/// whose contents are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StartGamePayload;

impl Serialize for StartGamePayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_map(Some(0))?.end()
    }
}

impl<'de> Deserialize<'de> for StartGamePayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Must use `deserialize_option`: a missing `data` key reaches
        // newtype variants only through that path.
        Option::<IgnoredAny>::deserialize(deserializer).map(|_| Self)
    }
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// One row of a roster update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerEntry {
    pub id: ConnectionId,
    pub name: String,
    pub ready: bool,
}

/// Full membership of a lobby, in join order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Roster {
    pub creator_id: ConnectionId,
    pub players: Vec<PlayerEntry>,
}

/// Snapshot sent when a game starts (per player) or to a late joiner.
///
/// `your_symbol` is the recipient's own mark; `None` for a late joiner who
/// is watching rather than playing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStart {
    pub board: Board,
    pub current_turn: Mark,
    pub your_symbol: Option<Mark>,
    pub winner: Option<Outcome>,
}

/// Board state broadcast after every accepted move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardUpdate {
    pub board: Board,
    pub current_turn: Mark,
    pub winner: Option<Outcome>,
}

/// Events the server pushes to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Roster changed. Sent to the whole lobby.
    PlayersUpdate(Roster),

    /// A game started, or a late joiner's snapshot.
    GameStarted(GameStart),

    /// A move was accepted. Sent to the whole lobby.
    GameUpdate(BoardUpdate),

    /// A request failed. Sent to the requester only.
    ErrorMessage(String),
}
