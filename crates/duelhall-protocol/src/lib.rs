//! Wire protocol for Duelhall.
//!
//! This crate defines the events clients and the server exchange:
//!
//! - **Types** ([`ClientEvent`], [`ServerEvent`], [`Mark`], [`Outcome`],
//!   [`LobbyId`], [`Recipient`]): the shapes that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those events are
//!   converted to and from bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! Transport (bytes) → Protocol (events) → Lobby registry
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use duelhall_transport::ConnectionId;
pub use error::ProtocolError;
pub use types::{
    BOARD_CELLS, Board, BoardUpdate, Cell, ClientEvent, GameStart, LobbyId,
    Mark, Outcome, PlayerEntry, Recipient, Roster, ServerEvent, StartGamePayload,
};
