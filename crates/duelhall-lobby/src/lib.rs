//! Lobby management for Duelhall.
//!
//! Connections join named lobbies, flag readiness and, once the creator
//! asks, play a game bound to the lobby. All state lives in a
//! [`LobbyRegistry`] that is driven one event at a time and speaks to the
//! outside world only through an [`Outbox`].
//!
//! # Key types
//!
//! - [`LobbyRegistry`]: owns every lobby, routes client events
//! - [`Lobby`]: members, creator and the bound game
//! - [`GameSession`]: the trait a lobby-hosted game implements
//! - [`TicTacToe`]: the built-in game
//! - [`Outbox`] / [`ChannelHub`]: room-scoped pub/sub for outbound events
//! - [`LobbyConfig`]: registry settings

mod config;
mod error;
mod game;
mod hub;
mod lobby;
mod outbox;
mod registry;
mod tictactoe;

pub use config::LobbyConfig;
pub use error::LobbyError;
pub use game::{GameSession, Outbound};
pub use hub::{ChannelHub, EventSender};
pub use lobby::{Lobby, Member};
pub use outbox::Outbox;
pub use registry::LobbyRegistry;
pub use tictactoe::{LINES, MoveRejection, PLAYERS, TicTacToe, winning_mark};
