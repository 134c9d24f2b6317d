//! # Duelhall
//!
//! Real-time lobby server for two-player turn-based games.
//!
//! Clients connect over WebSocket, join named lobbies, and the lobby's
//! creator starts a game once enough players are in. All events are JSON
//! objects of the form `{"event": ..., "data": ...}`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use duelhall::prelude::*;
//!
//! # async fn run() -> Result<(), DuelhallError> {
//! let config = ServerConfig::from_env()?;
//! let server = DuelhallServerBuilder::from_config(config)
//!     .build::<TicTacToe>()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod actor;
mod config;
mod error;
mod handler;
mod server;

pub use actor::{RegistryHandle, RegistryStats, spawn_registry};
pub use config::{ConfigError, DEFAULT_HOST, DEFAULT_PORT, ServerConfig};
pub use error::DuelhallError;
pub use server::{DuelhallServer, DuelhallServerBuilder};

/// Re-exports everything needed to run a server or write a game.
pub mod prelude {
    pub use crate::{
        ConfigError, DuelhallError, DuelhallServer, DuelhallServerBuilder,
        RegistryHandle, RegistryStats, ServerConfig,
    };
    pub use duelhall_lobby::{
        GameSession, LobbyConfig, LobbyError, Outbound, TicTacToe,
    };
    pub use duelhall_protocol::{
        Board, ClientEvent, ConnectionId, LobbyId, Mark, Outcome, Recipient,
        ServerEvent, StartGamePayload,
    };
}
