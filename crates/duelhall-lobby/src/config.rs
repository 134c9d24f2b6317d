//! Lobby configuration.

use serde::{Deserialize, Serialize};

/// Settings shared by every lobby in a registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyConfig {
    /// Refuse `startGame` until every member has flagged ready.
    ///
    /// Off by default: readiness is shown in the roster but the creator may
    /// start whenever enough players are present.
    #[serde(default)]
    pub require_all_ready: bool,
}
