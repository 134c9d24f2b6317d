//! Lobby registry: creates, tracks, and routes connections to lobbies.
//!
//! Every inbound event goes through one `&mut LobbyRegistry` call and runs
//! to completion before the next one starts. The registry itself does no
//! I/O and holds no locks; callers serialize access (the server runs it
//! inside a single actor task).

use std::collections::HashMap;

use duelhall_protocol::{ClientEvent, ConnectionId, LobbyId, ServerEvent};

use crate::{GameSession, Lobby, LobbyConfig, LobbyError, Outbound, Outbox, TicTacToe};

/// Owns every lobby and knows which lobby each connection is in.
///
/// A connection is in at most one lobby at a time (key invariant).
/// Joining a different lobby leaves the current one first.
pub struct LobbyRegistry<G: GameSession = TicTacToe> {
    config: LobbyConfig,

    /// Live lobbies, keyed by their client-chosen id. Never empty.
    lobbies: HashMap<LobbyId, Lobby<G>>,

    /// Maps each connection to the lobby it is currently a member of.
    memberships: HashMap<ConnectionId, LobbyId>,
}

impl<G: GameSession> LobbyRegistry<G> {
    pub fn new(config: LobbyConfig) -> Self {
        Self {
            config,
            lobbies: HashMap::new(),
            memberships: HashMap::new(),
        }
    }

    pub fn config(&self) -> &LobbyConfig {
        &self.config
    }

    /// Routes one inbound event from `conn`.
    pub fn handle(
        &mut self,
        out: &mut impl Outbox,
        conn: ConnectionId,
        event: ClientEvent,
    ) {
        match event {
            ClientEvent::JoinLobby {
                lobby_id,
                player_name,
            } => self.join(out, conn, lobby_id, player_name),
            ClientEvent::SetReady { ready } => self.set_ready(out, conn, ready),
            ClientEvent::StartGame(_) => {
                // Refusals are already reported to the requester.
                let _ = self.start_game(out, conn);
            }
            ClientEvent::MakeMove { index } => self.make_move(out, conn, index),
        }
    }

    /// Adds `conn` to `lobby_id`, creating the lobby if needed.
    ///
    /// Re-joining the same lobby just renames the member. A late joiner of
    /// a lobby with a game gets a snapshot of it.
    pub fn join(
        &mut self,
        out: &mut impl Outbox,
        conn: ConnectionId,
        lobby_id: LobbyId,
        player_name: String,
    ) {
        if let Some(current) = self.memberships.get(&conn).cloned() {
            if current != lobby_id {
                self.leave(out, conn, &current);
            }
        }

        let lobby = self.lobbies.entry(lobby_id.clone()).or_insert_with(|| {
            tracing::info!(%lobby_id, creator = %conn, "lobby created");
            Lobby::new(lobby_id.clone(), conn)
        });
        lobby.upsert_member(conn, player_name);
        self.memberships.insert(conn, lobby_id.clone());

        tracing::info!(
            %lobby_id,
            %conn,
            members = lobby.len(),
            "member joined"
        );

        out.subscribe(&lobby_id, conn);
        out.broadcast(&lobby_id, ServerEvent::PlayersUpdate(lobby.roster()));

        if let Some(game) = lobby.game() {
            out.send(conn, game.snapshot());
        }
    }

    /// Updates the readiness flag of `conn`. No-op outside a lobby.
    pub fn set_ready(
        &mut self,
        out: &mut impl Outbox,
        conn: ConnectionId,
        ready: bool,
    ) {
        let Some(lobby) = self.current_lobby_mut(conn) else {
            tracing::debug!(%conn, "set-ready outside a lobby, ignoring");
            return;
        };
        if lobby.set_ready(conn, ready) {
            let roster = lobby.roster();
            out.broadcast(lobby.id(), ServerEvent::PlayersUpdate(roster));
        }
    }

    /// Starts the lobby's game on behalf of its creator.
    ///
    /// Refusals are sent to `conn` as an `errorMessage` and also returned.
    /// A connection outside any lobby is ignored and gets `Ok`.
    pub fn start_game(
        &mut self,
        out: &mut impl Outbox,
        conn: ConnectionId,
    ) -> Result<(), LobbyError> {
        let require_all_ready = self.config.require_all_ready;
        let Some(lobby) = self.current_lobby_mut(conn) else {
            tracing::debug!(%conn, "start-game outside a lobby, ignoring");
            return Ok(());
        };

        match try_start(lobby, conn, require_all_ready) {
            Ok(outbound) => {
                tracing::info!(
                    lobby_id = %lobby.id(),
                    members = lobby.len(),
                    "game started"
                );
                out.deliver(outbound);
                Ok(())
            }
            Err(e) => {
                tracing::debug!(
                    lobby_id = %lobby.id(),
                    %conn,
                    error = %e,
                    "start-game refused"
                );
                out.send(conn, ServerEvent::ErrorMessage(e.to_string()));
                Err(e)
            }
        }
    }

    /// Forwards a move to the lobby's game. Silently ignored when there is
    /// no lobby or no game.
    pub fn make_move(
        &mut self,
        out: &mut impl Outbox,
        conn: ConnectionId,
        index: i64,
    ) {
        let Some(lobby) = self.current_lobby_mut(conn) else {
            tracing::debug!(%conn, "move outside a lobby, ignoring");
            return;
        };
        let lobby_id = lobby.id().clone();
        let Some(game) = lobby.game_mut() else {
            tracing::debug!(%lobby_id, %conn, "move without a game, ignoring");
            return;
        };

        let was_finished = game.is_finished();
        let outbound = game.make_move(conn, index);
        if !was_finished && game.is_finished() {
            tracing::info!(%lobby_id, "game finished");
        }
        out.deliver(outbound);
    }

    /// Removes `conn` from its lobby. No-op outside a lobby.
    pub fn disconnect(&mut self, out: &mut impl Outbox, conn: ConnectionId) {
        let Some(lobby_id) = self.memberships.get(&conn).cloned() else {
            return;
        };
        self.leave(out, conn, &lobby_id);
    }

    /// The single leave transition, shared by disconnect and lobby switch.
    fn leave(&mut self, out: &mut impl Outbox, conn: ConnectionId, lobby_id: &LobbyId) {
        self.memberships.remove(&conn);
        out.unsubscribe(lobby_id, conn);

        let Some(lobby) = self.lobbies.get_mut(lobby_id) else {
            return;
        };
        if let Some(creator) = lobby.remove_member(conn) {
            tracing::info!(%lobby_id, %creator, "creator reassigned");
        }
        tracing::info!(%lobby_id, %conn, members = lobby.len(), "member left");

        if !lobby.is_empty() {
            out.broadcast(lobby_id, ServerEvent::PlayersUpdate(lobby.roster()));
            return;
        }

        // Nobody is left to notify: drop the game and the lobby quietly.
        if let Some(mut game) = lobby.take_game() {
            game.cleanup();
        }
        self.lobbies.remove(lobby_id);
        tracing::info!(%lobby_id, "lobby removed");
    }

    /// Returns a lobby by id.
    pub fn lobby(&self, lobby_id: &LobbyId) -> Option<&Lobby<G>> {
        self.lobbies.get(lobby_id)
    }

    /// Returns the id of the lobby `conn` is in, if any.
    pub fn lobby_of(&self, conn: ConnectionId) -> Option<&LobbyId> {
        self.memberships.get(&conn)
    }

    /// Returns the number of live lobbies.
    pub fn lobby_count(&self) -> usize {
        self.lobbies.len()
    }

    fn current_lobby_mut(&mut self, conn: ConnectionId) -> Option<&mut Lobby<G>> {
        let lobby_id = self.memberships.get(&conn)?;
        self.lobbies.get_mut(lobby_id)
    }
}

impl<G: GameSession> Default for LobbyRegistry<G> {
    fn default() -> Self {
        Self::new(LobbyConfig::default())
    }
}

/// Checks the start preconditions in order and builds the game.
fn try_start<G: GameSession>(
    lobby: &mut Lobby<G>,
    conn: ConnectionId,
    require_all_ready: bool,
) -> Result<Outbound, LobbyError> {
    if lobby.creator() != conn {
        return Err(LobbyError::NotCreator);
    }
    if lobby.game().is_some() {
        return Err(LobbyError::AlreadyStarted);
    }
    if require_all_ready && !lobby.all_ready() {
        return Err(LobbyError::PlayersNotReady);
    }

    let members: Vec<ConnectionId> = lobby.member_ids().collect();
    let mut game = G::new(lobby.id().clone(), &members)?;
    let outbound = game.start();
    lobby.bind_game(game);
    Ok(outbound)
}
