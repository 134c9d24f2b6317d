//! Tic-tac-toe: the one game a lobby can host.

use duelhall_protocol::{
    BOARD_CELLS, Board, BoardUpdate, ConnectionId, GameStart, LobbyId, Mark,
    Outcome, Recipient, ServerEvent,
};

use crate::{GameSession, LobbyError, Outbound};

/// Seats needed to start.
pub const PLAYERS: usize = 2;

/// The eight winning lines: rows, columns, diagonals. Scanned in this order.
pub const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Why a move was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MoveRejection {
    #[error("game is not active")]
    Inactive,
    #[error("sender holds no seat")]
    NotAPlayer,
    #[error("game is over")]
    GameOver,
    #[error("not your turn")]
    NotYourTurn,
    #[error("cell index must be 0-8")]
    OutOfRange,
    #[error("cell is occupied")]
    Occupied,
}

/// A tic-tac-toe match between the first two members of a lobby.
#[derive(Debug, Clone)]
pub struct TicTacToe {
    lobby_id: LobbyId,
    /// Seat 0 plays X, seat 1 plays O.
    seats: [ConnectionId; PLAYERS],
    board: Board,
    current_turn: Mark,
    result: Option<Outcome>,
    active: bool,
}

impl TicTacToe {
    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn current_turn(&self) -> Mark {
        self.current_turn
    }

    pub fn result(&self) -> Option<Outcome> {
        self.result
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The mark `conn` plays, if it holds a seat.
    pub fn mark_of(&self, conn: ConnectionId) -> Option<Mark> {
        if self.seats[0] == conn {
            Some(Mark::X)
        } else if self.seats[1] == conn {
            Some(Mark::O)
        } else {
            None
        }
    }

    /// The connection playing `mark`.
    pub fn player(&self, mark: Mark) -> ConnectionId {
        match mark {
            Mark::X => self.seats[0],
            Mark::O => self.seats[1],
        }
    }

    /// Checks every precondition of a move and returns the target cell.
    ///
    /// Checks run in a fixed order; the first failing one is reported.
    pub fn validate_move(
        &self,
        sender: ConnectionId,
        index: i64,
    ) -> Result<usize, MoveRejection> {
        if !self.active {
            return Err(MoveRejection::Inactive);
        }
        let mark = self.mark_of(sender).ok_or(MoveRejection::NotAPlayer)?;
        if self.result.is_some() {
            return Err(MoveRejection::GameOver);
        }
        if mark != self.current_turn {
            return Err(MoveRejection::NotYourTurn);
        }
        let cell = usize::try_from(index)
            .ok()
            .filter(|cell| *cell < BOARD_CELLS)
            .ok_or(MoveRejection::OutOfRange)?;
        if self.board[cell].is_some() {
            return Err(MoveRejection::Occupied);
        }
        Ok(cell)
    }

    fn board_update(&self) -> BoardUpdate {
        BoardUpdate {
            board: self.board,
            current_turn: self.current_turn,
            winner: self.result,
        }
    }

    fn start_for(&self, mark: Option<Mark>) -> GameStart {
        GameStart {
            board: self.board,
            current_turn: self.current_turn,
            your_symbol: mark,
            winner: self.result,
        }
    }
}

impl GameSession for TicTacToe {
    fn new(lobby_id: LobbyId, members: &[ConnectionId]) -> Result<Self, LobbyError> {
        let [x, o, ..] = members else {
            return Err(LobbyError::InsufficientPlayers {
                required: PLAYERS,
                present: members.len(),
            });
        };
        Ok(Self {
            lobby_id,
            seats: [*x, *o],
            board: [None; BOARD_CELLS],
            current_turn: Mark::X,
            result: None,
            active: false,
        })
    }

    fn start(&mut self) -> Outbound {
        self.board = [None; BOARD_CELLS];
        self.current_turn = Mark::X;
        self.result = None;
        self.active = true;

        [Mark::X, Mark::O]
            .into_iter()
            .map(|mark| {
                tracing::debug!(
                    lobby_id = %self.lobby_id,
                    conn = %self.player(mark),
                    %mark,
                    "sending start snapshot"
                );
                (
                    Recipient::Connection(self.player(mark)),
                    ServerEvent::GameStarted(self.start_for(Some(mark))),
                )
            })
            .collect()
    }

    fn make_move(&mut self, sender: ConnectionId, index: i64) -> Outbound {
        let cell = match self.validate_move(sender, index) {
            Ok(cell) => cell,
            Err(reason) => {
                tracing::debug!(
                    lobby_id = %self.lobby_id,
                    %sender,
                    index,
                    %reason,
                    "move rejected"
                );
                return Vec::new();
            }
        };

        let mark = self.current_turn;
        self.board[cell] = Some(mark);

        if let Some(winner) = winning_mark(&self.board) {
            self.result = Some(winner.into());
            self.active = false;
        } else if board_full(&self.board) {
            self.result = Some(Outcome::Draw);
            self.active = false;
        } else {
            self.current_turn = mark.other();
        }

        vec![(
            Recipient::Lobby(self.lobby_id.clone()),
            ServerEvent::GameUpdate(self.board_update()),
        )]
    }

    fn snapshot(&self) -> ServerEvent {
        ServerEvent::GameStarted(self.start_for(None))
    }

    fn is_finished(&self) -> bool {
        self.result.is_some()
    }
}

/// The mark owning the first complete line, if any.
pub fn winning_mark(board: &Board) -> Option<Mark> {
    LINES.iter().find_map(|[a, b, c]| match board[*a] {
        Some(mark) if board[*b] == Some(mark) && board[*c] == Some(mark) => {
            Some(mark)
        }
        _ => None,
    })
}

fn board_full(board: &Board) -> bool {
    board.iter().all(Option::is_some)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    fn started() -> TicTacToe {
        let mut game =
            TicTacToe::new(LobbyId::from("L1"), &[conn(1), conn(2)]).unwrap();
        game.start();
        game
    }

    #[test]
    fn test_new_requires_two_members() {
        let err = TicTacToe::new(LobbyId::from("L1"), &[conn(1)]).unwrap_err();
        assert_eq!(
            err,
            LobbyError::InsufficientPlayers { required: 2, present: 1 }
        );
    }

    #[test]
    fn test_extra_members_hold_no_seat() {
        let game =
            TicTacToe::new(LobbyId::from("L1"), &[conn(1), conn(2), conn(3)])
                .unwrap();
        assert_eq!(game.mark_of(conn(1)), Some(Mark::X));
        assert_eq!(game.mark_of(conn(2)), Some(Mark::O));
        assert_eq!(game.mark_of(conn(3)), None);
    }

    #[test]
    fn test_start_addresses_each_player_with_own_mark() {
        let mut game =
            TicTacToe::new(LobbyId::from("L1"), &[conn(1), conn(2)]).unwrap();
        let out = game.start();
        assert_eq!(out.len(), 2);
        for (recipient, event) in out {
            let ServerEvent::GameStarted(start) = event else {
                panic!("expected GameStarted, got {event:?}");
            };
            let expected = match recipient {
                Recipient::Connection(c) if c == conn(1) => Mark::X,
                Recipient::Connection(c) if c == conn(2) => Mark::O,
                other => panic!("unexpected recipient {other:?}"),
            };
            assert_eq!(start.your_symbol, Some(expected));
            assert_eq!(start.current_turn, Mark::X);
            assert_eq!(start.board, [None; BOARD_CELLS]);
        }
    }

    #[test]
    fn test_moves_before_start_are_rejected() {
        let game =
            TicTacToe::new(LobbyId::from("L1"), &[conn(1), conn(2)]).unwrap();
        assert_eq!(game.validate_move(conn(1), 0), Err(MoveRejection::Inactive));
    }

    #[test]
    fn test_validate_rejects_out_of_bounds() {
        let game = started();
        assert_eq!(game.validate_move(conn(1), 9), Err(MoveRejection::OutOfRange));
        assert_eq!(game.validate_move(conn(1), -1), Err(MoveRejection::OutOfRange));
    }

    #[test]
    fn test_validate_rejects_occupied_cell() {
        let mut game = started();
        game.make_move(conn(1), 0);
        assert_eq!(game.validate_move(conn(2), 0), Err(MoveRejection::Occupied));
    }

    #[test]
    fn test_validate_rejects_wrong_turn_and_outsiders() {
        let game = started();
        assert_eq!(game.validate_move(conn(2), 0), Err(MoveRejection::NotYourTurn));
        assert_eq!(game.validate_move(conn(9), 0), Err(MoveRejection::NotAPlayer));
    }

    #[test]
    fn test_rejected_move_produces_no_events() {
        let mut game = started();
        assert!(game.make_move(conn(2), 4).is_empty());
        assert_eq!(game.board(), &[None; BOARD_CELLS]);
    }

    #[test]
    fn test_accepted_move_broadcasts_to_lobby_and_flips_turn() {
        let mut game = started();
        let out = game.make_move(conn(1), 4);
        assert_eq!(out.len(), 1);
        let (recipient, event) = &out[0];
        assert_eq!(recipient, &Recipient::Lobby(LobbyId::from("L1")));
        let ServerEvent::GameUpdate(update) = event else {
            panic!("expected GameUpdate, got {event:?}");
        };
        assert_eq!(update.board[4], Some(Mark::X));
        assert_eq!(update.current_turn, Mark::O);
        assert_eq!(update.winner, None);
    }

    #[test]
    fn test_win_detection_all_lines() {
        for line in LINES {
            for mark in [Mark::X, Mark::O] {
                let mut board: Board = [None; BOARD_CELLS];
                for cell in line {
                    board[cell] = Some(mark);
                }
                assert_eq!(winning_mark(&board), Some(mark), "line {line:?}");
            }
        }
    }

    /// Up to `count` cells off `line` that hold no complete line together.
    fn fillers(line: [usize; 3], count: usize) -> Vec<usize> {
        let mut picked = Vec::new();
        for cell in (0..BOARD_CELLS).filter(|c| !line.contains(c)) {
            if picked.len() == count {
                break;
            }
            let mut board: Board = [None; BOARD_CELLS];
            for p in picked.iter().copied().chain([cell]) {
                board[p] = Some(Mark::X);
            }
            if winning_mark(&board).is_none() {
                picked.push(cell);
            }
        }
        picked
    }

    #[test]
    fn test_every_line_wins_on_completing_move() {
        for line in LINES {
            for winner in [Mark::X, Mark::O] {
                let mut game = started();
                // X always opens, so O needs one extra filler move from X.
                let (xs, os) = match winner {
                    Mark::X => (line.to_vec(), fillers(line, 2)),
                    Mark::O => (fillers(line, 3), line.to_vec()),
                };
                let mut moves = Vec::new();
                for i in 0..xs.len() {
                    moves.push((game.player(Mark::X), xs[i]));
                    if let Some(cell) = os.get(i) {
                        moves.push((game.player(Mark::O), *cell));
                    }
                }

                let (last, opening) = moves.split_last().unwrap();
                for (who, cell) in opening {
                    assert_eq!(game.make_move(*who, *cell as i64).len(), 1);
                    assert_eq!(game.result(), None, "line {line:?}, {winner}");
                }
                assert_eq!(last.0, game.player(winner));
                assert_eq!(game.make_move(last.0, last.1 as i64).len(), 1);

                assert_eq!(game.result(), Some(winner.into()), "line {line:?}");
                assert!(!game.is_active());
                assert_eq!(game.current_turn(), winner);
            }
        }
    }

    #[test]
    fn test_winning_move_ends_game_and_keeps_turn() {
        //  X | X | X
        //  O | O | .
        //  . | . | .
        let mut game = started();
        for (who, cell) in [(1, 0), (2, 3), (1, 1), (2, 4)] {
            game.make_move(conn(who), cell);
        }
        let out = game.make_move(conn(1), 2);
        let ServerEvent::GameUpdate(update) = &out[0].1 else {
            panic!("expected GameUpdate");
        };
        assert_eq!(update.winner, Some(Outcome::X));
        assert_eq!(update.current_turn, Mark::X);
        assert!(game.is_finished());
        assert!(!game.is_active());

        // Terminal is absorbing.
        assert!(game.make_move(conn(2), 8).is_empty());
        assert_eq!(game.validate_move(conn(2), 8), Err(MoveRejection::Inactive));
    }

    #[test]
    fn test_draw_is_reported_as_draw() {
        //  X | O | X
        //  X | O | X
        //  O | X | O
        let mut game = started();
        let moves = [(1, 0), (2, 1), (1, 2), (2, 4), (1, 3), (2, 6), (1, 5), (2, 8)];
        for (who, cell) in moves {
            assert_eq!(game.make_move(conn(who), cell).len(), 1);
            assert_eq!(game.result(), None);
        }
        game.make_move(conn(1), 7);
        assert_eq!(game.result(), Some(Outcome::Draw));
        assert!(!game.is_active());
    }

    #[test]
    fn test_snapshot_has_no_symbol_and_reports_result() {
        let mut game = started();
        game.make_move(conn(1), 4);
        let ServerEvent::GameStarted(snapshot) = game.snapshot() else {
            panic!("expected GameStarted");
        };
        assert_eq!(snapshot.your_symbol, None);
        assert_eq!(snapshot.board[4], Some(Mark::X));
        assert_eq!(snapshot.current_turn, Mark::O);
        assert_eq!(snapshot.winner, None);
    }
}
