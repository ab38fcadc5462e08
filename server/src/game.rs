//! Authoritative session state and its transition handlers
//!
//! The session is the one shared game: board, seated players, turn and outcome.
//! Transition handlers validate before mutating and return the packets the
//! transition produces as [`Dispatch`] values instead of sending them, so the
//! state machine can be driven and inspected without a live socket. Validation
//! failures come back as [`Rejection`] and leave the session untouched.

use log::{debug, info};
use shared::{
    available_symbols, evaluate_board, Board, Outcome, Packet, Seat, SessionSnapshot, Symbol,
    BOARD_CELLS,
};
use thiserror::Error;

const MAX_PLAYERS: usize = 2;

/// Lifecycle stage, derived from the session fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Empty,
    AwaitingSecondSymbol,
    InProgress,
    Finished,
}

/// Why a requested transition was refused
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("session already has two players")]
    SessionFull,
    #[error("client {0} already holds a symbol")]
    AlreadySeated(u32),
    #[error("symbol {0:?} is not available")]
    SymbolUnavailable(Symbol),
    #[error("game is already over")]
    GameOver,
    #[error("cell {0} is outside the board")]
    CellOutOfRange(u32),
    #[error("cell {0} is already taken")]
    CellOccupied(usize),
    #[error("not your turn")]
    NotYourTurn,
}

/// An outgoing packet and who it is addressed to
#[derive(Debug, Clone)]
pub enum Dispatch {
    ToClient { client_id: u32, packet: Packet },
    Broadcast { packet: Packet, exclude: Option<u32> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    board: Board,
    players: Vec<Seat>,
    current_player: Option<Symbol>,
    winner: Option<Outcome>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            board: [None; BOARD_CELLS],
            players: Vec::with_capacity(MAX_PLAYERS),
            current_player: None,
            winner: None,
        }
    }

    pub fn phase(&self) -> Phase {
        match (self.players.len(), self.winner) {
            (0, _) => Phase::Empty,
            (1, _) => Phase::AwaitingSecondSymbol,
            (_, None) => Phase::InProgress,
            (_, Some(_)) => Phase::Finished,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn players(&self) -> &[Seat] {
        &self.players
    }

    pub fn current_player(&self) -> Option<Symbol> {
        self.current_player
    }

    pub fn winner(&self) -> Option<Outcome> {
        self.winner
    }

    pub fn symbol_of(&self, client_id: u32) -> Option<Symbol> {
        self.players
            .iter()
            .find(|seat| seat.client_id == client_id)
            .map(|seat| seat.symbol)
    }

    pub fn available_symbols(&self) -> Vec<Symbol> {
        let used: Vec<Symbol> = self.players.iter().map(|seat| seat.symbol).collect();
        available_symbols(&used)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            board: self.board,
            players: self.players.clone(),
            current_player: self.current_player,
            winner: self.winner,
        }
    }

    /// Decides whether a new connection may join. Does not change the session.
    pub fn admit(&self, client_id: u32) -> Result<(), Rejection> {
        if self.players.len() >= MAX_PLAYERS {
            debug!("Refusing client {}: session full", client_id);
            return Err(Rejection::SessionFull);
        }
        Ok(())
    }

    /// Packets for a freshly admitted connection so its chooser matches the pool
    pub fn welcome(&self, client_id: u32) -> Vec<Dispatch> {
        match self.phase() {
            Phase::AwaitingSecondSymbol => vec![Dispatch::ToClient {
                client_id,
                packet: Packet::RemainingSymbols {
                    symbols: self.available_symbols(),
                },
            }],
            _ => Vec::new(),
        }
    }

    pub fn choose_symbol(
        &mut self,
        client_id: u32,
        symbol: Symbol,
    ) -> Result<Vec<Dispatch>, Rejection> {
        if self.symbol_of(client_id).is_some() {
            return Err(Rejection::AlreadySeated(client_id));
        }

        match self.players.len() {
            0 => {
                // The first pick is not checked against the pool.
                self.players.push(Seat { client_id, symbol });
                info!("Client {} picked {} first", client_id, symbol.name());

                let remaining = available_symbols(&[symbol]);
                Ok(vec![
                    Dispatch::ToClient {
                        client_id,
                        packet: Packet::SymbolAssigned { symbol },
                    },
                    Dispatch::Broadcast {
                        packet: Packet::RemainingSymbols { symbols: remaining },
                        exclude: Some(client_id),
                    },
                ])
            }
            1 => {
                if !self.available_symbols().contains(&symbol) {
                    return Err(Rejection::SymbolUnavailable(symbol));
                }

                self.players.push(Seat { client_id, symbol });
                let first = self.players[0].symbol;
                self.current_player = Some(first);
                info!(
                    "Client {} picked {}, game starts with {} to move",
                    client_id,
                    symbol.name(),
                    first.name()
                );

                Ok(vec![
                    Dispatch::ToClient {
                        client_id,
                        packet: Packet::SymbolAssigned { symbol },
                    },
                    self.broadcast_state(),
                ])
            }
            _ => Err(Rejection::SessionFull),
        }
    }

    pub fn make_move(&mut self, client_id: u32, cell: u32) -> Result<Vec<Dispatch>, Rejection> {
        if self.winner.is_some() {
            return Err(Rejection::GameOver);
        }

        let index = cell as usize;
        if index >= BOARD_CELLS {
            return Err(Rejection::CellOutOfRange(cell));
        }
        if self.board[index].is_some() {
            return Err(Rejection::CellOccupied(index));
        }

        let symbol = match (self.symbol_of(client_id), self.current_player) {
            (Some(mine), Some(current)) if mine == current => mine,
            _ => return Err(Rejection::NotYourTurn),
        };

        self.board[index] = Some(symbol);
        debug!("Client {} placed {} at cell {}", client_id, symbol.name(), index);

        // Movers see their own mark before any outcome arrives.
        let mut dispatches = vec![self.broadcast_state()];

        match evaluate_board(&self.board) {
            Some(outcome) => {
                self.winner = Some(outcome);
                info!("Game finished: {:?}", outcome);
                dispatches.extend(self.outcome_notices(outcome));
            }
            None => {
                self.current_player = self.opponent_of(symbol);
                dispatches.push(self.broadcast_state());
            }
        }

        Ok(dispatches)
    }

    /// Replaces the session with an empty one and tells everybody
    pub fn reset(&mut self) -> Vec<Dispatch> {
        *self = Session::new();
        info!("Session reset");
        vec![self.broadcast_state()]
    }

    /// Losing any connection ends the game for everyone
    pub fn disconnect(&mut self, client_id: u32) -> Vec<Dispatch> {
        info!("Client {} left, resetting session", client_id);
        self.reset()
    }

    fn opponent_of(&self, symbol: Symbol) -> Option<Symbol> {
        self.players
            .iter()
            .map(|seat| seat.symbol)
            .find(|&other| other != symbol)
    }

    fn broadcast_state(&self) -> Dispatch {
        Dispatch::Broadcast {
            packet: Packet::StateUpdate(self.snapshot()),
            exclude: None,
        }
    }

    fn outcome_notices(&self, outcome: Outcome) -> Vec<Dispatch> {
        let loser = match outcome {
            Outcome::Winner(winner) => self.opponent_of(winner),
            Outcome::Draw => None,
        };

        self.players
            .iter()
            .map(|seat| Dispatch::ToClient {
                client_id: seat.client_id,
                packet: Packet::GameOver {
                    winner: outcome,
                    loser,
                    message: outcome_message(outcome, loser, seat.symbol),
                },
            })
            .collect()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Text shown to the holder of `recipient` once the game ends
pub fn outcome_message(outcome: Outcome, loser: Option<Symbol>, recipient: Symbol) -> String {
    match outcome {
        Outcome::Winner(winner) if winner == recipient => {
            format!("Congratulations! You won! {}🎉", winner)
        }
        Outcome::Winner(_) => {
            let loser = loser.map(|symbol| symbol.to_string()).unwrap_or_default();
            format!("You lost! Womp Womp!{} 😔", loser)
        }
        Outcome::Draw => "It's a draw! Nobody wins this round 🤝".to_string(),
    }
}
