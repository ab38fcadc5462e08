//! Client-side view of the session
//!
//! Mirrors what the server last told us and turns clicks into requests. The
//! checks here only decide whether a request is worth sending; the server
//! applies the real rules on its own.

use log::{debug, info};
use shared::{Board, Outcome, Packet, SessionSnapshot, Symbol, BOARD_CELLS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Error,
}

/// Something the player asked for that should go to the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    ChooseSymbol(Symbol),
    MakeMove(u32),
    Reset,
}

impl Intent {
    pub fn into_packet(self) -> Packet {
        match self {
            Intent::ChooseSymbol(symbol) => Packet::ChooseSymbol { symbol },
            Intent::MakeMove(cell) => Packet::MakeMove { cell },
            Intent::Reset => Packet::Reset,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientGameState {
    pub client_id: Option<u32>,
    pub my_symbol: Option<Symbol>,
    pub board: Board,
    pub current_player: Option<Symbol>,
    pub winner: Option<Outcome>,
    /// Symbols offered in the chooser panel
    pub choices: Vec<Symbol>,
    /// Seats taken in the last state the server sent
    pub seated: usize,
    pub board_visible: bool,
    pub room_full: bool,
    /// Set once the server has turned the handshake down for good
    pub refused: bool,
    pub status: String,
    pub status_kind: StatusKind,
}

impl ClientGameState {
    pub fn new() -> Self {
        Self {
            client_id: None,
            my_symbol: None,
            board: [None; BOARD_CELLS],
            current_player: None,
            winner: None,
            choices: Symbol::ALL.to_vec(),
            seated: 0,
            board_visible: false,
            room_full: false,
            refused: false,
            status: "Connecting...".to_string(),
            status_kind: StatusKind::Info,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.client_id.is_some() && !self.room_full
    }

    /// True until the server has answered the handshake one way or another
    pub fn awaiting_handshake(&self) -> bool {
        self.client_id.is_none() && !self.room_full && !self.refused
    }

    pub fn chooser_visible(&self) -> bool {
        self.is_connected() && !self.board_visible && self.seated < 2
    }

    pub fn is_my_turn(&self) -> bool {
        self.my_symbol.is_some() && self.current_player == self.my_symbol && self.winner.is_none()
    }

    fn show(&mut self, message: impl Into<String>, kind: StatusKind) {
        self.status = message.into();
        self.status_kind = kind;
    }

    pub fn apply_packet(&mut self, packet: Packet) {
        match packet {
            Packet::Connected { client_id } => {
                info!("Connected! Client ID: {}", client_id);
                self.client_id = Some(client_id);
                self.show("Choose your animal", StatusKind::Info);
            }
            Packet::StateUpdate(snapshot) => self.apply_snapshot(snapshot),
            Packet::SymbolAssigned { symbol } => {
                self.my_symbol = Some(symbol);
                self.board_visible = true;
                self.show(format!("You are {}", symbol.name()), StatusKind::Info);
            }
            Packet::RemainingSymbols { symbols } => {
                if self.my_symbol.is_none() {
                    self.choices = symbols;
                    self.show("Choose your animal:", StatusKind::Info);
                }
            }
            Packet::GameOver {
                winner, message, ..
            } => {
                self.winner = Some(winner);
                self.show(message, StatusKind::Info);
            }
            Packet::RoomFull => {
                self.room_full = true;
                self.show("Game is full. Try again later.", StatusKind::Error);
            }
            Packet::Rejected { reason } => {
                self.show(reason, StatusKind::Error);
            }
            Packet::Disconnected { reason } => {
                self.client_id = None;
                self.refused = true;
                self.show(format!("Disconnected: {}", reason), StatusKind::Error);
            }
            other => debug!("Ignoring unexpected packet {:?}", other),
        }
    }

    fn apply_snapshot(&mut self, snapshot: SessionSnapshot) {
        if snapshot.is_reset() {
            self.my_symbol = None;
            self.board = [None; BOARD_CELLS];
            self.current_player = None;
            self.winner = None;
            self.choices = Symbol::ALL.to_vec();
            self.seated = 0;
            self.board_visible = false;
            self.show("Game has been reset. Choose your animal.", StatusKind::Info);
            return;
        }

        self.board = snapshot.board;
        self.current_player = snapshot.current_player;
        self.winner = snapshot.winner;
        self.seated = snapshot.players.len();

        if self.winner.is_none() && self.current_player.is_some() {
            if self.my_symbol.is_none() {
                self.show("Game in progress. Wait for a reset.", StatusKind::Info);
            } else if self.is_my_turn() {
                self.show("Your turn!", StatusKind::Info);
            } else {
                self.show("Opponent's turn!", StatusKind::Info);
            }
        }
    }

    /// Advisory check before sending a move
    pub fn try_move(&mut self, cell: u32) -> Option<Intent> {
        let taken = self
            .board
            .get(cell as usize)
            .map_or(true, |slot| slot.is_some());

        if self.winner.is_some() {
            self.show("Game over! Press reset to play again.", StatusKind::Error);
            None
        } else if taken {
            self.show("Cell already taken!", StatusKind::Error);
            None
        } else if !self.is_my_turn() {
            self.show("Not your turn!", StatusKind::Error);
            None
        } else {
            Some(Intent::MakeMove(cell))
        }
    }

    pub fn try_choose(&self, symbol: Symbol) -> Option<Intent> {
        (self.chooser_visible() && self.my_symbol.is_none() && self.choices.contains(&symbol))
            .then_some(Intent::ChooseSymbol(symbol))
    }

    pub fn request_reset(&mut self) -> Intent {
        self.show("Resetting the game...", StatusKind::Info);
        Intent::Reset
    }
}

impl Default for ClientGameState {
    fn default() -> Self {
        Self::new()
    }
}
