use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const PROTOCOL_VERSION: u32 = 1;
pub const BOARD_CELLS: usize = 9;

/// Index groups that complete a line: rows, then columns, then diagonals.
pub const WINNING_TRIPLES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

pub type Board = [Option<Symbol>; BOARD_CELLS];

/// Animal token identifying a player and their marks on the board
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    Bear,
    Koala,
    Fox,
    Monkey,
    Rabbit,
    Cow,
}

impl Symbol {
    pub const ALL: [Symbol; 6] = [
        Symbol::Bear,
        Symbol::Koala,
        Symbol::Fox,
        Symbol::Monkey,
        Symbol::Rabbit,
        Symbol::Cow,
    ];

    pub fn emoji(&self) -> &'static str {
        match self {
            Symbol::Bear => "🐻",
            Symbol::Koala => "🐨",
            Symbol::Fox => "🦊",
            Symbol::Monkey => "🐵",
            Symbol::Rabbit => "🐰",
            Symbol::Cow => "🐮",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Symbol::Bear => "Bear",
            Symbol::Koala => "Koala",
            Symbol::Fox => "Fox",
            Symbol::Monkey => "Monkey",
            Symbol::Rabbit => "Rabbit",
            Symbol::Cow => "Cow",
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.emoji())
    }
}

/// Accepts either the animal name (case-insensitive) or its emoji
impl FromStr for Symbol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Symbol::ALL
            .iter()
            .copied()
            .find(|symbol| {
                symbol.emoji() == trimmed || symbol.name().eq_ignore_ascii_case(trimmed)
            })
            .ok_or_else(|| format!("unknown symbol '{}'", trimmed))
    }
}

/// Terminal result of a game
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Winner(Symbol),
    Draw,
}

/// A seated player: the connection that holds a symbol
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Seat {
    pub client_id: u32,
    pub symbol: Symbol,
}

/// Canonical copy of the session broadcast after each transition
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct SessionSnapshot {
    pub board: Board,
    /// Seats in assignment order; the first seat moves first
    pub players: Vec<Seat>,
    pub current_player: Option<Symbol>,
    pub winner: Option<Outcome>,
}

impl SessionSnapshot {
    /// An empty player list is how clients recognise a reset
    pub fn is_reset(&self) -> bool {
        self.players.is_empty()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum Packet {
    // Client -> server
    Connect {
        client_version: u32,
    },
    Heartbeat,
    ChooseSymbol {
        symbol: Symbol,
    },
    MakeMove {
        cell: u32,
    },
    Reset,
    Disconnect,

    // Server -> client
    Connected {
        client_id: u32,
    },
    StateUpdate(SessionSnapshot),
    SymbolAssigned {
        symbol: Symbol,
    },
    RemainingSymbols {
        symbols: Vec<Symbol>,
    },
    GameOver {
        winner: Outcome,
        loser: Option<Symbol>,
        message: String,
    },
    RoomFull,
    Rejected {
        reason: String,
    },
    Disconnected {
        reason: String,
    },
}

/// Returns the first completed triple's symbol, a draw for a full board, or None
/// while the game can continue.
pub fn evaluate_board(board: &Board) -> Option<Outcome> {
    for [a, b, c] in WINNING_TRIPLES {
        if let Some(symbol) = board[a] {
            if board[b] == Some(symbol) && board[c] == Some(symbol) {
                return Some(Outcome::Winner(symbol));
            }
        }
    }

    if board.iter().all(Option::is_some) {
        Some(Outcome::Draw)
    } else {
        None
    }
}

/// Symbols from the fixed pool that nobody holds yet, in pool order
pub fn available_symbols(used: &[Symbol]) -> Vec<Symbol> {
    Symbol::ALL
        .iter()
        .copied()
        .filter(|symbol| !used.contains(symbol))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_from(marks: &[(usize, Symbol)]) -> Board {
        let mut board: Board = [None; BOARD_CELLS];
        for &(index, symbol) in marks {
            board[index] = Some(symbol);
        }
        board
    }

    #[test]
    fn test_symbol_pool_is_six_distinct() {
        for (i, a) in Symbol::ALL.iter().enumerate() {
            for b in &Symbol::ALL[i + 1..] {
                assert_ne!(a, b);
                assert_ne!(a.emoji(), b.emoji());
            }
        }
    }

    #[test]
    fn test_symbol_parsing() {
        assert_eq!("bear".parse::<Symbol>(), Ok(Symbol::Bear));
        assert_eq!("Monkey".parse::<Symbol>(), Ok(Symbol::Monkey));
        assert_eq!("🦊".parse::<Symbol>(), Ok(Symbol::Fox));
        assert!("dragon".parse::<Symbol>().is_err());
    }

    #[test]
    fn test_symbol_display_is_emoji() {
        assert_eq!(Symbol::Cow.to_string(), "🐮");
    }

    #[test]
    fn test_empty_board_has_no_outcome() {
        assert_eq!(evaluate_board(&[None; BOARD_CELLS]), None);
    }

    #[test]
    fn test_every_triple_wins() {
        for triple in WINNING_TRIPLES {
            let marks: Vec<_> = triple.iter().map(|&i| (i, Symbol::Rabbit)).collect();
            assert_eq!(
                evaluate_board(&board_from(&marks)),
                Some(Outcome::Winner(Symbol::Rabbit)),
                "triple {:?} should win",
                triple
            );
        }
    }

    #[test]
    fn test_mixed_triple_does_not_win() {
        let board = board_from(&[(0, Symbol::Bear), (1, Symbol::Bear), (2, Symbol::Fox)]);
        assert_eq!(evaluate_board(&board), None);
    }

    #[test]
    fn test_full_board_without_line_is_draw() {
        // B F B
        // B F F
        // F B B
        let (b, f) = (Symbol::Bear, Symbol::Fox);
        let board = board_from(&[
            (0, b),
            (1, f),
            (2, b),
            (3, b),
            (4, f),
            (5, f),
            (6, f),
            (7, b),
            (8, b),
        ]);
        assert_eq!(evaluate_board(&board), Some(Outcome::Draw));
    }

    #[test]
    fn test_win_on_full_board_beats_draw() {
        let (b, f) = (Symbol::Bear, Symbol::Fox);
        let board = board_from(&[
            (0, b),
            (1, b),
            (2, b),
            (3, f),
            (4, f),
            (5, b),
            (6, f),
            (7, b),
            (8, f),
        ]);
        assert_eq!(evaluate_board(&board), Some(Outcome::Winner(b)));
    }

    #[test]
    fn test_available_symbols() {
        assert_eq!(available_symbols(&[]), Symbol::ALL.to_vec());

        let remaining = available_symbols(&[Symbol::Bear, Symbol::Monkey]);
        assert_eq!(
            remaining,
            vec![Symbol::Koala, Symbol::Fox, Symbol::Rabbit, Symbol::Cow]
        );
    }

    #[test]
    fn test_snapshot_reset_signal() {
        let mut snapshot = SessionSnapshot::default();
        assert!(snapshot.is_reset());

        snapshot.players.push(Seat {
            client_id: 1,
            symbol: Symbol::Koala,
        });
        assert!(!snapshot.is_reset());
    }

    #[test]
    fn test_packet_serialization_state_update() {
        let snapshot = SessionSnapshot {
            board: board_from(&[(4, Symbol::Cow)]),
            players: vec![
                Seat {
                    client_id: 1,
                    symbol: Symbol::Cow,
                },
                Seat {
                    client_id: 2,
                    symbol: Symbol::Fox,
                },
            ],
            current_player: Some(Symbol::Fox),
            winner: None,
        };

        let serialized = bincode::serialize(&Packet::StateUpdate(snapshot.clone())).unwrap();
        let deserialized: Packet = bincode::deserialize(&serialized).unwrap();

        match deserialized {
            Packet::StateUpdate(received) => assert_eq!(received, snapshot),
            _ => panic!("Wrong packet type after deserialization"),
        }
    }

    #[test]
    fn test_packet_serialization_game_over() {
        let packet = Packet::GameOver {
            winner: Outcome::Winner(Symbol::Bear),
            loser: Some(Symbol::Monkey),
            message: "Congratulations! You won! 🐻🎉".to_string(),
        };

        let serialized = bincode::serialize(&packet).unwrap();
        let deserialized: Packet = bincode::deserialize(&serialized).unwrap();

        match deserialized {
            Packet::GameOver {
                winner,
                loser,
                message,
            } => {
                assert_eq!(winner, Outcome::Winner(Symbol::Bear));
                assert_eq!(loser, Some(Symbol::Monkey));
                assert!(message.contains("🐻"));
            }
            _ => panic!("Wrong packet type after deserialization"),
        }
    }
}
