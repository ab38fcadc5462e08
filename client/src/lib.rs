//! # Game Client Library
//!
//! Desktop client for animal tic-tac-toe. It shows whatever the server last
//! sent and forwards the player's clicks; it holds no authority of its own.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! The view model: board, own symbol, whose turn it is, the symbol chooser and
//! the status line. Each server packet maps to exactly one update here. Clicks
//! go through advisory checks ("Cell already taken!", "Not your turn!") before
//! anything is sent, but the server re-checks everything.
//!
//! ### Input Module (`input`)
//! Mouse hit-testing against the screen layout, plus keys 1-9 for cells and R
//! for reset.
//!
//! ### Network Module (`network`)
//! A non-blocking UDP socket polled once per frame, heartbeats to keep the
//! connection alive, and the frame loop that ties the other modules together.
//!
//! ### Rendering Module (`rendering`)
//! Draws the status line, the chooser panel, the 3x3 board and the reset
//! button with macroquad. Symbols are drawn by name and colour since the
//! built-in font has no emoji.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::Client;
//!
//! #[macroquad::main("Animal Tic-Tac-Toe")]
//! async fn main() {
//!     let mut client = Client::new("127.0.0.1:8080", 800, 600).unwrap();
//!     client.run().await.unwrap();
//! }
//! ```

pub mod game;
pub mod input;
pub mod network;
pub mod rendering;
