//! # Game Server Library
//!
//! Authoritative server for two-player animal tic-tac-toe. It owns the one shared
//! game session, validates every request a client makes against it, and pushes
//! the resulting state back out to every connected client.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Session
//! The server holds the only real copy of the board, the seated players, whose
//! turn it is and how the game ended. Clients render what they are sent and may
//! pre-check their own clicks, but nothing they do changes the game unless the
//! session accepts it.
//!
//! ### Connection Management
//! - Handshake and client id assignment
//! - Admission: a third player is turned away with `RoomFull`
//! - Heartbeat-based liveness and timeout cleanup
//! - Any departure resets the game for everyone still connected
//!
//! ### State Broadcasting
//! Every accepted transition produces the packets to send: a full snapshot to
//! all connections, a symbol confirmation to the chooser, or an individual
//! game-over message per player.
//!
//! ## Architecture Design
//!
//! ### Single-Writer Event Loop
//! Receiving, sending and timeout checks run as separate tokio tasks, but all of
//! them feed one channel consumed by [`network::Server::run`]. That loop is the
//! only code that touches the [`game::Session`], so transitions happen strictly
//! one at a time in arrival order.
//!
//! ### Pure Transitions
//! [`game::Session`] never does I/O. Its handlers return either a list of
//! [`game::Dispatch`] values or a [`game::Rejection`]; the network layer turns
//! the former into datagrams and hands the latter to the configured
//! [`config::RejectionPolicy`].
//!
//! ### UDP-Based Communication
//! One bincode-encoded [`shared::Packet`] per datagram. Sends are fire-and-forget:
//! a failed send is logged and never undoes a transition.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::game::Session;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::default();
//!     let mut server = Server::new(&config, Session::new()).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod config;
pub mod game;
pub mod network;
