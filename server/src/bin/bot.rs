//! Headless opponent: joins as the second player and plays random legal moves

use bincode::{deserialize, serialize};
use clap::Parser;
use log::{debug, info, warn};
use rand::seq::SliceRandom;
use shared::{Packet, SessionSnapshot, Symbol, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::{interval, sleep};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Pause before each move, in milliseconds
    #[arg(short = 'd', long, default_value = "600")]
    think_ms: u64,
}

struct Bot {
    socket: UdpSocket,
    server_addr: SocketAddr,
    think: Duration,
    symbol: Option<Symbol>,
    /// Filled-cell count the board reaches once the last move lands
    moved_at: Option<usize>,
}

impl Bot {
    async fn send(&self, packet: &Packet) -> Result<(), Box<dyn std::error::Error>> {
        let data = serialize(packet)?;
        self.socket.send_to(&data, self.server_addr).await?;
        Ok(())
    }

    /// Returns false once the bot should stop
    async fn handle_packet(&mut self, packet: Packet) -> Result<bool, Box<dyn std::error::Error>> {
        match packet {
            Packet::Connected { client_id } => {
                info!("Joined as client {}, waiting for an opponent to pick", client_id);
            }
            Packet::RoomFull => {
                warn!("Game is full");
                return Ok(false);
            }
            Packet::Disconnected { reason } => {
                warn!("Disconnected: {}", reason);
                return Ok(false);
            }
            Packet::RemainingSymbols { symbols } => {
                if self.symbol.is_none() {
                    if let Some(&symbol) = symbols.choose(&mut rand::thread_rng()) {
                        info!("Picking {}", symbol.name());
                        self.send(&Packet::ChooseSymbol { symbol }).await?;
                    }
                }
            }
            Packet::SymbolAssigned { symbol } => {
                info!("Playing as {}", symbol.name());
                self.symbol = Some(symbol);
            }
            Packet::StateUpdate(snapshot) => self.on_state(snapshot).await?,
            Packet::GameOver { message, .. } => info!("{}", message),
            Packet::Rejected { reason } => debug!("Server ignored a request: {}", reason),
            other => debug!("Ignoring {:?}", other),
        }
        Ok(true)
    }

    async fn on_state(&mut self, snapshot: SessionSnapshot) -> Result<(), Box<dyn std::error::Error>> {
        if snapshot.is_reset() {
            info!("Game reset");
            self.symbol = None;
            self.moved_at = None;
            return Ok(());
        }

        let filled = snapshot.board.iter().filter(|cell| cell.is_some()).count();
        let my_turn = self.symbol.is_some() && snapshot.current_player == self.symbol;
        if !my_turn || snapshot.winner.is_some() || self.moved_at == Some(filled) {
            return Ok(());
        }

        let free: Vec<u32> = (0..snapshot.board.len() as u32)
            .filter(|&i| snapshot.board[i as usize].is_none())
            .collect();
        if let Some(&cell) = free.choose(&mut rand::thread_rng()) {
            sleep(self.think).await;
            info!("Moving to cell {}", cell);
            self.moved_at = Some(filled + 1);
            self.send(&Packet::MakeMove { cell }).await?;
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();

    let mut bot = Bot {
        socket: UdpSocket::bind("0.0.0.0:0").await?,
        server_addr: args.server.parse()?,
        think: Duration::from_millis(args.think_ms),
        symbol: None,
        moved_at: None,
    };
    info!("Bot socket bound to {}", bot.socket.local_addr()?);

    bot.send(&Packet::Connect {
        client_version: PROTOCOL_VERSION,
    })
    .await?;

    let mut heartbeat = interval(Duration::from_secs(1));
    let mut buffer = [0u8; 2048];

    loop {
        tokio::select! {
            result = bot.socket.recv_from(&mut buffer) => {
                let (len, _) = result?;
                match deserialize::<Packet>(&buffer[..len]) {
                    Ok(packet) => {
                        if !bot.handle_packet(packet).await? {
                            break;
                        }
                    }
                    Err(e) => warn!("Failed to deserialize packet: {}", e),
                }
            }
            _ = heartbeat.tick() => bot.send(&Packet::Heartbeat).await?,
            _ = tokio::signal::ctrl_c() => {
                bot.send(&Packet::Disconnect).await?;
                break;
            }
        }
    }

    info!("Bot finished");
    Ok(())
}
